//! Product domain type.

use serde::Serialize;

use cartwright_core::ProductId;

/// A catalog product (external entity, referenced by the cart).
///
/// The cart only reads `price` (snapshotted onto new lines) and `in_stock`
/// (gating additions); the catalog itself is managed elsewhere.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Current price in minor currency units.
    pub price: i64,
    /// Whether the product can currently be added to a cart.
    pub in_stock: bool,
}
