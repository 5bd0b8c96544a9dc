//! Cart domain types.

use serde::Serialize;

use cartwright_core::{CartLineId, ProductId, UserId};

/// Sentinel used when no size was selected.
pub const DEFAULT_SIZE: &str = "one size";

/// Sentinel used when no color was selected.
pub const DEFAULT_COLOR: &str = "no color";

/// The (size, color) pair distinguishing otherwise-identical selections.
///
/// Absent or blank input normalizes to the fixed sentinels before the
/// uniqueness key is computed, so "no selection" and the sentinel are
/// indistinguishable downstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variant {
    pub size: String,
    pub color: String,
}

impl Variant {
    /// Normalize raw selection input: trim, substitute sentinels for
    /// blank or absent values.
    #[must_use]
    pub fn normalize(size: Option<&str>, color: Option<&str>) -> Self {
        Self {
            size: normalize_field(size, DEFAULT_SIZE),
            color: normalize_field(color, DEFAULT_COLOR),
        }
    }
}

fn normalize_field(value: Option<&str>, sentinel: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_owned(),
        _ => sentinel.to_owned(),
    }
}

/// One merchandise line item, owned by exactly one user.
///
/// At most one line exists per `(owner_id, product_id, size, color)` tuple,
/// and `quantity` is always >= 1: a would-be zero line is deleted instead.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    /// Unique line ID.
    pub id: CartLineId,
    /// The user owning this line.
    pub owner_id: UserId,
    /// The product this line refers to.
    pub product_id: ProductId,
    /// Selected size (sentinel when none was chosen).
    pub selected_size: String,
    /// Selected color (sentinel when none was chosen).
    pub selected_color: String,
    /// Number of units, always >= 1.
    pub quantity: i32,
    /// Price snapshot taken when the line was created; never refreshed
    /// from the catalog.
    pub unit_price: i64,
}

/// Fields for the atomic insert-or-increment upsert.
///
/// `unit_price` only takes effect when the upsert inserts; on the
/// increment path the existing snapshot is kept.
#[derive(Debug, Clone)]
pub struct NewCartLine {
    pub owner_id: UserId,
    pub product_id: ProductId,
    pub variant: Variant,
    pub unit_price: i64,
}
