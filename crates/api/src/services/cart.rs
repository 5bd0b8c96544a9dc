//! Cart consistency engine.
//!
//! Owns every cart mutation: create-or-merge on add, absolute quantity
//! updates, deletion, and clearing. Every operation is scoped to the
//! calling user, which arrives as an explicit parameter resolved by the
//! authentication gate - there is no ambient security context, so
//! concurrent requests cannot observe each other's caller.

use std::sync::Arc;

use cartwright_core::{CartLineId, ProductId};

use crate::db::{CartStore, ProductStore};
use crate::error::{AppError, Result};
use crate::models::{CartLine, NewCartLine, User, Variant};

/// Per-user cart operations over the product and cart stores.
pub struct CartService {
    products: Arc<dyn ProductStore>,
    cart: Arc<dyn CartStore>,
}

impl CartService {
    #[must_use]
    pub fn new(products: Arc<dyn ProductStore>, cart: Arc<dyn CartStore>) -> Self {
        Self { products, cart }
    }

    /// List the caller's cart lines, ordered by line id.
    ///
    /// Never exposes another owner's lines.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn list(&self, caller: &User) -> Result<Vec<CartLine>> {
        Ok(self.cart.find_by_owner(caller.id).await?)
    }

    /// Add one unit of a product variant to the caller's cart.
    ///
    /// A first add of a distinct `(product, size, color)` combination
    /// creates a line with quantity 1 and a `unit_price` snapshot of the
    /// product's current price; adds of the same combination increment
    /// the existing line in place. The insert-or-increment is a single
    /// atomic store operation, so concurrent adds of the same tuple
    /// cannot produce duplicate lines.
    ///
    /// Stock is gated at add time only; quantity increases on an existing
    /// line do not re-check it.
    ///
    /// # Errors
    ///
    /// `AppError::NotFound` if the product does not exist,
    /// `AppError::Invalid` if it is out of stock.
    pub async fn add_item(
        &self,
        caller: &User,
        product_id: ProductId,
        size: Option<&str>,
        color: Option<&str>,
    ) -> Result<CartLine> {
        let variant = Variant::normalize(size, color);

        tracing::info!(
            user = %caller.email,
            product = %product_id,
            size = %variant.size,
            color = %variant.color,
            "add to cart"
        );

        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {product_id} not found")))?;

        if !product.in_stock {
            return Err(AppError::Invalid(format!(
                "product {} is out of stock",
                product.name
            )));
        }

        let line = self
            .cart
            .upsert_line(NewCartLine {
                owner_id: caller.id,
                product_id,
                variant,
                unit_price: product.price,
            })
            .await?;

        Ok(line)
    }

    /// Remove one line from the caller's cart.
    ///
    /// # Errors
    ///
    /// `AppError::NotFound` if the line does not exist,
    /// `AppError::Forbidden` if the caller does not own it.
    pub async fn remove_item(&self, caller: &User, line_id: CartLineId) -> Result<()> {
        let line = self.resolve_owned(caller, line_id).await?;
        self.cart.delete(line.id).await?;
        Ok(())
    }

    /// Set an absolute quantity on one of the caller's lines.
    ///
    /// A non-positive quantity is the removal shorthand: the line is
    /// deleted and `Ok(None)` signals "removed" rather than an error.
    ///
    /// # Errors
    ///
    /// Same ownership and existence rules as [`Self::remove_item`].
    pub async fn update_quantity(
        &self,
        caller: &User,
        line_id: CartLineId,
        quantity: i32,
    ) -> Result<Option<CartLine>> {
        let line = self.resolve_owned(caller, line_id).await?;

        if quantity <= 0 {
            self.cart.delete(line.id).await?;
            return Ok(None);
        }

        let updated = self
            .cart
            .set_quantity(line.id, quantity)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("cart line {line_id} not found")))?;

        Ok(Some(updated))
    }

    /// Delete every line owned by the caller.
    ///
    /// A no-op (not an error) when the cart is already empty.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn clear(&self, caller: &User) -> Result<()> {
        let removed = self.cart.delete_by_owner(caller.id).await?;
        tracing::info!(user = %caller.email, removed, "cart cleared");
        Ok(())
    }

    /// Resolve a line and enforce that the caller owns it.
    async fn resolve_owned(&self, caller: &User, line_id: CartLineId) -> Result<CartLine> {
        let line = self
            .cart
            .find_by_id(line_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("cart line {line_id} not found")))?;

        if line.owner_id != caller.id {
            return Err(AppError::Forbidden(
                "no access to another user's cart".to_owned(),
            ));
        }

        Ok(line)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::memory::{MemoryCartStore, MemoryProductStore};
    use crate::models::Product;
    use cartwright_core::{Email, ProductId, Role, UserId};

    fn user(id: i64, email: &str) -> User {
        User {
            id: UserId::new(id),
            email: Email::parse(email).unwrap(),
            password_hash: String::new(),
            username: email.to_owned(),
            role: Role::User,
            push_enabled: true,
            phone: None,
        }
    }

    fn admin(id: i64, email: &str) -> User {
        User {
            role: Role::Admin,
            ..user(id, email)
        }
    }

    fn product(id: i64, price: i64, in_stock: bool) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("product-{id}"),
            price,
            in_stock,
        }
    }

    fn setup() -> (CartService, Arc<MemoryProductStore>) {
        let products = Arc::new(MemoryProductStore::default());
        let cart = Arc::new(MemoryCartStore::default());
        let service = CartService::new(products.clone(), cart);
        (service, products)
    }

    #[tokio::test]
    async fn test_first_add_creates_line_with_price_snapshot() {
        let (service, products) = setup();
        products.put(product(1, 100, true));
        let u = user(1, "u@example.com");

        let line = service
            .add_item(&u, ProductId::new(1), Some("M"), Some("Red"))
            .await
            .unwrap();

        assert_eq!(line.quantity, 1);
        assert_eq!(line.unit_price, 100);
        assert_eq!(line.selected_size, "M");
        assert_eq!(line.selected_color, "Red");
    }

    #[tokio::test]
    async fn test_second_add_merges_and_keeps_snapshot() {
        let (service, products) = setup();
        products.put(product(1, 100, true));
        let u = user(1, "u@example.com");

        service
            .add_item(&u, ProductId::new(1), Some("M"), Some("Red"))
            .await
            .unwrap();

        // Price changes between the two adds.
        products.put(product(1, 150, true));

        let line = service
            .add_item(&u, ProductId::new(1), Some("M"), Some("Red"))
            .await
            .unwrap();

        assert_eq!(line.quantity, 2);
        assert_eq!(line.unit_price, 100, "snapshot must not be refreshed");
        assert_eq!(service.list(&u).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_variants_get_distinct_lines() {
        let (service, products) = setup();
        products.put(product(1, 100, true));
        let u = user(1, "u@example.com");

        service
            .add_item(&u, ProductId::new(1), Some("M"), Some("Red"))
            .await
            .unwrap();
        service
            .add_item(&u, ProductId::new(1), Some("L"), Some("Red"))
            .await
            .unwrap();

        assert_eq!(service.list(&u).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_blank_variant_normalizes_to_sentinels() {
        let (service, products) = setup();
        products.put(product(1, 100, true));
        let u = user(1, "u@example.com");

        service
            .add_item(&u, ProductId::new(1), None, None)
            .await
            .unwrap();
        let line = service
            .add_item(&u, ProductId::new(1), Some("  "), Some(""))
            .await
            .unwrap();

        // Absent and blank collapse to the same tuple.
        assert_eq!(line.quantity, 2);
        assert_eq!(line.selected_size, crate::models::cart::DEFAULT_SIZE);
        assert_eq!(line.selected_color, crate::models::cart::DEFAULT_COLOR);
    }

    #[tokio::test]
    async fn test_out_of_stock_add_is_invalid_and_creates_nothing() {
        let (service, products) = setup();
        products.put(product(1, 100, false));
        let u = user(1, "u@example.com");

        let result = service.add_item(&u, ProductId::new(1), None, None).await;
        assert!(matches!(result, Err(AppError::Invalid(_))));
        assert!(service.list(&u).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let (service, _products) = setup();
        let u = user(1, "u@example.com");

        let result = service.add_item(&u, ProductId::new(99), None, None).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_quantity_is_an_absolute_set() {
        let (service, products) = setup();
        products.put(product(1, 100, true));
        let u = user(1, "u@example.com");

        let line = service
            .add_item(&u, ProductId::new(1), None, None)
            .await
            .unwrap();

        let updated = service
            .update_quantity(&u, line.id, 7)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.quantity, 7);
    }

    #[tokio::test]
    async fn test_update_quantity_zero_or_negative_deletes() {
        let (service, products) = setup();
        products.put(product(1, 100, true));
        let u = user(1, "u@example.com");

        for quantity in [0, -5] {
            let line = service
                .add_item(&u, ProductId::new(1), None, None)
                .await
                .unwrap();

            let result = service.update_quantity(&u, line.id, quantity).await.unwrap();
            assert!(result.is_none(), "quantity {quantity} must signal removal");
            assert!(service.list(&u).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_ownership_is_enforced_regardless_of_role() {
        let (service, products) = setup();
        products.put(product(1, 100, true));
        let owner = user(1, "owner@example.com");
        let other = user(2, "other@example.com");
        let other_admin = admin(3, "admin@example.com");

        let line = service
            .add_item(&owner, ProductId::new(1), None, None)
            .await
            .unwrap();

        for caller in [&other, &other_admin] {
            let removed = service.remove_item(caller, line.id).await;
            assert!(matches!(removed, Err(AppError::Forbidden(_))));

            let updated = service.update_quantity(caller, line.id, 3).await;
            assert!(matches!(updated, Err(AppError::Forbidden(_))));
        }

        // The owner still can.
        service.remove_item(&owner, line.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_unknown_line_is_not_found() {
        let (service, _products) = setup();
        let u = user(1, "u@example.com");

        let result = service.remove_item(&u, CartLineId::new(42)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_clear_removes_only_callers_lines() {
        let (service, products) = setup();
        products.put(product(1, 100, true));
        let a = user(1, "a@example.com");
        let b = user(2, "b@example.com");

        service.add_item(&a, ProductId::new(1), None, None).await.unwrap();
        service
            .add_item(&a, ProductId::new(1), Some("L"), None)
            .await
            .unwrap();
        service.add_item(&b, ProductId::new(1), None, None).await.unwrap();

        service.clear(&a).await.unwrap();
        assert!(service.list(&a).await.unwrap().is_empty());
        assert_eq!(service.list(&b).await.unwrap().len(), 1);

        // Clearing an already-empty cart is a no-op, not an error.
        service.clear(&a).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_owner() {
        let (service, products) = setup();
        products.put(product(1, 100, true));
        let a = user(1, "a@example.com");
        let b = user(2, "b@example.com");

        service.add_item(&a, ProductId::new(1), None, None).await.unwrap();

        assert_eq!(service.list(&a).await.unwrap().len(), 1);
        assert!(service.list(&b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_adds_of_one_tuple_merge_into_one_line() {
        let (service, products) = setup();
        products.put(product(1, 100, true));
        let service = Arc::new(service);
        let u = user(1, "u@example.com");

        const ADDS: usize = 32;
        let mut handles = Vec::with_capacity(ADDS);
        for _ in 0..ADDS {
            let service = Arc::clone(&service);
            let u = u.clone();
            handles.push(tokio::spawn(async move {
                service
                    .add_item(&u, ProductId::new(1), Some("M"), Some("Red"))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let lines = service.list(&u).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines.first().unwrap().quantity, i32::try_from(ADDS).unwrap());
    }
}
