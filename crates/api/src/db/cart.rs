//! `PostgreSQL`-backed cart store.
//!
//! The `cart_lines` table carries a unique index over
//! `(owner_id, product_id, selected_size, selected_color)`; the upsert
//! leans on it so two concurrent adds of the same tuple can never produce
//! two rows.

use async_trait::async_trait;
use sqlx::PgPool;

use cartwright_core::{CartLineId, ProductId, UserId};

use super::{CartStore, RepositoryError};
use crate::models::{CartLine, NewCartLine, Variant};

/// Cart store backed by the `cart_lines` table.
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    id: i64,
    owner_id: i64,
    product_id: i64,
    selected_size: String,
    selected_color: String,
    quantity: i32,
    unit_price: i64,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            id: CartLineId::new(row.id),
            owner_id: UserId::new(row.owner_id),
            product_id: ProductId::new(row.product_id),
            selected_size: row.selected_size,
            selected_color: row.selected_color,
            quantity: row.quantity,
            unit_price: row.unit_price,
        }
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn find_by_owner(&self, owner: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            "SELECT id, owner_id, product_id, selected_size, selected_color, quantity, unit_price \
             FROM cart_lines WHERE owner_id = $1 ORDER BY id",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    async fn find_by_id(&self, id: CartLineId) -> Result<Option<CartLine>, RepositoryError> {
        let row = sqlx::query_as::<_, CartLineRow>(
            "SELECT id, owner_id, product_id, selected_size, selected_color, quantity, unit_price \
             FROM cart_lines WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CartLine::from))
    }

    async fn find_line(
        &self,
        owner: UserId,
        product: ProductId,
        variant: &Variant,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let row = sqlx::query_as::<_, CartLineRow>(
            "SELECT id, owner_id, product_id, selected_size, selected_color, quantity, unit_price \
             FROM cart_lines \
             WHERE owner_id = $1 AND product_id = $2 \
               AND selected_size = $3 AND selected_color = $4",
        )
        .bind(owner)
        .bind(product)
        .bind(&variant.size)
        .bind(&variant.color)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CartLine::from))
    }

    async fn upsert_line(&self, new: NewCartLine) -> Result<CartLine, RepositoryError> {
        // Single statement: the unit_price snapshot only applies on insert,
        // the increment path keeps the stored one.
        let row = sqlx::query_as::<_, CartLineRow>(
            "INSERT INTO cart_lines \
                 (owner_id, product_id, selected_size, selected_color, quantity, unit_price) \
             VALUES ($1, $2, $3, $4, 1, $5) \
             ON CONFLICT (owner_id, product_id, selected_size, selected_color) \
             DO UPDATE SET quantity = cart_lines.quantity + 1 \
             RETURNING id, owner_id, product_id, selected_size, selected_color, quantity, unit_price",
        )
        .bind(new.owner_id)
        .bind(new.product_id)
        .bind(&new.variant.size)
        .bind(&new.variant.color)
        .bind(new.unit_price)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn set_quantity(
        &self,
        id: CartLineId,
        quantity: i32,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let row = sqlx::query_as::<_, CartLineRow>(
            "UPDATE cart_lines SET quantity = $2 WHERE id = $1 \
             RETURNING id, owner_id, product_id, selected_size, selected_color, quantity, unit_price",
        )
        .bind(id)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CartLine::from))
    }

    async fn delete(&self, id: CartLineId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_owner(&self, owner: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE owner_id = $1")
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
