//! Persistence layer.
//!
//! The services consume storage through the [`UserStore`], [`ProductStore`]
//! and [`CartStore`] traits. `PostgreSQL` implementations live in the
//! per-entity modules; in-memory implementations (used by tests and local
//! development) live in [`memory`].
//!
//! # Concurrency
//!
//! [`CartStore::upsert_line`] is the one operation with a concurrency
//! contract: it must atomically insert a new line with quantity 1 or
//! increment the existing line for the same
//! `(owner, product, size, color)` tuple. The Postgres implementation
//! relies on a unique index over that tuple plus `ON CONFLICT .. DO
//! UPDATE`; the in-memory implementation performs the whole operation
//! under one lock.

pub mod cart;
pub mod memory;
pub mod products;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use cartwright_core::{CartLineId, Email, ProductId, UserId};

use crate::models::{CartLine, NewCartLine, NewUser, Product, User, Variant};

/// Errors from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The underlying database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Stored data could not be mapped back to a domain value.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Account lookup and creation.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Create a user. Fails with [`RepositoryError::Conflict`] when the
    /// email is already registered.
    async fn create(&self, new: NewUser) -> Result<User, RepositoryError>;
}

/// Catalog lookup. The cart engine only reads price and stock state.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;
}

/// Cart line storage.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// All lines for one owner, ordered by line id.
    async fn find_by_owner(&self, owner: UserId) -> Result<Vec<CartLine>, RepositoryError>;

    async fn find_by_id(&self, id: CartLineId) -> Result<Option<CartLine>, RepositoryError>;

    /// Look up the line for one `(owner, product, variant)` tuple.
    async fn find_line(
        &self,
        owner: UserId,
        product: ProductId,
        variant: &Variant,
    ) -> Result<Option<CartLine>, RepositoryError>;

    /// Atomic insert-or-increment (see module docs).
    async fn upsert_line(&self, new: NewCartLine) -> Result<CartLine, RepositoryError>;

    /// Set an absolute quantity. Returns the updated line, or `None` if
    /// the line no longer exists.
    async fn set_quantity(
        &self,
        id: CartLineId,
        quantity: i32,
    ) -> Result<Option<CartLine>, RepositoryError>;

    /// Delete one line. Returns whether a line was deleted.
    async fn delete(&self, id: CartLineId) -> Result<bool, RepositoryError>;

    /// Delete every line for an owner. Returns the number deleted.
    async fn delete_by_owner(&self, owner: UserId) -> Result<u64, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
