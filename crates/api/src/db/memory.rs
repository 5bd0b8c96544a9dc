//! In-memory store implementations.
//!
//! Used by the test suite and for running the API without a database.
//! Each store keeps its state behind a single `Mutex`, so the cart upsert
//! satisfies the same atomicity contract as the Postgres unique index: the
//! lookup and the write happen under one lock acquisition.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use cartwright_core::{CartLineId, Email, ProductId, UserId};

use super::{CartStore, ProductStore, RepositoryError, UserStore};
use crate::models::{CartLine, NewCartLine, NewUser, Product, User, Variant};

/// In-memory [`UserStore`].
#[derive(Default)]
pub struct MemoryUserStore {
    inner: Mutex<UserTable>,
}

#[derive(Default)]
struct UserTable {
    next_id: i64,
    users: Vec<User>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let table = self.inner.lock().map_err(poisoned)?;
        Ok(table.users.iter().find(|u| &u.email == email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let table = self.inner.lock().map_err(poisoned)?;
        Ok(table.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, new: NewUser) -> Result<User, RepositoryError> {
        let mut table = self.inner.lock().map_err(poisoned)?;
        if table.users.iter().any(|u| u.email == new.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        table.next_id += 1;
        let user = User {
            id: UserId::new(table.next_id),
            email: new.email,
            password_hash: new.password_hash,
            username: new.username,
            role: new.role,
            push_enabled: new.push_enabled,
            phone: new.phone,
        };
        table.users.push(user.clone());
        Ok(user)
    }
}

/// In-memory [`ProductStore`] seeded up front.
#[derive(Default)]
pub struct MemoryProductStore {
    inner: Mutex<HashMap<ProductId, Product>>,
}

impl MemoryProductStore {
    /// Insert or replace a product.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned (test-only convenience).
    #[allow(clippy::unwrap_used)]
    pub fn put(&self, product: Product) {
        self.inner.lock().unwrap().insert(product.id, product);
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.inner.lock().map_err(poisoned)?;
        Ok(products.get(&id).cloned())
    }
}

/// In-memory [`CartStore`].
#[derive(Default)]
pub struct MemoryCartStore {
    inner: Mutex<CartTable>,
}

#[derive(Default)]
struct CartTable {
    next_id: i64,
    lines: Vec<CartLine>,
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn find_by_owner(&self, owner: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let table = self.inner.lock().map_err(poisoned)?;
        let mut lines: Vec<CartLine> = table
            .lines
            .iter()
            .filter(|l| l.owner_id == owner)
            .cloned()
            .collect();
        lines.sort_by_key(|l| l.id);
        Ok(lines)
    }

    async fn find_by_id(&self, id: CartLineId) -> Result<Option<CartLine>, RepositoryError> {
        let table = self.inner.lock().map_err(poisoned)?;
        Ok(table.lines.iter().find(|l| l.id == id).cloned())
    }

    async fn find_line(
        &self,
        owner: UserId,
        product: ProductId,
        variant: &Variant,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let table = self.inner.lock().map_err(poisoned)?;
        Ok(table
            .lines
            .iter()
            .find(|l| matches_tuple(l, owner, product, variant))
            .cloned())
    }

    async fn upsert_line(&self, new: NewCartLine) -> Result<CartLine, RepositoryError> {
        let mut table = self.inner.lock().map_err(poisoned)?;

        if let Some(line) = table
            .lines
            .iter_mut()
            .find(|l| matches_tuple(l, new.owner_id, new.product_id, &new.variant))
        {
            line.quantity += 1;
            return Ok(line.clone());
        }

        table.next_id += 1;
        let line = CartLine {
            id: CartLineId::new(table.next_id),
            owner_id: new.owner_id,
            product_id: new.product_id,
            selected_size: new.variant.size,
            selected_color: new.variant.color,
            quantity: 1,
            unit_price: new.unit_price,
        };
        table.lines.push(line.clone());
        Ok(line)
    }

    async fn set_quantity(
        &self,
        id: CartLineId,
        quantity: i32,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let mut table = self.inner.lock().map_err(poisoned)?;
        Ok(table.lines.iter_mut().find(|l| l.id == id).map(|line| {
            line.quantity = quantity;
            line.clone()
        }))
    }

    async fn delete(&self, id: CartLineId) -> Result<bool, RepositoryError> {
        let mut table = self.inner.lock().map_err(poisoned)?;
        let before = table.lines.len();
        table.lines.retain(|l| l.id != id);
        Ok(table.lines.len() < before)
    }

    async fn delete_by_owner(&self, owner: UserId) -> Result<u64, RepositoryError> {
        let mut table = self.inner.lock().map_err(poisoned)?;
        let before = table.lines.len();
        table.lines.retain(|l| l.owner_id != owner);
        Ok((before - table.lines.len()) as u64)
    }
}

fn matches_tuple(line: &CartLine, owner: UserId, product: ProductId, variant: &Variant) -> bool {
    line.owner_id == owner
        && line.product_id == product
        && line.selected_size == variant.size
        && line.selected_color == variant.color
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> RepositoryError {
    RepositoryError::DataCorruption("store lock poisoned".to_owned())
}
