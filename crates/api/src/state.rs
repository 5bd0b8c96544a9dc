//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::db::{CartStore, ProductStore, UserStore};
use crate::services::{AuthService, CartService, TokenService};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Storage is held behind the store traits,
/// so the same state wiring serves both the Postgres-backed binary and
/// in-memory test setups.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    pool: Option<PgPool>,
    tokens: Arc<TokenService>,
    users: Arc<dyn UserStore>,
    auth: AuthService,
    cart: CartService,
}

impl AppState {
    /// Wire up the application state from its stores.
    ///
    /// `pool` is present only when running against Postgres; the readiness
    /// probe uses it to check connectivity.
    #[must_use]
    pub fn new(
        config: AppConfig,
        pool: Option<PgPool>,
        tokens: Arc<TokenService>,
        users: Arc<dyn UserStore>,
        products: Arc<dyn ProductStore>,
        cart: Arc<dyn CartStore>,
    ) -> Self {
        let auth = AuthService::new(Arc::clone(&users), Arc::clone(&tokens));
        let cart = CartService::new(products, cart);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tokens,
                users,
                auth,
                cart,
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get the database connection pool, if running against Postgres.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Get a reference to the token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get a reference to the user store.
    #[must_use]
    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.inner.users
    }

    /// Get a reference to the account service.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// Get a reference to the cart service.
    #[must_use]
    pub fn cart(&self) -> &CartService {
        &self.inner.cart
    }
}
