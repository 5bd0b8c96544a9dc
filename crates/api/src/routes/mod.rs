//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health               - Liveness check (public)
//! GET    /health/ready         - Readiness check, pings the database (public)
//!
//! # Auth (public)
//! POST   /auth/login           - Password login, returns a bearer token
//! POST   /auth/register        - Create an account
//!
//! # Cart (requires bearer token)
//! GET    /cart                 - List the caller's cart lines
//! POST   /cart/add             - Add one unit of a product variant
//! PUT    /cart/{id}            - Set an absolute quantity (<= 0 removes)
//! DELETE /cart/{id}            - Remove one line
//! DELETE /cart/clear           - Empty the cart
//! ```

pub mod auth;
pub mod cart;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};

use crate::middleware::authenticate;
use crate::state::AppState;

/// Build the application router with the authentication gate applied.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/cart", get(cart::list))
        .route("/cart/add", post(cart::add))
        .route("/cart/clear", delete(cart::clear))
        .route("/cart/{id}", put(cart::update).delete(cart::remove))
        .layer(from_fn_with_state(state.clone(), authenticate))
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK. Returns 503
/// Service Unavailable if the database is not reachable. In-memory
/// setups have no database to check and are always ready.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };

    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
