//! HTTP middleware stack.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, added in `main`)
//! 2. `TraceLayer` (request tracing, added in `main`)
//! 3. Authentication gate (bearer token to request-scoped identity)

pub mod auth;

pub use auth::{OptionalUser, RequireAdmin, RequireUser, authenticate};
