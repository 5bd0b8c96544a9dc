//! Business services.

pub mod auth;
pub mod cart;
pub mod token;

pub use auth::AuthService;
pub use cart::CartService;
pub use token::{TokenError, TokenService};
