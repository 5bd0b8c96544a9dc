//! Domain types.
//!
//! These types represent validated domain objects separate from database
//! row types and from the JSON shapes exposed over HTTP.

pub mod cart;
pub mod identity;
pub mod product;
pub mod user;

pub use cart::{CartLine, NewCartLine, Variant};
pub use identity::Identity;
pub use product::Product;
pub use user::{NewUser, User, UserSummary};
