//! User domain types.

use serde::Serialize;

use cartwright_core::{Email, Role, UserId};

/// A registered account (domain type).
///
/// Carries the password hash, so this type is never serialized outward;
/// HTTP responses use [`UserSummary`] instead.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Normalized email address (unique).
    pub email: Email,
    /// Argon2id password hash in PHC string format.
    pub password_hash: String,
    /// Display name.
    pub username: String,
    /// The user's role.
    pub role: Role,
    /// Whether push notifications are enabled.
    pub push_enabled: bool,
    /// Optional phone number.
    pub phone: Option<String>,
}

/// Fields required to create a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub password_hash: String,
    pub username: String,
    pub role: Role,
    pub push_enabled: bool,
    pub phone: Option<String>,
}

/// The safe, serializable projection of a [`User`].
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub email: Email,
    pub username: String,
    pub role: Role,
    pub push_enabled: bool,
    pub phone: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            role: user.role,
            push_enabled: user.push_enabled,
            phone: user.phone.clone(),
        }
    }
}
