//! Request-scoped identity.

use chrono::{DateTime, Utc};

use cartwright_core::{Email, Role};

/// The verified (subject, role) pair established for one request.
///
/// An `Identity` is only ever produced by verifying a signed token; it is
/// never built from request fields directly. The authentication gate
/// installs it as a request extension, so concurrent requests each carry
/// their own value rather than sharing a process-wide context.
#[derive(Debug, Clone)]
pub struct Identity {
    /// The token subject: the user's normalized email.
    pub subject: Email,
    /// Role claim, normalized to the closed [`Role`] set.
    pub role: Role,
    /// When the token was issued.
    pub issued_at: DateTime<Utc>,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
}

impl Identity {
    /// The upper-case authority string used by role checks.
    #[must_use]
    pub const fn authority(&self) -> &'static str {
        self.role.as_authority()
    }
}
