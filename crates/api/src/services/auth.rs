//! Account service: registration and login.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use cartwright_core::{Email, EmailError, Role};

use crate::db::{RepositoryError, UserStore};
use crate::error::AppError;
use crate::models::{NewUser, User};
use crate::services::{TokenError, TokenService};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Account errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown email or wrong password. Deliberately indistinguishable.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The email is already registered.
    #[error("an account with this email already exists")]
    UserAlreadyExists,

    /// Password does not meet requirements.
    #[error("{0}")]
    WeakPassword(String),

    /// Email format is invalid.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password hashing failed.
    #[error("failed to hash password")]
    PasswordHash,

    /// Token issuance failed.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Storage failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Unauthorized(err.to_string()),
            AuthError::UserAlreadyExists => Self::Conflict(err.to_string()),
            AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) => {
                Self::Invalid(err.to_string())
            }
            AuthError::PasswordHash | AuthError::Token(_) => Self::Internal(err.to_string()),
            AuthError::Repository(e) => Self::Database(e),
        }
    }
}

/// Registration and password login over the user store.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<TokenService>) -> Self {
        Self { users, tokens }
    }

    /// Register a new user with email and password.
    ///
    /// The email is normalized on parse; the role defaults to `user` and
    /// push notifications default to enabled.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        username: &str,
        phone: Option<String>,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let username = username.trim();
        let username = if username.is_empty() {
            email.as_str().to_owned()
        } else {
            username.to_owned()
        };

        let user = self
            .users
            .create(NewUser {
                email,
                password_hash,
                username,
                role: Role::User,
                push_enabled: true,
                phone,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Login with email and password, issuing a session token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is
    /// wrong; no token is issued in that case.
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, User), AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &user.password_hash)?;

        let token = self.tokens.issue(&user.email, user.role)?;
        Ok((token, user))
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
