//! Authentication gate and identity extractors.
//!
//! The gate runs ahead of every route. It never retries and never
//! half-authenticates: a request leaves it either anonymous or with a
//! fully verified account installed as a request extension. Handlers
//! pick the account up through the extractors below.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use cartwright_core::Role;

use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

/// Paths that skip the gate entirely.
///
/// `/ws` stays public so a future realtime upgrade endpoint can do its
/// own handshake authentication.
fn is_public(path: &str) -> bool {
    matches!(path, "/auth/login" | "/auth/register")
        || path == "/health"
        || path.starts_with("/health/")
        || path == "/ws"
        || path.starts_with("/ws/")
}

/// Per-request authentication gate.
///
/// Decision order:
/// 1. Allowlisted paths pass straight through.
/// 2. No `Authorization: Bearer` header: the request proceeds anonymous;
///    protected handlers reject via [`RequireUser`].
/// 3. A bearer token that fails verification is an immediate 401; the
///    handler never runs.
/// 4. A valid token whose subject no longer resolves to an account is
///    also a 401. Otherwise the verified [`Identity`] and the resolved
///    [`User`] are installed as request extensions.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` for cases 3 and 4 above.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_public(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let Some(token) = bearer_token(&request) else {
        return Ok(next.run(request).await);
    };

    let identity = state
        .tokens()
        .verify(token)
        .map_err(|_| AppError::Unauthorized("invalid or expired token".to_owned()))?;

    let user = state
        .users()
        .find_by_email(&identity.subject)
        .await?
        .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_owned()))?;

    tracing::debug!(user = %user.email, authority = identity.authority(), "authenticated");

    request.extensions_mut().insert(identity);
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Pull the token out of the `Authorization: Bearer` header.
///
/// A missing header, non-UTF-8 value, or missing `Bearer ` prefix all
/// read as "no credential presented".
fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Extractor that requires an authenticated account.
///
/// Rejects with 401 when the gate installed no account, which covers
/// both "no token presented" and any path the gate did not cover.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireUser(pub User);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))
    }
}

/// Extractor that optionally gets the authenticated account.
///
/// Unlike [`RequireUser`], this never rejects the request.
pub struct OptionalUser(pub Option<User>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<User>().cloned()))
    }
}

/// Extractor that requires an account with the admin role.
///
/// An anonymous request gets 401; an authenticated non-admin gets 403.
/// The two are deliberately distinct status codes.
pub struct RequireAdmin(pub User);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;

        if user.role != Role::Admin {
            return Err(AppError::Forbidden(format!(
                "{} authority required",
                Role::Admin.as_authority()
            )));
        }

        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_allowlist() {
        assert!(is_public("/auth/login"));
        assert!(is_public("/auth/register"));
        assert!(is_public("/health"));
        assert!(is_public("/health/ready"));
        assert!(is_public("/ws"));
        assert!(is_public("/ws/cart"));

        assert!(!is_public("/cart"));
        assert!(!is_public("/cart/add"));
        assert!(!is_public("/auth/login/other"));
        assert!(!is_public("/wsx"));
    }
}
