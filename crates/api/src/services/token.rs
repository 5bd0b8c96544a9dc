//! Signed session tokens.
//!
//! Tokens are self-contained HS256 JWTs carrying the subject (normalized
//! email), a lowercase role claim, issued-at and expiry. Verification is
//! all-or-nothing: a token either yields a complete [`Identity`] or it is
//! invalid, and claims are only ever read from a verified token.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use cartwright_core::{Email, Role};

use crate::models::Identity;

/// Minimum signing key length for HS256.
const MIN_KEY_BYTES: usize = 32;

/// Token errors.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The configured secret derives a key shorter than HS256 requires.
    #[error("signing key must be at least {MIN_KEY_BYTES} bytes, got {0}")]
    KeyTooShort(usize),

    /// The token failed verification: bad signature, malformed structure,
    /// expired, or claims that do not map to an identity.
    #[error("invalid token")]
    Invalid,

    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
}

/// Claims embedded in every issued token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject: the user's normalized email.
    sub: String,
    /// Lowercase role claim.
    role: String,
    /// Issued-at (Unix timestamp, seconds).
    iat: i64,
    /// Expiry (Unix timestamp, seconds).
    exp: i64,
}

/// Issues and verifies signed session tokens. No external state.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl TokenService {
    /// Build a token service from the configured secret.
    ///
    /// The secret is interpreted as base64 first, falling back to its raw
    /// bytes when it is not valid base64.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::KeyTooShort`] when the derived key material
    /// is under 32 bytes. Callers treat this as a startup failure: a short
    /// key would be a silent security downgrade.
    pub fn new(secret: &SecretString, lifetime: Duration) -> Result<Self, TokenError> {
        let key = derive_key(secret.expose_secret());
        if key.len() < MIN_KEY_BYTES {
            return Err(TokenError::KeyTooShort(key.len()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(&key),
            decoding: DecodingKey::from_secret(&key),
            validation,
            lifetime,
        })
    }

    /// Issue a signed token for `(subject, role)`, valid for the
    /// configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Encode`] if signing fails.
    pub fn issue(&self, subject: &Email, role: Role) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.as_str().to_owned(),
            role: role.as_claim().to_owned(),
            iat: now.timestamp(),
            exp: now.timestamp() + i64::try_from(self.lifetime.as_secs()).unwrap_or(i64::MAX),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Encode)
    }

    /// Verify a token and derive the [`Identity`] it carries.
    ///
    /// # Errors
    ///
    /// Any structural or cryptographic failure, and an expiry in the past,
    /// yields [`TokenError::Invalid`] - never a partial identity.
    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|_| TokenError::Invalid)?;

        let claims = data.claims;
        let subject = Email::parse(&claims.sub).map_err(|_| TokenError::Invalid)?;
        let issued_at = timestamp(claims.iat)?;
        let expires_at = timestamp(claims.exp)?;

        Ok(Identity {
            subject,
            role: Role::parse(&claims.role),
            issued_at,
            expires_at,
        })
    }
}

/// Interpret the secret as base64 first, raw bytes otherwise.
fn derive_key(secret: &str) -> Vec<u8> {
    let trimmed = secret.trim();
    BASE64
        .decode(trimmed)
        .unwrap_or_else(|_| trimmed.as_bytes().to_vec())
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, TokenError> {
    DateTime::from_timestamp(secs, 0).ok_or(TokenError::Invalid)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        // '-' is outside the base64 alphabet, so this is used as raw bytes.
        SecretString::from("unit-test-secret-0123456789abcdef")
    }

    fn service() -> TokenService {
        TokenService::new(&secret(), Duration::from_secs(3600)).unwrap()
    }

    #[test]
    fn test_round_trip_preserves_subject_and_role() {
        let svc = service();
        let email = Email::parse("shopper@example.com").unwrap();

        let token = svc.issue(&email, Role::Admin).unwrap();
        let identity = svc.verify(&token).unwrap();

        assert_eq!(identity.subject, email);
        assert_eq!(identity.role, Role::Admin);
        assert!(identity.expires_at > identity.issued_at);
    }

    #[test]
    fn test_default_role_round_trip() {
        let svc = service();
        let email = Email::parse("shopper@example.com").unwrap();

        let token = svc.issue(&email, Role::User).unwrap();
        assert_eq!(svc.verify(&token).unwrap().role, Role::User);
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let svc = service();
        let email = Email::parse("shopper@example.com").unwrap();
        let token = svc.issue(&email, Role::User).unwrap();

        let mut tampered = token.clone();
        tampered.push('x');
        assert!(matches!(svc.verify(&tampered), Err(TokenError::Invalid)));

        assert!(matches!(
            svc.verify("not-a-token"),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let svc = service();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "shopper@example.com".to_owned(),
            role: "user".to_owned(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token =
            jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &svc.encoding).unwrap();

        assert!(matches!(svc.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_token_signed_with_other_key_is_invalid() {
        let svc = service();
        let other = TokenService::new(
            &SecretString::from("a-completely-different-signing-key"),
            Duration::from_secs(3600),
        )
        .unwrap();
        let email = Email::parse("shopper@example.com").unwrap();

        let token = other.issue(&email, Role::User).unwrap();
        assert!(matches!(svc.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_short_raw_secret_is_rejected() {
        let result = TokenService::new(&SecretString::from("short"), Duration::from_secs(3600));
        assert!(matches!(result, Err(TokenError::KeyTooShort(_))));
    }

    #[test]
    fn test_base64_secret_is_decoded_first() {
        // 32 bytes, base64-encoded: accepted.
        let encoded = BASE64.encode([7u8; 32]);
        assert!(TokenService::new(&SecretString::from(encoded), Duration::from_secs(3600)).is_ok());

        // 40 base64 chars decode to 30 bytes: the decoded form is what
        // gets measured, so this is rejected even though the raw string
        // is over 32 bytes long.
        let short_when_decoded = "a".repeat(40);
        let result = TokenService::new(
            &SecretString::from(short_when_decoded),
            Duration::from_secs(3600),
        );
        assert!(matches!(result, Err(TokenError::KeyTooShort(30))));
    }

    #[test]
    fn test_non_base64_secret_falls_back_to_raw_bytes() {
        // Contains characters outside the base64 alphabet, 32 bytes raw.
        let raw = "!!secret-key-with-enough-bytes!!";
        assert_eq!(raw.len(), 32);
        assert!(
            TokenService::new(&SecretString::from(raw), Duration::from_secs(3600)).is_ok()
        );
    }
}
