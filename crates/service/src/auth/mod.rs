//! Bearer-token verification.
//!
//! Credential issuance (signup, login, password hashing) lives in an
//! external service; this module only resolves an already-issued HS256
//! token to a verified user id. `issue` exists so that service and the
//! test suite can mint tokens against the same secret.

mod middleware;

pub use middleware::{require_auth, CurrentUser};

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Verified user id.
    pub sub: i64,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingToken,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("token encoding failed: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

/// Resolves bearer tokens to user identities.
#[derive(Clone)]
pub struct Authenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl Authenticator {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            // HS256 with exp checking
            validation: Validation::default(),
        }
    }

    /// Verify a bearer token and return the user id it was issued for.
    pub fn verify(&self, token: &str) -> Result<i64, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|_| AuthError::InvalidToken)?;
        Ok(data.claims.sub)
    }

    /// Mint a token for a user id, valid for the given duration.
    pub fn issue(&self, user_id: i64, valid_for: Duration) -> Result<String, AuthError> {
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: user_id,
            iat: now,
            exp: now + valid_for.as_secs() as i64,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_verify_roundtrip() {
        let auth = Authenticator::new(b"test-secret");

        let token = auth.issue(42, Duration::from_secs(60)).unwrap();
        assert_eq!(auth.verify(&token).unwrap(), 42);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let auth = Authenticator::new(b"test-secret");
        let other = Authenticator::new(b"other-secret");

        let token = auth.issue(42, Duration::from_secs(60)).unwrap();
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_garbage_rejected() {
        let auth = Authenticator::new(b"test-secret");
        assert!(matches!(
            auth.verify("not.a.token"),
            Err(AuthError::InvalidToken)
        ));
    }
}
