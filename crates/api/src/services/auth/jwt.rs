//! Access tokens: HS256 JWTs carrying the user's id, email and role.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use babycash_core::{UserId, UserRole};

use super::AuthError;
use crate::config::JwtConfig;
use crate::models::User;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID as a decimal string.
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// The user the token was issued to.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if `sub` is not a user ID.
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        self.sub
            .parse::<i32>()
            .map(UserId::new)
            .map_err(|_| AuthError::InvalidToken)
    }
}

/// Signing and verification keys for access tokens.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("keys", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl JwtKeys {
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        Self::from_secret(
            config.secret.expose_secret().as_bytes(),
            config.access_token_ttl,
        )
    }

    /// Build keys from raw secret bytes.
    #[must_use]
    pub fn from_secret(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Access token lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue an access token for `user`, valid from now.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenEncoding` if signing fails.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        self.issue_at(user.id, user.email.as_str(), user.role, Utc::now())
    }

    /// Issue an access token as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenEncoding` if signing fails.
    pub fn issue_at(
        &self,
        user_id: UserId,
        email: &str,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_owned(),
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(AuthError::TokenEncoding)
    }

    /// Check signature and expiry, returning the claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for any malformed, forged or expired token.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Access token rejected");
                AuthError::InvalidToken
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"k8#mP2$vL9@nQ4&wX7*zR1!yT6^uE3%s";

    fn keys() -> JwtKeys {
        JwtKeys::from_secret(SECRET, Duration::minutes(30))
    }

    #[test]
    fn test_issue_then_verify() {
        let keys = keys();
        let token = keys
            .issue_at(UserId::new(12), "ana@babycash.com", UserRole::Admin, Utc::now())
            .unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), UserId::new(12));
        assert_eq!(claims.email, "ana@babycash.com");
        assert_eq!(claims.role, UserRole::Admin);
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let keys = keys();
        let issued = Utc::now() - Duration::hours(3);
        let token = keys
            .issue_at(UserId::new(1), "a@b.co", UserRole::User, issued)
            .unwrap();

        assert!(matches!(keys.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let other = JwtKeys::from_secret(b"another-secret-value-with-32-chars!!", Duration::minutes(5));
        let token = other
            .issue_at(UserId::new(1), "a@b.co", UserRole::User, Utc::now())
            .unwrap();

        assert!(matches!(keys().verify(&token), Err(AuthError::InvalidToken)));
        assert!(matches!(keys().verify("not.a.jwt"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_debug_redacts_keys() {
        let debug = format!("{:?}", keys());
        assert!(debug.contains("[REDACTED]"));
    }
}
