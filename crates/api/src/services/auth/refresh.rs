//! Refresh tokens: opaque UUIDs stored server-side and rotated on use.
//!
//! A token can be exchanged exactly once. Presenting a revoked token means
//! it leaked (or a client raced itself), so every token of that user is
//! revoked and a security event is written.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use babycash_core::UserId;

use super::AuthError;
use crate::db::refresh_tokens::{RefreshToken, RefreshTokenRepository};
use crate::middleware::ClientInfo;
use crate::services::audit::AuditService;

/// Lifetime of a refresh token.
pub const REFRESH_TOKEN_DAYS: i64 = 7;
/// Active tokens a user may hold; issuing one more revokes the oldest.
pub const MAX_ACTIVE_TOKENS: i64 = 5;
/// Dead tokens are kept this long before cleanup deletes them.
pub const RETENTION_DAYS: i64 = 30;

pub struct RefreshTokenService<'a> {
    repo: RefreshTokenRepository<'a>,
    audit: AuditService<'a>,
}

impl<'a> RefreshTokenService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            repo: RefreshTokenRepository::new(pool),
            audit: AuditService::new(pool),
        }
    }

    /// Issue a fresh token for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the token cannot be stored.
    pub async fn issue(&self, user_id: UserId, client: &ClientInfo) -> Result<RefreshToken, AuthError> {
        let token = Uuid::new_v4().to_string();
        let expiry = Utc::now() + Duration::days(REFRESH_TOKEN_DAYS);

        let stored = self
            .repo
            .create(
                user_id,
                &token,
                expiry,
                client.ip(),
                client.user_agent(),
                MAX_ACTIVE_TOKENS,
            )
            .await?;

        tracing::debug!(user_id = %user_id, "Refresh token issued");
        Ok(stored)
    }

    /// Look up a presented token and check it is still usable.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidRefreshToken` if the token is unknown
    /// - `AuthError::RefreshTokenReused` if it was already revoked
    /// - `AuthError::RefreshTokenExpired` if it is past its expiry
    pub async fn verify(&self, token: &str, client: &ClientInfo) -> Result<RefreshToken, AuthError> {
        let stored = self
            .repo
            .get_by_token(token)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        if stored.revoked {
            self.handle_reuse(stored.user_id, client).await?;
            return Err(AuthError::RefreshTokenReused);
        }

        if stored.is_expired(Utc::now()) {
            return Err(AuthError::RefreshTokenExpired);
        }

        Ok(stored)
    }

    /// Exchange `token` for a new one. The presented token is revoked.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::verify`]. Losing a race against another
    /// exchange of the same token counts as reuse.
    pub async fn rotate(&self, token: &str, client: &ClientInfo) -> Result<RefreshToken, AuthError> {
        let current = self.verify(token, client).await?;

        if !self.repo.revoke(&current.token).await? {
            self.handle_reuse(current.user_id, client).await?;
            return Err(AuthError::RefreshTokenReused);
        }

        self.issue(current.user_id, client).await
    }

    /// The user a token belongs to, whatever its state.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn owner(&self, token: &str) -> Result<Option<UserId>, AuthError> {
        Ok(self.repo.get_by_token(token).await?.map(|t| t.user_id))
    }

    /// Revoke one token. Unknown or already revoked tokens are ignored.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the update fails.
    pub async fn revoke(&self, token: &str) -> Result<bool, AuthError> {
        Ok(self.repo.revoke(token).await?)
    }

    /// Revoke every active token of a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the update fails.
    pub async fn revoke_all(&self, user_id: UserId) -> Result<u64, AuthError> {
        let revoked = self.repo.revoke_all_for_user(user_id).await?;
        tracing::info!(user_id = %user_id, revoked, "Revoked all refresh tokens");
        Ok(revoked)
    }

    /// Delete tokens that died more than [`RETENTION_DAYS`] before `now`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the delete fails.
    pub async fn cleanup_old_tokens(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        Ok(self
            .repo
            .delete_dead_before(now - Duration::days(RETENTION_DAYS))
            .await?)
    }

    async fn handle_reuse(&self, user_id: UserId, client: &ClientInfo) -> Result<(), AuthError> {
        tracing::warn!(user_id = %user_id, "Revoked refresh token presented");
        self.revoke_all(user_id).await?;
        self.audit
            .security_event(
                &format!("Refresh token reuse detected for user {user_id}"),
                Some("all refresh tokens revoked"),
                client,
            )
            .await;
        Ok(())
    }
}
