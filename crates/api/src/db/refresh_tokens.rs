//! Refresh token repository.
//!
//! Tokens are opaque UUID strings. Rows are never updated except to revoke
//! them, and are deleted by the daily cleanup once they are long dead.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use babycash_core::{RefreshTokenId, UserId};

use super::RepositoryError;

/// A stored refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub id: RefreshTokenId,
    pub token: String,
    pub user_id: UserId,
    pub expiry_date: DateTime<Utc>,
    pub revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date <= now
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RefreshTokenRow {
    id: i32,
    token: String,
    user_id: i32,
    expiry_date: DateTime<Utc>,
    revoked: bool,
    revoked_at: Option<DateTime<Utc>>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<RefreshTokenRow> for RefreshToken {
    fn from(row: RefreshTokenRow) -> Self {
        Self {
            id: RefreshTokenId::new(row.id),
            token: row.token,
            user_id: UserId::new(row.user_id),
            expiry_date: row.expiry_date,
            revoked: row.revoked,
            revoked_at: row.revoked_at,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            created_at: row.created_at,
        }
    }
}

const TOKEN_COLUMNS: &str =
    "id, token, user_id, expiry_date, revoked, revoked_at, ip_address, user_agent, created_at";

/// Repository for refresh token operations.
pub struct RefreshTokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RefreshTokenRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Look up a token by its opaque value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_token(&self, token: &str) -> Result<Option<RefreshToken>, RepositoryError> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM babycash.refresh_token WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Insert a token, revoking the oldest active ones so that at most
    /// `max_active` remain active for the user afterwards.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn create(
        &self,
        user_id: UserId,
        token: &str,
        expiry_date: DateTime<Utc>,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
        max_active: i64,
    ) -> Result<RefreshToken, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Keep the newest (max_active - 1) active tokens, revoke the rest
        sqlx::query(
            r"
            UPDATE babycash.refresh_token
            SET revoked = TRUE, revoked_at = NOW()
            WHERE id IN (
                SELECT id FROM babycash.refresh_token
                WHERE user_id = $1 AND revoked = FALSE AND expiry_date > NOW()
                ORDER BY created_at DESC, id DESC
                OFFSET $2
            )
            ",
        )
        .bind(user_id)
        .bind((max_active - 1).max(0))
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, RefreshTokenRow>(&format!(
            r"
            INSERT INTO babycash.refresh_token (token, user_id, expiry_date, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {TOKEN_COLUMNS}
            "
        ))
        .bind(token)
        .bind(user_id)
        .bind(expiry_date)
        .bind(ip_address)
        .bind(user_agent)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    /// Revoke one token. Returns `false` if it was unknown or already revoked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn revoke(&self, token: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE babycash.refresh_token
            SET revoked = TRUE, revoked_at = NOW()
            WHERE token = $1 AND revoked = FALSE
            ",
        )
        .bind(token)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Revoke every active token of a user. Returns how many were revoked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE babycash.refresh_token
            SET revoked = TRUE, revoked_at = NOW()
            WHERE user_id = $1 AND revoked = FALSE
            ",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Delete tokens that expired, or were revoked, before `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_dead_before(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM babycash.refresh_token
            WHERE expiry_date < $1 OR (revoked AND revoked_at < $1)
            ",
        )
        .bind(cutoff)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
