//! Audit log repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use babycash_core::{AuditAction, AuditLogId, AuditStatus, UserId};

use super::RepositoryError;
use crate::models::audit::{AuditEntry, NewAuditEntry};

const AUDIT_COLUMNS: &str = "id, user_id, username, action_type, entity_type, entity_id, \
     description, ip_address, user_agent, status, error_message, metadata, created_at";

#[derive(Debug, sqlx::FromRow)]
struct AuditRow {
    id: i32,
    user_id: Option<i32>,
    username: Option<String>,
    action_type: AuditAction,
    entity_type: Option<String>,
    entity_id: Option<i32>,
    description: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    status: AuditStatus,
    error_message: Option<String>,
    metadata: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<AuditRow> for AuditEntry {
    fn from(row: AuditRow) -> Self {
        Self {
            id: AuditLogId::new(row.id),
            user_id: row.user_id.map(UserId::new),
            username: row.username,
            action_type: row.action_type,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            description: row.description,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            status: row.status,
            error_message: row.error_message,
            metadata: row.metadata,
            created_at: row.created_at,
        }
    }
}

/// Repository for the audit trail.
pub struct AuditLogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AuditLogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append an entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn insert(&self, entry: &NewAuditEntry) -> Result<AuditLogId, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO babycash.audit_log
                (user_id, username, action_type, entity_type, entity_id, description,
                 ip_address, user_agent, status, error_message, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            ",
        )
        .bind(entry.user_id)
        .bind(entry.username.as_deref())
        .bind(entry.action_type)
        .bind(entry.entity_type.as_deref())
        .bind(entry.entity_id)
        .bind(entry.description.as_deref())
        .bind(entry.ip_address.as_deref())
        .bind(entry.user_agent.as_deref())
        .bind(entry.status)
        .bind(entry.error_message.as_deref())
        .bind(entry.metadata.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(AuditLogId::new(id))
    }

    /// Failed logins from one IP since `since`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_failed_logins(
        &self,
        ip_address: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM babycash.audit_log
            WHERE action_type = 'login_failed' AND ip_address = $1 AND created_at >= $2
            ",
        )
        .bind(ip_address)
        .bind(since)
        .fetch_one(self.pool)
        .await?)
    }

    /// Security events recorded since `since`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn security_events_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<AuditEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, AuditRow>(&format!(
            r"
            SELECT {AUDIT_COLUMNS} FROM babycash.audit_log
            WHERE action_type = 'security_event' AND created_at >= $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(since)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Delete entries older than `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM babycash.audit_log WHERE created_at < $1")
            .bind(cutoff)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
