//! Audit trail.
//!
//! Writing an audit entry never fails the request that caused it: storage
//! errors are logged and dropped.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use babycash_core::{AuditAction, AuditStatus};

use crate::db::RepositoryError;
use crate::db::audit_logs::AuditLogRepository;
use crate::middleware::ClientInfo;
use crate::models::audit::{AuditEntry, NewAuditEntry};

/// Audit entries older than this are purged by the daily job.
pub const RETENTION_DAYS: i64 = 90;
/// Failed logins from one IP that trigger a security event.
pub const FAILED_LOGIN_THRESHOLD: i64 = 5;
/// Window over which failed logins are counted.
pub const FAILED_LOGIN_WINDOW_MINUTES: i64 = 15;
/// How far back the security report looks.
pub const SECURITY_REPORT_HOURS: i64 = 24;

/// Records and maintains audit entries.
pub struct AuditService<'a> {
    repo: AuditLogRepository<'a>,
}

impl<'a> AuditService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            repo: AuditLogRepository::new(pool),
        }
    }

    /// Write an entry, logging instead of failing.
    pub async fn record(&self, entry: NewAuditEntry) {
        let action = entry.action_type;
        if let Err(e) = self.repo.insert(&entry).await {
            tracing::error!(action = %action, error = %e, "Failed to write audit entry");
        }
    }

    /// Record a failed login. Raises a security event once one IP has failed
    /// [`FAILED_LOGIN_THRESHOLD`] times within the window.
    pub async fn login_failed(&self, email: &str, reason: &str, client: &ClientInfo) {
        self.record(
            NewAuditEntry::new(AuditAction::LoginFailed, AuditStatus::Failure)
                .actor(None, email)
                .description(format!("Failed login attempt for {email}"))
                .client(client.ip_address.clone(), client.user_agent.clone())
                .error(reason),
        )
        .await;

        let Some(ip) = client.ip() else {
            return;
        };

        let since = Utc::now() - Duration::minutes(FAILED_LOGIN_WINDOW_MINUTES);
        match self.repo.count_failed_logins(ip, since).await {
            Ok(count) if count >= FAILED_LOGIN_THRESHOLD => {
                tracing::warn!(ip = %ip, count, "Repeated failed logins");
                self.security_event(
                    &format!("{count} failed login attempts from {ip} in {FAILED_LOGIN_WINDOW_MINUTES} minutes"),
                    Some(&format!("last attempted email: {email}")),
                    client,
                )
                .await;
            }
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "Failed to count failed logins"),
        }
    }

    /// Record a security event with status WARNING.
    pub async fn security_event(&self, description: &str, details: Option<&str>, client: &ClientInfo) {
        let mut entry = NewAuditEntry::new(AuditAction::SecurityEvent, AuditStatus::Warning)
            .description(description)
            .client(client.ip_address.clone(), client.user_agent.clone());
        entry.metadata = details.map(str::to_string);

        tracing::warn!(description, "Security event");
        self.record(entry).await;
    }

    /// Delete entries older than [`RETENTION_DAYS`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn cleanup_old_logs(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        self.repo
            .delete_before(now - Duration::days(RETENTION_DAYS))
            .await
    }

    /// Security events from the last [`SECURITY_REPORT_HOURS`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent_security_events(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<AuditEntry>, RepositoryError> {
        self.repo
            .security_events_since(now - Duration::hours(SECURITY_REPORT_HOURS))
            .await
    }
}
