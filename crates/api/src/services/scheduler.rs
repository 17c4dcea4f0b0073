//! Daily maintenance job.
//!
//! Runs once a day at 01:00 UTC: expire loyalty points, purge dead refresh
//! tokens, purge old audit entries, then report recent security events.
//! A failing step is logged and the remaining steps still run.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::services::audit::{AuditService, SECURITY_REPORT_HOURS};
use crate::services::auth::RefreshTokenService;
use crate::services::loyalty::LoyaltyService;

/// Hour of day (UTC) the job runs.
pub const RUN_HOUR_UTC: i64 = 1;

/// Start the job. It stops when `shutdown` is cancelled.
pub fn spawn(pool: PgPool, shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let next = next_run_after(now);
            let wait = (next - now).to_std().unwrap_or_default();
            info!(next_run = %next, "Daily cleanup scheduled");

            tokio::select! {
                () = shutdown.cancelled() => {
                    info!("Daily cleanup stopped");
                    return;
                }
                () = tokio::time::sleep(wait) => {}
            }

            run_daily_cleanup(&pool, Utc::now()).await;
        }
    })
}

/// The first run time strictly after `now`.
#[must_use]
pub fn next_run_after(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive().and_time(NaiveTime::MIN).and_utc() + Duration::hours(RUN_HOUR_UTC);
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Run every cleanup step once.
pub async fn run_daily_cleanup(pool: &PgPool, now: DateTime<Utc>) {
    info!("Starting daily cleanup");

    match LoyaltyService::new(pool).process_expired_points(now).await {
        Ok(expired) => info!(expired, "Expired loyalty points processed"),
        Err(e) => error!(error = %e, "Loyalty expiry failed"),
    }

    match RefreshTokenService::new(pool).cleanup_old_tokens(now).await {
        Ok(deleted) => info!(deleted, "Old refresh tokens deleted"),
        Err(e) => error!(error = %e, "Refresh token cleanup failed"),
    }

    let audit = AuditService::new(pool);
    match audit.cleanup_old_logs(now).await {
        Ok(deleted) => info!(deleted, "Old audit entries deleted"),
        Err(e) => error!(error = %e, "Audit log cleanup failed"),
    }

    match audit.recent_security_events(now).await {
        Ok(events) if events.is_empty() => {
            info!(hours = SECURITY_REPORT_HOURS, "No security events");
        }
        Ok(events) => {
            warn!(
                count = events.len(),
                hours = SECURITY_REPORT_HOURS,
                "Security events recorded"
            );
            for event in &events {
                warn!(
                    at = %event.created_at,
                    ip = event.ip_address.as_deref().unwrap_or("-"),
                    description = event.description.as_deref().unwrap_or(""),
                    "Security event"
                );
            }
        }
        Err(e) => error!(error = %e, "Security report failed"),
    }

    info!("Daily cleanup finished");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_next_run_later_today() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 0, 30, 0).unwrap();
        assert_eq!(
            next_run_after(now),
            Utc.with_ymd_and_hms(2025, 3, 10, 1, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_next_run_tomorrow() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 1, 0, 0).unwrap();
        assert_eq!(
            next_run_after(now),
            Utc.with_ymd_and_hms(2025, 3, 11, 1, 0, 0).unwrap()
        );

        let now = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(
            next_run_after(now),
            Utc.with_ymd_and_hms(2026, 1, 1, 1, 0, 0).unwrap()
        );
    }
}
