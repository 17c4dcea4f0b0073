//! On-demand runs of the daily maintenance steps.

use babycash_api::services::auth::RefreshTokenService;
use babycash_api::services::loyalty::LoyaltyService;
use chrono::Utc;

use super::connect;

/// Expire loyalty points whose expiry date has passed.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the expiry fails.
pub async fn expire_points() -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect().await?;
    let expired = LoyaltyService::new(&pool)
        .process_expired_points(Utc::now())
        .await?;
    tracing::info!(expired, "Expired loyalty points processed");
    Ok(())
}

/// Delete refresh tokens that expired or were revoked long ago.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the delete fails.
pub async fn cleanup_tokens() -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect().await?;
    let deleted = RefreshTokenService::new(&pool)
        .cleanup_old_tokens(Utc::now())
        .await?;
    tracing::info!(deleted, "Old refresh tokens deleted");
    Ok(())
}
