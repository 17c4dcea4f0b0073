//! Loyalty points handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use babycash_core::loyalty::LoyaltySummary;
use babycash_core::{Page, PageRequest};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::loyalty::LoyaltyTransactionView;
use crate::services::loyalty::LoyaltyService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub points: i32,
}

/// GET /api/loyalty/points
pub async fn points(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<LoyaltySummary>> {
    Ok(Json(LoyaltyService::new(state.pool()).summary(user.id).await?))
}

/// GET /api/loyalty/history
pub async fn history(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<LoyaltyTransactionView>>> {
    Ok(Json(
        LoyaltyService::new(state.pool())
            .history(user.id, page)
            .await?,
    ))
}

/// POST /api/loyalty/redeem
pub async fn redeem(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<RedeemRequest>,
) -> Result<Json<LoyaltySummary>> {
    tracing::info!(user_id = %user.id, points = request.points, "Redeeming loyalty points");
    Ok(Json(
        LoyaltyService::new(state.pool())
            .redeem(user.id, request.points)
            .await?,
    ))
}
