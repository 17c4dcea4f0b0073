//! Cart route handlers. Every response is the full cart.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use babycash_core::{CartItemId, ProductId};

use crate::error::{FieldErrors, Result};
use crate::middleware::RequireAuth;
use crate::models::cart::CartView;
use crate::services::cart::{CartService, MAX_LINE_QUANTITY};
use crate::services::validation;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

/// GET /api/cart
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    Ok(Json(CartService::new(state.pool()).view(user.id).await?))
}

/// POST /api/cart/add
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let mut errors = FieldErrors::new();
    validation::range(
        &mut errors,
        "quantity",
        i64::from(request.quantity),
        1,
        i64::from(MAX_LINE_QUANTITY),
    );
    errors.into_result()?;

    let cart = CartService::new(state.pool())
        .add(user.id, request.product_id, request.quantity)
        .await?;
    Ok(Json(cart))
}

/// PUT /api/cart/items/{item_id}
pub async fn update_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<CartItemId>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool())
        .update(user.id, item_id, request.quantity)
        .await?;
    Ok(Json(cart))
}

/// DELETE /api/cart/items/{item_id}
pub async fn remove_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<CartView>> {
    Ok(Json(
        CartService::new(state.pool()).remove(user.id, item_id).await?,
    ))
}

/// DELETE /api/cart/clear
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    Ok(Json(CartService::new(state.pool()).clear(user.id).await?))
}
