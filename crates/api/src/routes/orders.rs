//! Order route handlers: checkout for shoppers, fulfilment for admins.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use babycash_core::{OrderId, OrderStatus, Page, PageRequest, ProductId};

use super::parse_enum;
use crate::error::{FieldErrors, Result, add_breadcrumb};
use crate::middleware::{ClientInfo, RequireAdmin, RequireAuth};
use crate::models::order::{Order, OrderStats};
use crate::services::orders::{OrderService, PlaceOrder};
use crate::services::validation;
use crate::state::AppState;

const MAX_ITEMS: usize = 50;
const MAX_QUANTITY: i64 = 99;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub shipping_address: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

impl CreateOrderRequest {
    /// # Errors
    ///
    /// Returns `AppError::Validation` listing each invalid field.
    pub fn validate(self) -> Result<PlaceOrder> {
        let mut errors = FieldErrors::new();
        validation::length(&mut errors, "shippingAddress", &self.shipping_address, 10, 500);
        validation::max_length(&mut errors, "notes", self.notes.as_deref(), 1000);
        if self.items.is_empty() || self.items.len() > MAX_ITEMS {
            errors.add("items", format!("must contain between 1 and {MAX_ITEMS} items"));
        }
        if self
            .items
            .iter()
            .any(|item| !(1..=MAX_QUANTITY).contains(&i64::from(item.quantity)))
        {
            errors.add("items.quantity", format!("must be between 1 and {MAX_QUANTITY}"));
        }
        errors.into_result()?;

        Ok(PlaceOrder {
            shipping_address: self.shipping_address.trim().to_string(),
            notes: validation::non_blank(self.notes.as_deref()),
            items: self
                .items
                .into_iter()
                .map(|item| (item.product_id, item.quantity))
                .collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// POST /api/orders
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    client: ClientInfo,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = request.validate()?;
    let item_count = order.items.len().to_string();
    add_breadcrumb("order", "Placing order", Some(&[("items", item_count.as_str())]));

    let order = OrderService::new(state.pool())
        .create(&user, &order, &client)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/orders
pub async fn mine(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Order>>> {
    Ok(Json(
        OrderService::new(state.pool())
            .list_for_user(&user, page)
            .await?,
    ))
}

/// GET /api/orders/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    Ok(Json(
        OrderService::new(state.pool()).get_for_user(&user, id).await?,
    ))
}

/// GET /api/orders/number/{order_number}
pub async fn by_number(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(order_number): Path<String>,
) -> Result<Json<Order>> {
    Ok(Json(
        OrderService::new(state.pool())
            .get_by_number_for_user(&user, order_number.trim())
            .await?,
    ))
}

/// PUT /api/orders/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    client: ClientInfo,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    Ok(Json(
        OrderService::new(state.pool())
            .cancel(&user, id, &client)
            .await?,
    ))
}

/// GET /api/admin/orders?status=
pub async fn admin_index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(filter): Query<StatusFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Order>>> {
    let status = filter
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(parse_enum::<OrderStatus>)
        .transpose()?;
    Ok(Json(
        OrderService::new(state.pool()).list_all(status, page).await?,
    ))
}

/// GET /api/admin/orders/{id}
pub async fn admin_show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    Ok(Json(OrderService::new(state.pool()).get(id).await?))
}

/// PUT /api/admin/orders/{id}/status
pub async fn admin_update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    client: ClientInfo,
    Path(id): Path<OrderId>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    let status = parse_enum::<OrderStatus>(&request.status)?;
    Ok(Json(
        OrderService::new(state.pool())
            .update_status(&admin, id, status, &client)
            .await?,
    ))
}

/// GET /api/admin/orders/stats
pub async fn admin_stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<OrderStats>> {
    Ok(Json(OrderService::new(state.pool()).stats().await?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn request(items: serde_json::Value) -> CreateOrderRequest {
        serde_json::from_value(serde_json::json!({
            "shippingAddress": "Calle 45 #12-30, Bogotá",
            "notes": "  ",
            "items": items,
        }))
        .unwrap()
    }

    #[test]
    fn test_create_order_request_valid() {
        let order = request(serde_json::json!([
            {"productId": 1, "quantity": 2},
            {"productId": 7, "quantity": 1}
        ]))
        .validate()
        .unwrap();

        assert_eq!(order.items, vec![(ProductId::new(1), 2), (ProductId::new(7), 1)]);
        assert_eq!(order.notes, None);
    }

    #[test]
    fn test_create_order_request_rejects_empty_and_bad_quantities() {
        let Err(AppError::Validation(errors)) = request(serde_json::json!([])).validate() else {
            panic!("expected validation error");
        };
        assert!(errors.get("items").is_some());

        let Err(AppError::Validation(errors)) =
            request(serde_json::json!([{"productId": 1, "quantity": 100}])).validate()
        else {
            panic!("expected validation error");
        };
        assert!(errors.get("items.quantity").is_some());
    }

    #[test]
    fn test_create_order_request_short_address() {
        let mut short = request(serde_json::json!([{"productId": 1, "quantity": 1}]));
        short.shipping_address = "Calle 1".to_string();
        assert!(short.validate().is_err());
    }
}
