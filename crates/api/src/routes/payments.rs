//! Simulated payment gateway handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use babycash_core::{OrderId, PaymentMethod};

use crate::error::Result;
use crate::middleware::{ClientInfo, RequireAuth};
use crate::models::payment::Payment;
use crate::services::payments::{PaymentRequest, PaymentService};
use crate::state::AppState;

/// Card fields beyond the number are accepted for client compatibility
/// and never stored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPaymentRequest {
    pub order_id: OrderId,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub card_number: Option<String>,
    #[serde(default)]
    pub cardholder_name: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub cvv: Option<String>,
}

impl From<ProcessPaymentRequest> for PaymentRequest {
    fn from(request: ProcessPaymentRequest) -> Self {
        Self {
            order_id: request.order_id,
            method: request.payment_method,
            card_number: request.card_number,
        }
    }
}

/// POST /api/payments/process
pub async fn process(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    client: ClientInfo,
    Json(request): Json<ProcessPaymentRequest>,
) -> Result<(StatusCode, Json<Payment>)> {
    let payment = PaymentService::new(state.pool())
        .process(&user, &request.into(), &client)
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// GET /api/payments/order/{order_id}
pub async fn for_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(order_id): Path<OrderId>,
) -> Result<Json<Payment>> {
    Ok(Json(
        PaymentService::new(state.pool())
            .for_order(&user, order_id)
            .await?,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_process_request_drops_card_secrets() {
        let request: ProcessPaymentRequest = serde_json::from_value(serde_json::json!({
            "orderId": 12,
            "paymentMethod": "CREDIT_CARD",
            "cardNumber": "4111111111111111",
            "cvv": "123"
        }))
        .unwrap();

        let payment = PaymentRequest::from(request);
        assert_eq!(payment.order_id, OrderId::new(12));
        assert_eq!(payment.method, PaymentMethod::CreditCard);
        assert_eq!(payment.card_number.as_deref(), Some("4111111111111111"));
    }
}
