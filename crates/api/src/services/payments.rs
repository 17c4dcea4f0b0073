//! Simulated payment gateway.
//!
//! No card data leaves the server and nothing is charged. A payment is
//! recorded as COMPLETED and the order moves on to PROCESSING.

use sqlx::PgPool;
use uuid::Uuid;

use babycash_core::{AuditAction, AuditStatus, OrderId, OrderStatus, PaymentMethod, PaymentStatus};

use crate::db::orders::{self as order_tx, OrderRepository};
use crate::db::payments::{self, NewPayment, PaymentRepository};
use crate::error::{AppError, Result};
use crate::middleware::ClientInfo;
use crate::models::CurrentUser;
use crate::models::audit::NewAuditEntry;
use crate::models::payment::{Payment, card_last4};
use crate::services::audit::AuditService;

/// Checkout payment request. Only the last four card digits are kept.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub method: PaymentMethod,
    pub card_number: Option<String>,
}

pub struct PaymentService<'a> {
    pool: &'a PgPool,
    orders: OrderRepository<'a>,
    payments: PaymentRepository<'a>,
    audit: AuditService<'a>,
}

impl<'a> PaymentService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            orders: OrderRepository::new(pool),
            payments: PaymentRepository::new(pool),
            audit: AuditService::new(pool),
        }
    }

    /// Pay for a PENDING order.
    ///
    /// # Errors
    ///
    /// - `AppError::NotFound` if the order does not exist
    /// - `AppError::Business` if it belongs to someone else or is not PENDING
    pub async fn process(
        &self,
        user: &CurrentUser,
        request: &PaymentRequest,
        client: &ClientInfo,
    ) -> Result<Payment> {
        let mut tx = self.pool.begin().await?;

        let order = order_tx::lock(&mut tx, request.order_id)
            .await?
            .ok_or_else(|| AppError::not_found("Order not found"))?;
        if order.user_id != user.id {
            return Err(AppError::business("Access denied"));
        }
        if order.status != OrderStatus::Pending {
            return Err(AppError::business("Order is not pending payment"));
        }

        let transaction_id = format!("TXN-{}", Uuid::new_v4());
        let details = serde_json::json!({
            "cardLast4": card_last4(request.card_number.as_deref()),
            "demo": true,
        })
        .to_string();

        let payment = payments::insert(
            &mut tx,
            &NewPayment {
                order_id: order.id,
                user_id: user.id,
                method: request.method,
                status: PaymentStatus::Completed,
                amount: order.total_amount,
                transaction_id: &transaction_id,
                payment_details: &details,
            },
        )
        .await?;
        order_tx::set_status(&mut tx, order.id, OrderStatus::Processing).await?;
        tx.commit().await?;

        tracing::info!(
            order_number = %order.order_number,
            transaction_id = %transaction_id,
            amount = %order.total_amount,
            "Payment completed"
        );
        self.audit
            .record(
                NewAuditEntry::new(AuditAction::PaymentCompleted, AuditStatus::Success)
                    .actor(Some(user.id), user.email.as_str())
                    .entity("Payment", payment.id.as_i32())
                    .description(format!(
                        "Payment {transaction_id} for order {}",
                        order.order_number
                    ))
                    .client(client.ip_address.clone(), client.user_agent.clone()),
            )
            .await;

        Ok(payment)
    }

    /// Latest payment of one of the caller's orders.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the order or payment does not exist,
    /// or `AppError::Business` if the order belongs to someone else.
    pub async fn for_order(&self, user: &CurrentUser, order_id: OrderId) -> Result<Payment> {
        let order = self
            .orders
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::not_found("Order not found"))?;
        if !order.is_owned_by(user.id) {
            return Err(AppError::business("Access denied"));
        }

        self.payments
            .latest_for_order(order_id)
            .await?
            .ok_or_else(|| AppError::not_found("Payment not found"))
    }
}
