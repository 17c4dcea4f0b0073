//! Payment repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use babycash_core::{OrderId, PaymentId, PaymentMethod, PaymentStatus, UserId};

use super::RepositoryError;
use crate::models::payment::Payment;

const PAYMENT_COLUMNS: &str = "p.id, p.order_id, o.order_number, p.user_id, p.payment_method, \
     p.status, p.amount, p.transaction_id, p.payment_details, p.created_at";

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: i32,
    order_id: i32,
    order_number: String,
    user_id: i32,
    payment_method: PaymentMethod,
    status: PaymentStatus,
    amount: Decimal,
    transaction_id: String,
    payment_details: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: PaymentId::new(row.id),
            order_id: OrderId::new(row.order_id),
            order_number: row.order_number,
            user_id: UserId::new(row.user_id),
            method: row.payment_method,
            status: row.status,
            amount: row.amount,
            transaction_id: row.transaction_id,
            payment_details: row.payment_details,
            created_at: row.created_at,
        }
    }
}

/// A payment about to be recorded.
#[derive(Debug, Clone)]
pub struct NewPayment<'a> {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub amount: Decimal,
    pub transaction_id: &'a str,
    pub payment_details: &'a str,
}

/// Repository for payment reads.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The most recent payment recorded for an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r"
            SELECT {PAYMENT_COLUMNS}
            FROM babycash.payment p
            JOIN babycash.order o ON o.id = p.order_id
            WHERE p.order_id = $1
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT 1
            "
        ))
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}

/// Record a payment inside the order transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the transaction ID is already used.
pub async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    new: &NewPayment<'_>,
) -> Result<Payment, RepositoryError> {
    let row = sqlx::query_as::<_, PaymentRow>(&format!(
        r"
        WITH p AS (
            INSERT INTO babycash.payment
                (order_id, user_id, payment_method, status, amount, transaction_id, payment_details)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
        )
        SELECT {PAYMENT_COLUMNS}
        FROM p
        JOIN babycash.order o ON o.id = p.order_id
        "
    ))
    .bind(new.order_id)
    .bind(new.user_id)
    .bind(new.method)
    .bind(new.status)
    .bind(new.amount)
    .bind(new.transaction_id)
    .bind(new.payment_details)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| RepositoryError::conflict_on_unique(e, "transaction id already exists"))?;

    Ok(row.into())
}
