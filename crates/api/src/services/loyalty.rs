//! Loyalty points.
//!
//! The ledger is append-only. Balances are never stored; every summary is
//! computed from the rows with the arithmetic in `babycash_core::loyalty`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use babycash_core::loyalty::{self, LedgerEntry, LoyaltySummary};
use babycash_core::{LoyaltyTransactionType, OrderId, Page, PageRequest, UserId};

use crate::db::loyalty::{self as ledger, LoyaltyRepository, NewLedgerEntry};
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::models::loyalty::LoyaltyTransactionView;

pub struct LoyaltyService<'a> {
    pool: &'a PgPool,
    repo: LoyaltyRepository<'a>,
    users: UserRepository<'a>,
}

impl<'a> LoyaltyService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            repo: LoyaltyRepository::new(pool),
            users: UserRepository::new(pool),
        }
    }

    /// Points dashboard for a user.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the user does not exist.
    pub async fn summary(&self, user_id: UserId) -> Result<LoyaltySummary> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let entries: Vec<LedgerEntry> = self
            .repo
            .entries_for_user(user_id)
            .await?
            .iter()
            .map(|tx| tx.ledger_entry())
            .collect();

        Ok(LoyaltySummary::compute(&entries, user.created_at, Utc::now()))
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn history(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Page<LoyaltyTransactionView>> {
        let now = Utc::now();
        Ok(self
            .repo
            .history(user_id, page)
            .await?
            .map(|tx| LoyaltyTransactionView::new(tx, now)))
    }

    /// Spend points from the active balance.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Business` if `points` is not positive or exceeds
    /// the balance.
    pub async fn redeem(&self, user_id: UserId, points: i32) -> Result<LoyaltySummary> {
        if points <= 0 {
            return Err(AppError::business("Points to redeem must be greater than 0"));
        }

        let mut tx = self.pool.begin().await?;
        ledger::lock_user(&mut tx, user_id).await?;

        let now = Utc::now();
        let entries: Vec<LedgerEntry> = ledger::entries_in(&mut tx, user_id)
            .await?
            .iter()
            .map(|row| row.ledger_entry())
            .collect();
        let available = loyalty::balance(&entries, now);

        if i64::from(points) > available {
            return Err(AppError::business(format!(
                "Insufficient points: {available} available"
            )));
        }

        ledger::insert_in(
            &mut tx,
            &NewLedgerEntry {
                user_id,
                order_id: None,
                points: -points,
                transaction_type: LoyaltyTransactionType::Redeemed,
                description: &format!("Redeemed {points} points"),
                expires_at: None,
            },
        )
        .await?;
        tx.commit().await?;

        tracing::info!(user_id = %user_id, points, "Loyalty points redeemed");
        self.summary(user_id).await
    }

    /// Deactivate every lapsed positive row and book the matching EXPIRED rows.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the transaction fails.
    pub async fn process_expired_points(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let expired = ledger::expire_due(&mut tx, now).await?;
        tx.commit().await?;
        Ok(expired)
    }
}

/// Award points for a delivered order inside the caller's transaction.
///
/// Returns the points awarded. Nothing is written when the order already
/// earned points or the amount is worth less than one point.
///
/// # Errors
///
/// Returns `AppError::Database` if a query fails.
pub async fn earn_for_order(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
    order_id: OrderId,
    order_number: &str,
    amount: Decimal,
    now: DateTime<Utc>,
) -> Result<i32> {
    let points = loyalty::points_for_amount(amount);
    if points <= 0 || ledger::has_earned_in(tx, order_id).await? {
        return Ok(0);
    }

    ledger::insert_in(
        tx,
        &NewLedgerEntry {
            user_id,
            order_id: Some(order_id),
            points,
            transaction_type: LoyaltyTransactionType::Earned,
            description: &format!("Points earned for order #{order_number}"),
            expires_at: Some(loyalty::expiry_for(now)),
        },
    )
    .await?;

    tracing::info!(user_id = %user_id, order_id = %order_id, points, "Loyalty points earned");
    Ok(points)
}
