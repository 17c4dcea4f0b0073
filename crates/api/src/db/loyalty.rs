//! Loyalty ledger repository.
//!
//! The ledger is append-only apart from the `active` flag, which the expiry
//! job clears on rows whose points have lapsed.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use babycash_core::{LoyaltyPointId, LoyaltyTransactionType, OrderId, Page, PageRequest, UserId};

use super::RepositoryError;
use crate::models::loyalty::LoyaltyTransaction;

const LEDGER_COLUMNS: &str = "lp.id, lp.user_id, lp.order_id, o.order_number, lp.points, \
     lp.transaction_type, lp.description, lp.expires_at, lp.active, lp.created_at";

const HAS_EARNED_SQL: &str = r"
    SELECT EXISTS (
        SELECT 1 FROM babycash.loyalty_point
        WHERE order_id = $1 AND transaction_type = 'earned'
    )
";

#[derive(Debug, sqlx::FromRow)]
struct LedgerRow {
    id: i32,
    user_id: i32,
    order_id: Option<i32>,
    order_number: Option<String>,
    points: i32,
    transaction_type: LoyaltyTransactionType,
    description: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    active: bool,
    created_at: DateTime<Utc>,
}

impl From<LedgerRow> for LoyaltyTransaction {
    fn from(row: LedgerRow) -> Self {
        Self {
            id: LoyaltyPointId::new(row.id),
            user_id: UserId::new(row.user_id),
            order_id: row.order_id.map(OrderId::new),
            order_number: row.order_number,
            points: row.points,
            transaction_type: row.transaction_type,
            description: row.description,
            expires_at: row.expires_at,
            active: row.active,
            created_at: row.created_at,
        }
    }
}

/// A ledger row about to be written.
#[derive(Debug, Clone)]
pub struct NewLedgerEntry<'a> {
    pub user_id: UserId,
    pub order_id: Option<OrderId>,
    pub points: i32,
    pub transaction_type: LoyaltyTransactionType,
    pub description: &'a str,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Repository for loyalty ledger reads and single-row writes.
pub struct LoyaltyRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LoyaltyRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every ledger row of a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn entries_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<LoyaltyTransaction>, RepositoryError> {
        let rows = sqlx::query_as::<_, LedgerRow>(&format!(
            r"
            SELECT {LEDGER_COLUMNS}
            FROM babycash.loyalty_point lp
            LEFT JOIN babycash.order o ON o.id = lp.order_id
            WHERE lp.user_id = $1
            ORDER BY lp.created_at DESC, lp.id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// One page of a user's ledger, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn history(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Page<LoyaltyTransaction>, RepositoryError> {
        let rows = sqlx::query_as::<_, LedgerRow>(&format!(
            r"
            SELECT {LEDGER_COLUMNS}
            FROM babycash.loyalty_point lp
            LEFT JOIN babycash.order o ON o.id = lp.order_id
            WHERE lp.user_id = $1
            ORDER BY lp.created_at DESC, lp.id DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM babycash.loyalty_point WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(self.pool)
                .await?;

        Ok(Page::new(rows.into_iter().map(Into::into).collect(), page, total))
    }
}

// =============================================================================
// Transactional operations
// =============================================================================

/// Serialize ledger writes for one user until the transaction ends.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the user does not exist.
pub async fn lock_user(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
) -> Result<(), RepositoryError> {
    sqlx::query_scalar::<_, i32>("SELECT id FROM babycash.user WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;
    Ok(())
}

/// Every ledger row of a user, read inside a transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn entries_in(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
) -> Result<Vec<LoyaltyTransaction>, RepositoryError> {
    let rows = sqlx::query_as::<_, LedgerRow>(&format!(
        r"
        SELECT {LEDGER_COLUMNS}
        FROM babycash.loyalty_point lp
        LEFT JOIN babycash.order o ON o.id = lp.order_id
        WHERE lp.user_id = $1
        "
    ))
    .bind(user_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Whether points were already awarded for an order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn has_earned_in(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
) -> Result<bool, RepositoryError> {
    Ok(sqlx::query_scalar(HAS_EARNED_SQL)
        .bind(order_id)
        .fetch_one(&mut **tx)
        .await?)
}

/// Append one ledger row inside a transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn insert_in(
    tx: &mut Transaction<'_, Postgres>,
    entry: &NewLedgerEntry<'_>,
) -> Result<LoyaltyPointId, RepositoryError> {
    let id: i32 = sqlx::query_scalar(
        r"
        INSERT INTO babycash.loyalty_point
            (user_id, order_id, points, transaction_type, description, expires_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        ",
    )
    .bind(entry.user_id)
    .bind(entry.order_id)
    .bind(entry.points)
    .bind(entry.transaction_type)
    .bind(entry.description)
    .bind(entry.expires_at)
    .fetch_one(&mut **tx)
    .await?;

    Ok(LoyaltyPointId::new(id))
}

/// Deactivate every positive row whose expiry is at or before `now`, and
/// record a matching inactive EXPIRED row for each.
///
/// Returns the number of rows expired.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn expire_due(
    tx: &mut Transaction<'_, Postgres>,
    now: DateTime<Utc>,
) -> Result<u64, RepositoryError> {
    let result = sqlx::query(
        r"
        WITH due AS (
            UPDATE babycash.loyalty_point
            SET active = FALSE
            WHERE active
              AND points > 0
              AND expires_at IS NOT NULL
              AND expires_at <= $1
            RETURNING user_id, order_id, points
        )
        INSERT INTO babycash.loyalty_point
            (user_id, order_id, points, transaction_type, description, active)
        SELECT user_id, order_id, -points, 'expired', 'Points expired', FALSE
        FROM due
        ",
    )
    .bind(now)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}
