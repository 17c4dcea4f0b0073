//! Order repository.
//!
//! Orders and their items are written inside the caller's transaction
//! (see `services::orders`). Reads load items in one extra query per page.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use babycash_core::{OrderId, OrderItemId, OrderStatus, Page, PageRequest, ProductId, UserId};

use super::RepositoryError;
use crate::models::order::{NewOrderItem, Order, OrderItem, OrderStats};

const ORDER_COLUMNS: &str = "id, order_number, user_id, status, total_amount, shipping_address, \
     notes, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    order_number: String,
    user_id: i32,
    status: OrderStatus,
    total_amount: Decimal,
    shipping_address: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: OrderId::new(self.id),
            order_number: self.order_number,
            user_id: UserId::new(self.user_id),
            status: self.status,
            total_amount: self.total_amount,
            shipping_address: self.shipping_address,
            notes: self.notes,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    product_name: String,
    quantity: i32,
    unit_price: Decimal,
    subtotal: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            quantity: row.quantity,
            unit_price: row.unit_price,
            subtotal: row.subtotal,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatsRow {
    total_orders: i64,
    pending_orders: i64,
    processing_orders: i64,
    completed_orders: i64,
    cancelled_orders: i64,
    total_revenue: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct UserTotalsRow {
    total_orders: i64,
    total_products: i64,
    total_spent: Decimal,
}

/// Purchase totals for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserOrderTotals {
    pub total_orders: i64,
    pub total_products: i64,
    pub total_spent: Decimal,
}

/// The fields needed to act on an order inside a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedOrder {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_amount: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct LockedOrderRow {
    id: i32,
    order_number: String,
    user_id: i32,
    status: OrderStatus,
    total_amount: Decimal,
}

/// Repository for order reads.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM babycash.order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        self.with_items_opt(row).await
    }

    /// Get an order by its public number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_number(&self, order_number: &str) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM babycash.order WHERE order_number = $1"
        ))
        .bind(order_number)
        .fetch_optional(self.pool)
        .await?;

        self.with_items_opt(row).await
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM babycash.order
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM babycash.order WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;

        Ok(Page::new(self.with_items(rows).await?, page, total))
    }

    /// Every order, newest first, optionally with one status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM babycash.order
            WHERE ($1::babycash.order_status IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM babycash.order \
             WHERE ($1::babycash.order_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        Ok(Page::new(self.with_items(rows).await?, page, total))
    }

    /// Dashboard counters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self) -> Result<OrderStats, RepositoryError> {
        let row = sqlx::query_as::<_, StatsRow>(
            r"
            SELECT
                COUNT(*) AS total_orders,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending_orders,
                COUNT(*) FILTER (WHERE status = 'processing') AS processing_orders,
                COUNT(*) FILTER (WHERE status = 'delivered') AS completed_orders,
                COUNT(*) FILTER (WHERE status = 'cancelled') AS cancelled_orders,
                COALESCE(SUM(total_amount) FILTER (WHERE status = 'delivered'), 0) AS total_revenue
            FROM babycash.order
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(OrderStats {
            total_orders: row.total_orders,
            pending_orders: row.pending_orders,
            processing_orders: row.processing_orders,
            completed_orders: row.completed_orders,
            cancelled_orders: row.cancelled_orders,
            total_revenue: row.total_revenue,
        })
    }

    /// Order count, item count and non-cancelled spend for one user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn totals_for_user(&self, user_id: UserId) -> Result<UserOrderTotals, RepositoryError> {
        let row = sqlx::query_as::<_, UserTotalsRow>(
            r"
            SELECT
                (SELECT COUNT(*) FROM babycash.order WHERE user_id = $1) AS total_orders,
                (SELECT COALESCE(SUM(oi.quantity), 0)::BIGINT
                 FROM babycash.order_item oi
                 JOIN babycash.order o ON o.id = oi.order_id
                 WHERE o.user_id = $1) AS total_products,
                (SELECT COALESCE(SUM(total_amount), 0)
                 FROM babycash.order
                 WHERE user_id = $1 AND status <> 'cancelled') AS total_spent
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(UserOrderTotals {
            total_orders: row.total_orders,
            total_products: row.total_products,
            total_spent: row.total_spent,
        })
    }

    async fn with_items_opt(&self, row: Option<OrderRow>) -> Result<Option<Order>, RepositoryError> {
        match row {
            Some(row) => Ok(self.with_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn with_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, product_id, product_name, quantity, unit_price, subtotal
            FROM babycash.order_item
            WHERE order_id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<i32, Vec<OrderItem>> = HashMap::new();
        for item in item_rows {
            grouped.entry(item.order_id).or_default().push(item.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = grouped.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect())
    }
}

// =============================================================================
// Transactional writes
// =============================================================================

/// Insert an order header with status PENDING.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` on an order-number collision.
pub async fn insert_order(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
    order_number: &str,
    total_amount: Decimal,
    shipping_address: &str,
    notes: Option<&str>,
) -> Result<OrderId, RepositoryError> {
    let id: i32 = sqlx::query_scalar(
        r"
        INSERT INTO babycash.order (order_number, user_id, status, total_amount, shipping_address, notes)
        VALUES ($1, $2, 'pending', $3, $4, $5)
        RETURNING id
        ",
    )
    .bind(order_number)
    .bind(user_id)
    .bind(total_amount)
    .bind(shipping_address)
    .bind(notes)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| RepositoryError::conflict_on_unique(e, "order number already exists"))?;

    Ok(OrderId::new(id))
}

/// Insert one order line with its price snapshot.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn insert_item(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
    item: &NewOrderItem,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO babycash.order_item (order_id, product_id, product_name, quantity, unit_price, subtotal)
        VALUES ($1, $2, $3, $4, $5, $6)
        ",
    )
    .bind(order_id)
    .bind(item.product_id)
    .bind(&item.product_name)
    .bind(item.quantity)
    .bind(item.unit_price)
    .bind(item.subtotal())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Lock an order row for the rest of the transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock(
    tx: &mut Transaction<'_, Postgres>,
    id: OrderId,
) -> Result<Option<LockedOrder>, RepositoryError> {
    let row = sqlx::query_as::<_, LockedOrderRow>(
        r"
        SELECT id, order_number, user_id, status, total_amount
        FROM babycash.order WHERE id = $1
        FOR UPDATE
        ",
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(row.map(|r| LockedOrder {
        id: OrderId::new(r.id),
        order_number: r.order_number,
        user_id: UserId::new(r.user_id),
        status: r.status,
        total_amount: r.total_amount,
    }))
}

/// Product and quantity of every line, for restoring stock. Lines come
/// back in ascending product id, the order checkout locks products in.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn item_quantities(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
) -> Result<Vec<(ProductId, i32)>, RepositoryError> {
    let rows: Vec<(i32, i32)> = sqlx::query_as(
        r"
        SELECT product_id, quantity FROM babycash.order_item
        WHERE order_id = $1
        ORDER BY product_id, id
        ",
    )
    .bind(order_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(product, quantity)| (ProductId::new(product), quantity))
        .collect())
}

/// Change an order's status.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn set_status(
    tx: &mut Transaction<'_, Postgres>,
    id: OrderId,
    status: OrderStatus,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE babycash.order SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(&mut **tx)
        .await?;

    Ok(())
}
