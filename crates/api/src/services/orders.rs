//! Checkout and order lifecycle.
//!
//! Placing, cancelling and status changes each run in one transaction. Stock
//! is taken with a conditional update so concurrent checkouts cannot sell
//! the same unit twice. Product rows are locked in ascending id order so
//! two checkouts with overlapping carts cannot deadlock.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use babycash_core::{AuditAction, AuditStatus, OrderId, OrderStatus, Page, PageRequest, ProductId};

use crate::db::orders::{self as order_tx, OrderRepository};
use crate::db::{carts, products};
use crate::error::{AppError, Result};
use crate::middleware::ClientInfo;
use crate::models::CurrentUser;
use crate::models::audit::NewAuditEntry;
use crate::models::order::{NewOrderItem, Order, OrderStats, order_number, order_total};
use crate::services::audit::AuditService;
use crate::services::loyalty::earn_for_order;

/// A checkout request that passed field validation.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub shipping_address: String,
    pub notes: Option<String>,
    pub items: Vec<(ProductId, i32)>,
}

pub struct OrderService<'a> {
    pool: &'a PgPool,
    repo: OrderRepository<'a>,
    audit: AuditService<'a>,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            repo: OrderRepository::new(pool),
            audit: AuditService::new(pool),
        }
    }

    /// Place an order and empty the user's cart.
    ///
    /// # Errors
    ///
    /// - `AppError::NotFound` if a product does not exist
    /// - `AppError::Business` if a product is disabled or out of stock
    pub async fn create(
        &self,
        user: &CurrentUser,
        request: &PlaceOrder,
        client: &ClientInfo,
    ) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let mut locked = HashMap::new();
        for product_id in lock_order(&request.items) {
            let product = products::get_for_update(&mut tx, product_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Product not found: {product_id}")))?;
            locked.insert(product_id, product);
        }

        let mut lines = Vec::with_capacity(request.items.len());
        for &(product_id, quantity) in &request.items {
            let product = locked
                .get(&product_id)
                .ok_or_else(|| AppError::not_found(format!("Product not found: {product_id}")))?;

            if !product.enabled {
                return Err(AppError::business(format!(
                    "Product is not available: {}",
                    product.name
                )));
            }
            if !products::decrement_stock(&mut tx, product_id, quantity).await? {
                return Err(AppError::business(format!(
                    "Insufficient stock for product: {}",
                    product.name
                )));
            }

            lines.push(NewOrderItem {
                product_id,
                product_name: product.name.clone(),
                quantity,
                unit_price: product.unit_price(),
            });
        }

        let total = order_total(&lines);
        let number = order_number(Utc::now(), Uuid::new_v4());
        let order_id = order_tx::insert_order(
            &mut tx,
            user.id,
            &number,
            total,
            &request.shipping_address,
            request.notes.as_deref(),
        )
        .await?;

        for line in &lines {
            order_tx::insert_item(&mut tx, order_id, line).await?;
        }
        carts::clear_for_user(&mut tx, user.id).await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, order_number = %number, total = %total, "Order placed");
        self.audit
            .record(
                NewAuditEntry::new(AuditAction::OrderCreated, AuditStatus::Success)
                    .actor(Some(user.id), user.email.as_str())
                    .entity("Order", order_id.as_i32())
                    .description(format!("Order {number} created"))
                    .client(client.ip_address.clone(), client.user_agent.clone()),
            )
            .await;

        self.load(order_id).await
    }

    /// One of the caller's orders.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the order does not exist, or
    /// `AppError::Business` if it belongs to someone else.
    pub async fn get_for_user(&self, user: &CurrentUser, id: OrderId) -> Result<Order> {
        owned(self.load(id).await?, user)
    }

    /// # Errors
    ///
    /// Same as [`Self::get_for_user`].
    pub async fn get_by_number_for_user(&self, user: &CurrentUser, number: &str) -> Result<Order> {
        let order = self
            .repo
            .get_by_number(number)
            .await?
            .ok_or_else(|| AppError::not_found("Order not found"))?;
        owned(order, user)
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list_for_user(&self, user: &CurrentUser, page: PageRequest) -> Result<Page<Order>> {
        Ok(self.repo.list_for_user(user.id, page).await?)
    }

    /// Cancel a PENDING order and put its stock back.
    ///
    /// # Errors
    ///
    /// - `AppError::NotFound` if the order does not exist
    /// - `AppError::Business` if it belongs to someone else or is past PENDING
    pub async fn cancel(&self, user: &CurrentUser, id: OrderId, client: &ClientInfo) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let order = order_tx::lock(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("Order not found"))?;
        if order.user_id != user.id {
            return Err(AppError::business("Access denied"));
        }
        if !order.status.is_cancellable() {
            return Err(AppError::business(format!(
                "Only pending orders can be cancelled, this one is {}",
                order.status
            )));
        }

        for (product_id, quantity) in order_tx::item_quantities(&mut tx, id).await? {
            products::restore_stock(&mut tx, product_id, quantity).await?;
        }
        order_tx::set_status(&mut tx, id, OrderStatus::Cancelled).await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, order_number = %order.order_number, "Order cancelled");
        self.audit
            .record(
                NewAuditEntry::new(AuditAction::OrderCancelled, AuditStatus::Success)
                    .actor(Some(user.id), user.email.as_str())
                    .entity("Order", id.as_i32())
                    .description(format!("Order {} cancelled", order.order_number))
                    .client(client.ip_address.clone(), client.user_agent.clone()),
            )
            .await;

        self.load(id).await
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list_all(&self, status: Option<OrderStatus>, page: PageRequest) -> Result<Page<Order>> {
        Ok(self.repo.list_all(status, page).await?)
    }

    /// Any order, without the ownership check.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the order does not exist.
    pub async fn get(&self, id: OrderId) -> Result<Order> {
        self.load(id).await
    }

    /// Move an order to `status`. Delivery awards loyalty points once.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the order does not exist.
    pub async fn update_status(
        &self,
        admin: &CurrentUser,
        id: OrderId,
        status: OrderStatus,
        client: &ClientInfo,
    ) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let order = order_tx::lock(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("Order not found"))?;
        order_tx::set_status(&mut tx, id, status).await?;

        let points = if order.status.awards_points_on(status) {
            earn_for_order(
                &mut tx,
                order.user_id,
                id,
                &order.order_number,
                order.total_amount,
                Utc::now(),
            )
            .await?
        } else {
            0
        };
        tx.commit().await?;

        tracing::info!(
            order_number = %order.order_number,
            from = %order.status,
            to = %status,
            points,
            "Order status changed"
        );
        self.audit
            .record(
                NewAuditEntry::new(AuditAction::OrderStatusChanged, AuditStatus::Success)
                    .actor(Some(admin.id), admin.email.as_str())
                    .entity("Order", id.as_i32())
                    .description(format!(
                        "Order {} status changed from {} to {status}",
                        order.order_number, order.status
                    ))
                    .client(client.ip_address.clone(), client.user_agent.clone()),
            )
            .await;

        self.load(id).await
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn stats(&self) -> Result<OrderStats> {
        Ok(self.repo.stats().await?)
    }

    async fn load(&self, id: OrderId) -> Result<Order> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Order not found"))
    }
}

fn owned(order: Order, user: &CurrentUser) -> Result<Order> {
    if order.is_owned_by(user.id) {
        Ok(order)
    } else {
        Err(AppError::business("Access denied"))
    }
}

/// Distinct products of an order, in the order their rows are locked.
fn lock_order(items: &[(ProductId, i32)]) -> Vec<ProductId> {
    let mut ids: Vec<ProductId> = items.iter().map(|&(id, _)| id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_order_is_ascending_and_distinct() {
        let items = [
            (ProductId::new(9), 1),
            (ProductId::new(2), 3),
            (ProductId::new(9), 2),
            (ProductId::new(5), 1),
        ];
        assert_eq!(
            lock_order(&items),
            vec![ProductId::new(2), ProductId::new(5), ProductId::new(9)]
        );
    }

    #[test]
    fn test_lock_order_ignores_cart_order() {
        let forward = [(ProductId::new(1), 1), (ProductId::new(2), 1)];
        let backward = [(ProductId::new(2), 1), (ProductId::new(1), 1)];
        assert_eq!(lock_order(&forward), lock_order(&backward));
    }
}
