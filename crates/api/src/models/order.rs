//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use babycash_core::{OrderId, OrderItemId, OrderStatus, ProductId, UserId};

/// A placed order with its line items.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    #[serde(skip_serializing)]
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub shipping_address: String,
    pub notes: Option<String>,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}

/// An order line. Name and price are snapshots taken at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// A line about to be inserted, priced but not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl NewOrderItem {
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Sum of line subtotals.
#[must_use]
pub fn order_total(items: &[NewOrderItem]) -> Decimal {
    items.iter().map(NewOrderItem::subtotal).sum()
}

/// Dashboard counters for `/api/admin/orders/stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: i64,
    pub pending_orders: i64,
    pub processing_orders: i64,
    /// Delivered orders.
    pub completed_orders: i64,
    pub cancelled_orders: i64,
    /// Sum of delivered order totals.
    pub total_revenue: Decimal,
}

/// Build an order number: `ORD-YYYYMMDDHHMMSS-XXXXXX`.
///
/// The suffix is the first six hex digits of `nonce`, uppercased.
#[must_use]
pub fn order_number(at: DateTime<Utc>, nonce: Uuid) -> String {
    let hex = nonce.simple().to_string();
    let suffix: String = hex.chars().take(6).collect::<String>().to_uppercase();
    format!("ORD-{}-{suffix}", at.format("%Y%m%d%H%M%S"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_order_number_format() {
        let at = Utc.with_ymd_and_hms(2025, 11, 3, 14, 5, 9).unwrap();
        let nonce = Uuid::parse_str("a1b2c3d4-0000-4000-8000-000000000000").unwrap();
        assert_eq!(order_number(at, nonce), "ORD-20251103140509-A1B2C3");
    }

    #[test]
    fn test_order_total_sums_subtotals() {
        let items = vec![
            NewOrderItem {
                product_id: ProductId::new(1),
                product_name: "Body de Algodón".to_string(),
                quantity: 3,
                unit_price: Decimal::new(45_000, 0),
            },
            NewOrderItem {
                product_id: ProductId::new(2),
                product_name: "Sonajero".to_string(),
                quantity: 1,
                unit_price: Decimal::new(28_000, 0),
            },
        ];
        assert_eq!(items[0].subtotal(), Decimal::new(135_000, 0));
        assert_eq!(order_total(&items), Decimal::new(163_000, 0));
        assert_eq!(order_total(&[]), Decimal::ZERO);
    }
}
