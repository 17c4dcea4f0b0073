//! Shopping cart types.
//!
//! Cart rows only store product and quantity. Prices are read from the
//! product at display time, so a cart always reflects current pricing.

use rust_decimal::Decimal;
use serde::Serialize;

use babycash_core::{CartId, CartItemId, ProductId};

use super::product::effective_price;

/// One cart row joined with the product it refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub item_id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_image: Option<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub quantity: i32,
}

impl CartLine {
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        effective_price(self.price, self.discount_price)
    }

    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.quantity)
    }
}

/// A cart line as returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_image: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub subtotal: Decimal,
}

/// Cart response body for every `/api/cart` operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    /// `None` until the user adds their first item.
    pub id: Option<CartId>,
    pub items: Vec<CartItemView>,
    pub total_amount: Decimal,
    pub total_items: i64,
}

impl CartView {
    /// A cart with no items.
    #[must_use]
    pub const fn empty(id: Option<CartId>) -> Self {
        Self {
            id,
            items: Vec::new(),
            total_amount: Decimal::ZERO,
            total_items: 0,
        }
    }

    /// Price every line and compute the totals.
    #[must_use]
    pub fn build(id: CartId, lines: Vec<CartLine>) -> Self {
        let items: Vec<CartItemView> = lines
            .into_iter()
            .map(|line| CartItemView {
                id: line.item_id,
                product_id: line.product_id,
                unit_price: line.unit_price(),
                subtotal: line.subtotal(),
                quantity: line.quantity,
                product_name: line.product_name,
                product_image: line.product_image,
            })
            .collect();

        let total_amount = items.iter().map(|i| i.subtotal).sum();
        let total_items = items.iter().map(|i| i64::from(i.quantity)).sum();

        Self {
            id: Some(id),
            items,
            total_amount,
            total_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: i32, price: i64, discount: Option<i64>, quantity: i32) -> CartLine {
        CartLine {
            item_id: CartItemId::new(id),
            product_id: ProductId::new(id * 10),
            product_name: format!("Producto {id}"),
            product_image: None,
            price: Decimal::new(price, 0),
            discount_price: discount.map(|d| Decimal::new(d, 0)),
            quantity,
        }
    }

    #[test]
    fn test_cart_totals_use_discount_price() {
        let cart = CartView::build(
            CartId::new(1),
            vec![line(1, 45_000, Some(40_000), 2), line(2, 28_000, None, 1)],
        );

        assert_eq!(cart.items[0].unit_price, Decimal::new(40_000, 0));
        assert_eq!(cart.items[0].subtotal, Decimal::new(80_000, 0));
        assert_eq!(cart.total_amount, Decimal::new(108_000, 0));
        assert_eq!(cart.total_items, 3);
    }

    #[test]
    fn test_empty_cart() {
        let cart = CartView::empty(None);
        assert!(cart.items.is_empty());
        assert_eq!(cart.total_amount, Decimal::ZERO);

        let json = serde_json::to_value(CartView::build(CartId::new(4), vec![])).unwrap_or_default();
        assert_eq!(json["id"], 4);
        assert_eq!(json["totalItems"], 0);
    }
}
