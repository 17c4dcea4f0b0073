//! Catalog domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use babycash_core::{ProductCategory, ProductId};

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub category: ProductCategory,
    pub stock: i32,
    pub image_url: Option<String>,
    pub enabled: bool,
    pub featured: bool,
    pub rating: Decimal,
    pub review_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Price charged per unit: the discount price when set, otherwise the list price.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        effective_price(self.price, self.discount_price)
    }
}

/// Price charged per unit given a list price and optional discount price.
#[must_use]
pub fn effective_price(price: Decimal, discount_price: Option<Decimal>) -> Decimal {
    discount_price.unwrap_or(price)
}

/// Validated fields for creating or replacing a product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub category: ProductCategory,
    pub stock: i32,
    pub image_url: Option<String>,
    pub featured: bool,
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_price_prefers_discount() {
        assert_eq!(
            effective_price(Decimal::new(45_000, 0), Some(Decimal::new(39_900, 0))),
            Decimal::new(39_900, 0)
        );
        assert_eq!(effective_price(Decimal::new(45_000, 0), None), Decimal::new(45_000, 0));
    }
}
