//! Core types as API clients see them on the wire.

#![allow(clippy::unwrap_used)]

use chrono::{TimeZone, Utc};
use serde_json::json;

use babycash_core::loyalty::{LedgerEntry, LoyaltySummary, LoyaltyTier};
use babycash_core::{
    Email, OrderStatus, Page, PageRequest, PaymentMethod, ProductCategory, ProductId, slug,
};

#[test]
fn test_enums_use_screaming_snake_names() {
    assert_eq!(serde_json::to_value(OrderStatus::Delivered).unwrap(), "DELIVERED");
    assert_eq!(
        serde_json::to_value(PaymentMethod::CreditCard).unwrap(),
        "CREDIT_CARD"
    );

    let category: ProductCategory = serde_json::from_value(json!("HEALTHCARE")).unwrap();
    assert_eq!(category, ProductCategory::Healthcare);
    assert!(serde_json::from_value::<ProductCategory>(json!("healthcare")).is_err());

    // Path and query parsing is lenient about case.
    assert_eq!("healthcare".parse::<ProductCategory>().unwrap(), ProductCategory::Healthcare);
}

#[test]
fn test_ids_are_plain_numbers() {
    let id: ProductId = serde_json::from_value(json!(42)).unwrap();
    assert_eq!(id.as_i32(), 42);
    assert_eq!(serde_json::to_value(id).unwrap(), json!(42));
}

#[test]
fn test_email_is_normalized_in_json() {
    let email: Email = serde_json::from_value(json!("  Ana.Gomez@BabyCash.com ")).unwrap();
    assert_eq!(serde_json::to_value(&email).unwrap(), "ana.gomez@babycash.com");
    assert!(serde_json::from_value::<Email>(json!("ana@")).is_err());
}

#[test]
fn test_page_shape() {
    let request: PageRequest = serde_json::from_value(json!({"page": 2, "size": 500})).unwrap();
    let page = Page::new(vec!["a", "b"], request, 205);
    let value = serde_json::to_value(&page).unwrap();

    assert_eq!(value["page"], 2);
    assert_eq!(value["size"], PageRequest::MAX_SIZE);
    assert_eq!(value["totalElements"], 205);
    assert_eq!(value["totalPages"], 3);
    assert_eq!(value["content"], json!(["a", "b"]));
}

#[test]
fn test_blog_slug_collisions() {
    let taken = ["primeros-pasos", "primeros-pasos-1"];
    let slug = slug::unique(&slug::slugify("¡Primeros Pasos!"), |s| taken.contains(&s));
    assert_eq!(slug, "primeros-pasos-2");
    assert_eq!(slug::slugify("¡¿?!"), slug::FALLBACK_SLUG);
}

#[test]
fn test_loyalty_summary_json() {
    let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
    let since = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let entries = [LedgerEntry {
        points: 1_250,
        kind: babycash_core::LoyaltyTransactionType::Earned,
        created_at: Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap(),
        expires_at: Some(Utc.with_ymd_and_hms(2026, 6, 2, 0, 0, 0).unwrap()),
        active: true,
    }];

    let summary = LoyaltySummary::compute(&entries, since, now);
    assert_eq!(summary.tier, LoyaltyTier::Silver);

    let value = serde_json::to_value(&summary).unwrap();
    assert_eq!(value["totalPoints"], 1_250);
    assert_eq!(value["tier"], "SILVER");
    assert_eq!(value["availableDiscountPercent"], 5);
    assert_eq!(value["pointsForNextDiscount"], 750);
}
