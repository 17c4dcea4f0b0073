//! Payment domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use babycash_core::{OrderId, PaymentId, PaymentMethod, PaymentStatus, UserId};

/// A recorded payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub order_number: String,
    #[serde(skip_serializing)]
    pub user_id: UserId,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub amount: Decimal,
    pub transaction_id: String,
    #[serde(skip_serializing)]
    pub payment_details: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Masked card summary stored with simulated payments.
#[must_use]
pub fn card_last4(card_number: Option<&str>) -> String {
    let digits: Vec<char> = card_number
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();

    match digits.len().checked_sub(4) {
        Some(start) => digits.iter().skip(start).collect(),
        None => "****".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_last4() {
        assert_eq!(card_last4(Some("4111 1111 1111 1234")), "1234");
        assert_eq!(card_last4(Some("12")), "****");
        assert_eq!(card_last4(None), "****");
    }
}
