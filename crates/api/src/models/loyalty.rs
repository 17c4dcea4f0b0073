//! Loyalty ledger types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use babycash_core::loyalty::LedgerEntry;
use babycash_core::{LoyaltyPointId, LoyaltyTransactionType, OrderId, UserId};

/// One row of a customer's points ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoyaltyTransaction {
    pub id: LoyaltyPointId,
    pub user_id: UserId,
    pub order_id: Option<OrderId>,
    pub order_number: Option<String>,
    pub points: i32,
    pub transaction_type: LoyaltyTransactionType,
    pub description: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl LoyaltyTransaction {
    /// The fields the summary arithmetic works on.
    #[must_use]
    pub fn ledger_entry(&self) -> LedgerEntry {
        LedgerEntry {
            points: self.points,
            kind: self.transaction_type,
            active: self.active,
            expires_at: self.expires_at,
            created_at: self.created_at,
        }
    }
}

/// History row as returned by `/api/loyalty/history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyTransactionView {
    pub id: LoyaltyPointId,
    pub transaction_type: LoyaltyTransactionType,
    pub transaction_type_name: &'static str,
    pub points: i32,
    pub order_id: Option<OrderId>,
    pub order_number: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub expired: bool,
}

impl LoyaltyTransactionView {
    #[must_use]
    pub fn new(tx: LoyaltyTransaction, now: DateTime<Utc>) -> Self {
        let expired = tx.ledger_entry().is_expired(now);
        Self {
            id: tx.id,
            transaction_type: tx.transaction_type,
            transaction_type_name: tx.transaction_type.display_name(),
            points: tx.points,
            order_id: tx.order_id,
            order_number: tx.order_number,
            description: tx.description,
            created_at: tx.created_at,
            expires_at: tx.expires_at,
            active: tx.active,
            expired,
        }
    }
}
