//! Enumerated fields: roles, statuses, categories and ledger entry types.
//!
//! On the wire every enum uses its `SCREAMING_SNAKE_CASE` name (`"PENDING"`,
//! `"CREDIT_CARD"`). In `PostgreSQL` they map to enum types in the `babycash`
//! schema with `snake_case` labels. Parsing from text (query strings, path
//! segments, CLI arguments) is case-insensitive.

use serde::{Deserialize, Serialize};

/// Error returned when text does not name a variant of an enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    /// Human-readable name of the enum being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Implements `as_str`, `Display` and case-insensitive `FromStr` from a
/// variant-to-name table.
macro_rules! wire_names {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Wire name (`SCREAMING_SNAKE_CASE`).
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| ParseEnumError {
                        kind: $kind,
                        value: s.to_owned(),
                    })
            }
        }
    };
}

// =============================================================================
// Accounts
// =============================================================================

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "babycash.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Regular shopper.
    #[default]
    User,
    /// Store staff with access to the admin endpoints.
    Admin,
}

wire_names!(UserRole, "user role", {
    User => "USER",
    Admin => "ADMIN",
});

// =============================================================================
// Catalog
// =============================================================================

/// Product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "babycash.product_category", rename_all = "snake_case")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCategory {
    Clothing,
    Toys,
    Food,
    Furniture,
    Accessories,
    Healthcare,
    Books,
    Other,
}

wire_names!(ProductCategory, "product category", {
    Clothing => "CLOTHING",
    Toys => "TOYS",
    Food => "FOOD",
    Furniture => "FURNITURE",
    Accessories => "ACCESSORIES",
    Healthcare => "HEALTHCARE",
    Books => "BOOKS",
    Other => "OTHER",
});

// =============================================================================
// Orders & Payments
// =============================================================================

/// Order lifecycle status.
///
/// ```text
/// PENDING --pay--> PROCESSING --> SHIPPED --> DELIVERED
///    \
///     `--cancel--> CANCELLED
/// ```
///
/// Admins may set any status directly; the only side effect is the loyalty
/// award on the first transition into `DELIVERED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "babycash.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

wire_names!(OrderStatus, "order status", {
    Pending => "PENDING",
    Processing => "PROCESSING",
    Shipped => "SHIPPED",
    Delivered => "DELIVERED",
    Cancelled => "CANCELLED",
});

impl OrderStatus {
    /// Whether the customer may still cancel.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Whether moving from `self` to `next` should award loyalty points.
    #[must_use]
    pub const fn awards_points_on(self, next: Self) -> bool {
        matches!(next, Self::Delivered) && !matches!(self, Self::Delivered)
    }
}

/// Payment method chosen at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "babycash.payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Paypal,
    Stripe,
    Mercadopago,
}

wire_names!(PaymentMethod, "payment method", {
    CreditCard => "CREDIT_CARD",
    DebitCard => "DEBIT_CARD",
    Paypal => "PAYPAL",
    Stripe => "STRIPE",
    Mercadopago => "MERCADOPAGO",
});

/// Payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "babycash.payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
}

wire_names!(PaymentStatus, "payment status", {
    Pending => "PENDING",
    Processing => "PROCESSING",
    Completed => "COMPLETED",
    Failed => "FAILED",
    Refunded => "REFUNDED",
});

// =============================================================================
// Loyalty
// =============================================================================

/// Kind of loyalty ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "babycash.loyalty_transaction_type", rename_all = "snake_case")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoyaltyTransactionType {
    /// Points awarded for a delivered order.
    Earned,
    /// Points spent by the customer (stored negative).
    Redeemed,
    /// Points removed by the expiry job (stored negative).
    Expired,
    /// Points granted manually.
    Bonus,
    /// Points returned after a refund.
    Refund,
}

wire_names!(LoyaltyTransactionType, "loyalty transaction type", {
    Earned => "EARNED",
    Redeemed => "REDEEMED",
    Expired => "EXPIRED",
    Bonus => "BONUS",
    Refund => "REFUND",
});

impl LoyaltyTransactionType {
    /// Customer-facing label shown in the points history.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Earned => "Ganados",
            Self::Redeemed => "Canjeados",
            Self::Expired => "Expirados",
            Self::Bonus => "Bono",
            Self::Refund => "Reembolso",
        }
    }

    /// Whether the entry counts towards the lifetime "earned" total.
    #[must_use]
    pub const fn counts_as_earned(self) -> bool {
        matches!(self, Self::Earned | Self::Bonus)
    }
}

// =============================================================================
// Contact inbox
// =============================================================================

/// Contact message triage status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "babycash.message_status", rename_all = "snake_case")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatus {
    #[default]
    New,
    Read,
    Replied,
    Archived,
}

wire_names!(MessageStatus, "message status", {
    New => "NEW",
    Read => "READ",
    Replied => "REPLIED",
    Archived => "ARCHIVED",
});

// =============================================================================
// Audit
// =============================================================================

/// Auditable action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "babycash.audit_action", rename_all = "snake_case")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    // Authentication
    Login,
    Logout,
    LoginFailed,
    Register,
    TokenIssued,
    TokenRevoked,
    // Orders
    OrderCreated,
    OrderCancelled,
    OrderStatusChanged,
    // Payments
    PaymentCompleted,
    PaymentFailed,
    // Products
    ProductCreated,
    ProductUpdated,
    ProductDeleted,
    // Users
    PasswordChanged,
    UserUpdated,
    // Security
    SecurityEvent,
}

wire_names!(AuditAction, "audit action", {
    Login => "LOGIN",
    Logout => "LOGOUT",
    LoginFailed => "LOGIN_FAILED",
    Register => "REGISTER",
    TokenIssued => "TOKEN_ISSUED",
    TokenRevoked => "TOKEN_REVOKED",
    OrderCreated => "ORDER_CREATED",
    OrderCancelled => "ORDER_CANCELLED",
    OrderStatusChanged => "ORDER_STATUS_CHANGED",
    PaymentCompleted => "PAYMENT_COMPLETED",
    PaymentFailed => "PAYMENT_FAILED",
    ProductCreated => "PRODUCT_CREATED",
    ProductUpdated => "PRODUCT_UPDATED",
    ProductDeleted => "PRODUCT_DELETED",
    PasswordChanged => "PASSWORD_CHANGED",
    UserUpdated => "USER_UPDATED",
    SecurityEvent => "SECURITY_EVENT",
});

/// Outcome recorded with an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "babycash.audit_status", rename_all = "snake_case")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    #[default]
    Success,
    Failure,
    Warning,
}

wire_names!(AuditStatus, "audit status", {
    Success => "SUCCESS",
    Failure => "FAILURE",
    Warning => "WARNING",
});

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("toys".parse::<ProductCategory>().unwrap(), ProductCategory::Toys);
        assert_eq!(
            " Credit_Card ".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::CreditCard
        );
        assert_eq!("ADMIN".parse::<UserRole>().unwrap(), UserRole::Admin);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "GADGETS".parse::<ProductCategory>().unwrap_err();
        assert_eq!(err.to_string(), "invalid product category: GADGETS");
    }

    #[test]
    fn test_serde_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Mercadopago).unwrap(),
            "\"MERCADOPAGO\""
        );
        assert_eq!(
            serde_json::to_string(&AuditAction::OrderStatusChanged).unwrap(),
            "\"ORDER_STATUS_CHANGED\""
        );
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
    }

    #[test]
    fn test_order_status_rules() {
        assert!(OrderStatus::Pending.is_cancellable());
        assert!(!OrderStatus::Shipped.is_cancellable());
        assert!(OrderStatus::Shipped.awards_points_on(OrderStatus::Delivered));
        assert!(OrderStatus::Pending.awards_points_on(OrderStatus::Delivered));
        assert!(!OrderStatus::Delivered.awards_points_on(OrderStatus::Delivered));
        assert!(!OrderStatus::Processing.awards_points_on(OrderStatus::Shipped));
    }

    #[test]
    fn test_loyalty_display_names() {
        assert_eq!(LoyaltyTransactionType::Earned.display_name(), "Ganados");
        assert_eq!(LoyaltyTransactionType::Refund.display_name(), "Reembolso");
        assert!(LoyaltyTransactionType::Bonus.counts_as_earned());
        assert!(!LoyaltyTransactionType::Redeemed.counts_as_earned());
    }
}
