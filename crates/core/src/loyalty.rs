//! Loyalty programme rules.
//!
//! Customers earn one point per 1,000 (COP) of a delivered order. Points
//! stay spendable for twelve months. Lifetime earnings decide the tier, and
//! the spendable balance decides the discount a customer can claim.
//!
//! The ledger is append-only: earning inserts a positive row, redeeming a
//! negative `REDEEMED` row. When points expire the original row is
//! deactivated and an inactive negative `EXPIRED` row is written for the
//! history, so the balance is never reduced twice.

use chrono::{DateTime, Datelike, Duration, Months, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::types::LoyaltyTransactionType;

/// Order amount that earns one point.
pub const AMOUNT_PER_POINT: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);
/// How long earned points remain spendable.
pub const EXPIRY_MONTHS: u32 = 12;
/// Window used for the "expiring soon" figure.
pub const EXPIRING_SOON_DAYS: i64 = 30;
/// Lifetime earnings needed for [`LoyaltyTier::Silver`].
pub const SILVER_THRESHOLD: i64 = 1_000;
/// Lifetime earnings needed for [`LoyaltyTier::Gold`].
pub const GOLD_THRESHOLD: i64 = 5_000;
/// Balance needed per discount step.
pub const POINTS_PER_DISCOUNT_STEP: i64 = 1_000;
/// Discount granted per step.
pub const PERCENT_PER_DISCOUNT_STEP: i64 = 5;
/// Discount ceiling.
pub const MAX_DISCOUNT_PERCENT: i64 = 50;

/// Points earned for an order total. Fractions are dropped.
///
/// ```
/// use babycash_core::loyalty::points_for_amount;
/// use rust_decimal::Decimal;
///
/// assert_eq!(points_for_amount(Decimal::new(185_999, 0)), 185);
/// assert_eq!(points_for_amount(Decimal::new(999, 0)), 0);
/// ```
#[must_use]
pub fn points_for_amount(amount: Decimal) -> i32 {
    if amount <= Decimal::ZERO {
        return 0;
    }
    (amount / AMOUNT_PER_POINT)
        .floor()
        .to_i32()
        .unwrap_or(i32::MAX)
}

/// When points earned at `earned_at` stop being spendable.
#[must_use]
pub fn expiry_for(earned_at: DateTime<Utc>) -> DateTime<Utc> {
    earned_at
        .checked_add_months(Months::new(EXPIRY_MONTHS))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Membership tier, derived from lifetime earned points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoyaltyTier {
    Bronze,
    Silver,
    Gold,
}

impl LoyaltyTier {
    /// Tier for a lifetime earned total.
    #[must_use]
    pub const fn for_earned_total(earned: i64) -> Self {
        if earned >= GOLD_THRESHOLD {
            Self::Gold
        } else if earned >= SILVER_THRESHOLD {
            Self::Silver
        } else {
            Self::Bronze
        }
    }
}

/// Discount percentage unlocked by a spendable balance.
#[must_use]
pub fn discount_percent(balance: i64) -> i64 {
    if balance < POINTS_PER_DISCOUNT_STEP {
        return 0;
    }
    ((balance / POINTS_PER_DISCOUNT_STEP) * PERCENT_PER_DISCOUNT_STEP).min(MAX_DISCOUNT_PERCENT)
}

/// Points still needed to reach the next discount step, 0 once capped.
#[must_use]
pub fn points_for_next_discount(balance: i64) -> i64 {
    let cap = (MAX_DISCOUNT_PERCENT / PERCENT_PER_DISCOUNT_STEP) * POINTS_PER_DISCOUNT_STEP;
    if balance >= cap {
        return 0;
    }
    let balance = balance.max(0);
    let next_step = (balance / POINTS_PER_DISCOUNT_STEP + 1) * POINTS_PER_DISCOUNT_STEP;
    next_step - balance
}

/// The fields of a ledger row the summary needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub points: i32,
    pub kind: LoyaltyTransactionType,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Whether the entry contributes to the spendable balance at `now`.
    #[must_use]
    pub fn is_spendable(&self, now: DateTime<Utc>) -> bool {
        self.active && self.expires_at.is_none_or(|at| at > now)
    }

    /// Whether the entry's expiry date has passed at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Spendable balance at `now`, never below zero.
#[must_use]
pub fn balance(entries: &[LedgerEntry], now: DateTime<Utc>) -> i64 {
    entries
        .iter()
        .filter(|e| e.is_spendable(now))
        .map(|e| i64::from(e.points))
        .sum::<i64>()
        .max(0)
}

/// Points dashboard for one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltySummary {
    pub total_points: i64,
    pub earned_this_month: i64,
    pub earned_total: i64,
    pub redeemed_total: i64,
    pub expiring_soon: i64,
    pub tier: LoyaltyTier,
    pub member_since: String,
    pub available_discount_percent: i64,
    pub points_for_next_discount: i64,
}

impl LoyaltySummary {
    /// Compute the dashboard from a customer's full ledger.
    #[must_use]
    pub fn compute(entries: &[LedgerEntry], member_since: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let total_points = balance(entries, now);

        let earned = || entries.iter().filter(|e| e.kind.counts_as_earned());
        let earned_total: i64 = earned().map(|e| i64::from(e.points)).sum();
        let earned_this_month: i64 = earned()
            .filter(|e| e.created_at.year() == now.year() && e.created_at.month() == now.month())
            .map(|e| i64::from(e.points))
            .sum();

        let redeemed_total: i64 = entries
            .iter()
            .filter(|e| e.kind == LoyaltyTransactionType::Redeemed)
            .map(|e| i64::from(e.points).abs())
            .sum();

        let soon = now + Duration::days(EXPIRING_SOON_DAYS);
        let expiring_soon: i64 = entries
            .iter()
            .filter(|e| e.active && e.expires_at.is_some_and(|at| at > now && at < soon))
            .map(|e| i64::from(e.points))
            .sum();

        Self {
            total_points,
            earned_this_month,
            earned_total,
            redeemed_total,
            expiring_soon,
            tier: LoyaltyTier::for_earned_total(earned_total),
            member_since: member_since.year().to_string(),
            available_discount_percent: discount_percent(total_points),
            points_for_next_discount: points_for_next_discount(total_points),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn earned(points: i32, created_at: DateTime<Utc>) -> LedgerEntry {
        LedgerEntry {
            points,
            kind: LoyaltyTransactionType::Earned,
            active: true,
            expires_at: Some(expiry_for(created_at)),
            created_at,
        }
    }

    #[test]
    fn test_points_for_amount() {
        assert_eq!(points_for_amount(Decimal::ZERO), 0);
        assert_eq!(points_for_amount(Decimal::new(-5000, 0)), 0);
        assert_eq!(points_for_amount(Decimal::new(1000, 0)), 1);
        assert_eq!(points_for_amount(Decimal::new(45_000, 0)), 45);
        assert_eq!(points_for_amount(Decimal::new(1_999_99, 2)), 1);
    }

    #[test]
    fn test_expiry_is_twelve_months_later() {
        assert_eq!(expiry_for(at(2025, 3, 15)), at(2026, 3, 15));
    }

    #[test]
    fn test_tiers() {
        assert_eq!(LoyaltyTier::for_earned_total(0), LoyaltyTier::Bronze);
        assert_eq!(LoyaltyTier::for_earned_total(999), LoyaltyTier::Bronze);
        assert_eq!(LoyaltyTier::for_earned_total(1000), LoyaltyTier::Silver);
        assert_eq!(LoyaltyTier::for_earned_total(4999), LoyaltyTier::Silver);
        assert_eq!(LoyaltyTier::for_earned_total(5000), LoyaltyTier::Gold);
    }

    #[test]
    fn test_discount_percent() {
        assert_eq!(discount_percent(999), 0);
        assert_eq!(discount_percent(1000), 5);
        assert_eq!(discount_percent(3500), 15);
        assert_eq!(discount_percent(10_000), 50);
        assert_eq!(discount_percent(25_000), 50);
    }

    #[test]
    fn test_points_for_next_discount() {
        assert_eq!(points_for_next_discount(0), 1000);
        assert_eq!(points_for_next_discount(250), 750);
        assert_eq!(points_for_next_discount(1000), 1000);
        assert_eq!(points_for_next_discount(9_999), 1);
        assert_eq!(points_for_next_discount(10_000), 0);
    }

    #[test]
    fn test_summary() {
        let now = at(2026, 6, 20);
        let entries = vec![
            earned(800, at(2026, 6, 2)),
            // Expires 2026-07-01, inside the 30 day window
            earned(400, at(2025, 7, 1)),
            // Already past its expiry and deactivated by the job
            LedgerEntry {
                active: false,
                ..earned(300, at(2025, 1, 10))
            },
            LedgerEntry {
                points: -300,
                kind: LoyaltyTransactionType::Expired,
                active: false,
                expires_at: None,
                created_at: at(2026, 1, 11),
            },
            LedgerEntry {
                points: -200,
                kind: LoyaltyTransactionType::Redeemed,
                active: true,
                expires_at: None,
                created_at: at(2026, 6, 10),
            },
        ];

        let summary = LoyaltySummary::compute(&entries, at(2024, 2, 1), now);
        assert_eq!(summary.total_points, 1000);
        assert_eq!(summary.earned_total, 1500);
        assert_eq!(summary.earned_this_month, 800);
        assert_eq!(summary.redeemed_total, 200);
        assert_eq!(summary.expiring_soon, 400);
        assert_eq!(summary.tier, LoyaltyTier::Silver);
        assert_eq!(summary.member_since, "2024");
        assert_eq!(summary.available_discount_percent, 5);
        assert_eq!(summary.points_for_next_discount, 1000);
    }

    #[test]
    fn test_balance_never_negative() {
        let now = at(2026, 1, 1);
        let entries = vec![LedgerEntry {
            points: -50,
            kind: LoyaltyTransactionType::Redeemed,
            active: true,
            expires_at: None,
            created_at: now,
        }];
        assert_eq!(balance(&entries, now), 0);
    }
}
