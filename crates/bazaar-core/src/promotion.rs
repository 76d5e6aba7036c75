//! # Promotions
//!
//! Events, their discount rules, and the discount math shared by the bill
//! preview and the order commit.
//!
//! ## Eligibility
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Event "Summer Sale"  status=ACTIVE  [2026-06-01 .. 2026-06-30]         │
//! │     ├── products: {12, 14, 19}                                          │
//! │     └── discounts: [20% min 500 max 150, 300 off]                       │
//! │                                                                         │
//! │  running(at)  ⇔  status == ACTIVE  ∧  start <= at <= end (inclusive)    │
//! │                                                                         │
//! │  Line for product 14, line total 2000, at = 2026-06-10:                 │
//! │     20%  → min(400, 150)        = 150                                   │
//! │     300  → min(300, 2000)       = 300   ◄── best for the customer       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Selection Rule
//! Largest discount amount for the line wins. Equal amounts fall back to
//! the lowest event id, then the lowest discount id, so the choice never
//! depends on row order. A best amount of zero means no discount.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Event
// =============================================================================

/// Lifecycle status of a promotional event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum EventStatus {
    Scheduled,
    Active,
    Inactive,
    Expired,
}

impl Default for EventStatus {
    fn default() -> Self {
        EventStatus::Scheduled
    }
}

/// A time-bounded promotional campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Event {
    pub id: i64,
    /// Unique across all events.
    pub name: String,
    #[ts(as = "String")]
    pub start_date: DateTime<Utc>,
    /// Inclusive.
    #[ts(as = "String")]
    pub end_date: DateTime<Utc>,
    pub status: EventStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Whether the event applies at `at`: ACTIVE and inside `[start, end]`.
    pub fn is_running(&self, at: DateTime<Utc>) -> bool {
        self.status == EventStatus::Active && self.start_date <= at && at <= self.end_date
    }
}

/// Input for creating an event.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewEvent {
    pub name: String,
    #[ts(as = "String")]
    pub start_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub status: EventStatus,
}

// =============================================================================
// Discount
// =============================================================================

/// How a discount's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum DiscountType {
    /// `value` is a percentage, 1-100.
    Percentage,
    /// `value` is an amount in cents.
    FixedAmount,
}

/// The pricing parameters of a discount, independent of storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DiscountRule {
    pub discount_type: DiscountType,
    pub value: i64,
    /// Minimum line total (unit price × quantity) for the rule to apply.
    pub min_purchase_amount: Option<Money>,
    /// Cap on a PERCENTAGE discount. Ignored for FIXED_AMOUNT.
    pub max_discount_amount: Option<Money>,
}

impl DiscountRule {
    /// Discount amount this rule takes off `line_total`.
    ///
    /// ```text
    /// line_total < min_purchase          → 0
    /// PERCENTAGE   floor(total × v / 100), capped by max_discount
    /// FIXED_AMOUNT v
    /// result clamped to [0, line_total]
    /// ```
    ///
    /// ## Example
    /// ```rust
    /// use bazaar_core::money::Money;
    /// use bazaar_core::promotion::{DiscountRule, DiscountType};
    ///
    /// let rule = DiscountRule {
    ///     discount_type: DiscountType::Percentage,
    ///     value: 20,
    ///     min_purchase_amount: Some(Money::from_cents(500)),
    ///     max_discount_amount: Some(Money::from_cents(150)),
    /// };
    /// assert_eq!(rule.amount_for(Money::from_cents(2000)).cents(), 150);
    /// assert_eq!(rule.amount_for(Money::from_cents(400)).cents(), 0);
    /// ```
    pub fn amount_for(&self, line_total: Money) -> Money {
        if !line_total.is_positive() {
            return Money::zero();
        }

        if let Some(min) = self.min_purchase_amount {
            if line_total < min {
                return Money::zero();
            }
        }

        let amount = match self.discount_type {
            DiscountType::Percentage => {
                let raw = line_total.percent_floor(self.value);
                match self.max_discount_amount {
                    Some(cap) => raw.min(cap),
                    None => raw,
                }
            }
            DiscountType::FixedAmount => Money::from_cents(self.value),
        };

        amount.max(Money::zero()).min(line_total)
    }
}

/// A discount rule as stored: owned by exactly one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Discount {
    pub id: i64,
    pub event_id: i64,
    pub discount_type: DiscountType,
    pub value: i64,
    pub min_purchase_cents: Option<i64>,
    pub max_discount_cents: Option<i64>,
}

impl Discount {
    pub fn rule(&self) -> DiscountRule {
        DiscountRule {
            discount_type: self.discount_type,
            value: self.value,
            min_purchase_amount: self.min_purchase_cents.map(Money::from_cents),
            max_discount_amount: self.max_discount_cents.map(Money::from_cents),
        }
    }
}

/// Input for adding a discount to an event.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewDiscount {
    pub discount_type: DiscountType,
    pub value: i64,
    pub min_purchase_amount: Option<i64>,
    pub max_discount_amount: Option<i64>,
}

// =============================================================================
// Resolution
// =============================================================================

/// An event loaded with its discounts and product associations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct EventDetails {
    #[serde(flatten)]
    pub event: Event,
    pub discounts: Vec<Discount>,
    pub product_ids: Vec<i64>,
}

impl EventDetails {
    pub fn applies_to(&self, product_id: i64) -> bool {
        self.product_ids.contains(&product_id)
    }
}

/// A candidate discount with enough event context to explain it to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DiscountInfo {
    pub discount_id: i64,
    pub event_id: i64,
    pub event_name: String,
    #[ts(as = "String")]
    pub event_start: DateTime<Utc>,
    #[ts(as = "String")]
    pub event_end: DateTime<Utc>,
    #[serde(flatten)]
    pub rule: DiscountRule,
}

impl DiscountInfo {
    pub fn new(event: &Event, discount: &Discount) -> Self {
        DiscountInfo {
            discount_id: discount.id,
            event_id: event.id,
            event_name: event.name.clone(),
            event_start: event.start_date,
            event_end: event.end_date,
            rule: discount.rule(),
        }
    }
}

/// Flattens every discount of every event running at `at` that contains
/// `product_id` into candidates.
pub fn running_discounts(
    events: &[EventDetails],
    product_id: i64,
    at: DateTime<Utc>,
) -> Vec<DiscountInfo> {
    events
        .iter()
        .filter(|e| e.event.is_running(at) && e.applies_to(product_id))
        .flat_map(|e| e.discounts.iter().map(|d| DiscountInfo::new(&e.event, d)))
        .collect()
}

/// Picks the candidate giving the largest discount on `line_total`.
///
/// Returns the winner with its amount, or `None` if no candidate takes
/// anything off the line.
pub fn select_best_discount(
    candidates: &[DiscountInfo],
    line_total: Money,
) -> Option<(DiscountInfo, Money)> {
    candidates
        .iter()
        .map(|c| (c, c.rule.amount_for(line_total)))
        .filter(|(_, amount)| amount.is_positive())
        .max_by_key(|(c, amount)| (*amount, Reverse(c.event_id), Reverse(c.discount_id)))
        .map(|(c, amount)| (c.clone(), amount))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn pct(value: i64, min: Option<i64>, max: Option<i64>) -> DiscountRule {
        DiscountRule {
            discount_type: DiscountType::Percentage,
            value,
            min_purchase_amount: min.map(Money::from_cents),
            max_discount_amount: max.map(Money::from_cents),
        }
    }

    fn fixed(value: i64) -> DiscountRule {
        DiscountRule {
            discount_type: DiscountType::FixedAmount,
            value,
            min_purchase_amount: None,
            max_discount_amount: None,
        }
    }

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, day, 12, 0, 0).unwrap()
    }

    fn event(id: i64, status: EventStatus) -> Event {
        Event {
            id,
            name: format!("event-{id}"),
            start_date: ts(1),
            end_date: ts(30),
            status,
            created_at: ts(1),
        }
    }

    fn details(id: i64, status: EventStatus, products: Vec<i64>, rules: Vec<DiscountRule>) -> EventDetails {
        let discounts = rules
            .into_iter()
            .enumerate()
            .map(|(i, r)| Discount {
                id: id * 100 + i as i64,
                event_id: id,
                discount_type: r.discount_type,
                value: r.value,
                min_purchase_cents: r.min_purchase_amount.map(|m| m.cents()),
                max_discount_cents: r.max_discount_amount.map(|m| m.cents()),
            })
            .collect();
        EventDetails {
            event: event(id, status),
            discounts,
            product_ids: products,
        }
    }

    #[test]
    fn test_percentage_capped_by_max() {
        // price 1000 × 2, 20% → 400, capped at 150
        let rule = pct(20, Some(500), Some(150));
        assert_eq!(rule.amount_for(Money::from_cents(2000)).cents(), 150);
    }

    #[test]
    fn test_percentage_single_unit_still_capped() {
        let rule = pct(20, Some(500), Some(150));
        assert_eq!(rule.amount_for(Money::from_cents(1000)).cents(), 150);
    }

    #[test]
    fn test_below_min_purchase_gives_nothing() {
        let rule = pct(20, Some(500), Some(150));
        assert_eq!(rule.amount_for(Money::from_cents(499)).cents(), 0);
        // boundary is inclusive
        assert_eq!(rule.amount_for(Money::from_cents(500)).cents(), 100);
    }

    #[test]
    fn test_fixed_amount_never_exceeds_line() {
        assert_eq!(fixed(300).amount_for(Money::from_cents(200)).cents(), 200);
        assert_eq!(fixed(300).amount_for(Money::from_cents(1000)).cents(), 300);
    }

    #[test]
    fn test_max_ignored_for_fixed_amount() {
        let mut rule = fixed(300);
        rule.max_discount_amount = Some(Money::from_cents(100));
        assert_eq!(rule.amount_for(Money::from_cents(1000)).cents(), 300);
    }

    #[test]
    fn test_percentage_floors() {
        assert_eq!(pct(15, None, None).amount_for(Money::from_cents(999)).cents(), 149);
    }

    #[test]
    fn test_event_window_is_inclusive() {
        let e = event(1, EventStatus::Active);
        assert!(e.is_running(ts(1)));
        assert!(e.is_running(ts(30)));
        assert!(!e.is_running(ts(1) - chrono::Duration::seconds(1)));
        assert!(!e.is_running(ts(30) + chrono::Duration::seconds(1)));
    }

    #[test]
    fn test_only_active_events_run() {
        for status in [EventStatus::Scheduled, EventStatus::Inactive, EventStatus::Expired] {
            assert!(!event(1, status).is_running(ts(10)));
        }
    }

    #[test]
    fn test_running_discounts_filters_product_and_status() {
        let events = vec![
            details(1, EventStatus::Active, vec![10], vec![pct(10, None, None)]),
            details(2, EventStatus::Inactive, vec![10], vec![pct(50, None, None)]),
            details(3, EventStatus::Active, vec![11], vec![pct(50, None, None)]),
        ];
        let candidates = running_discounts(&events, 10, ts(10));
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].event_id, 1);
    }

    #[test]
    fn test_best_discount_maximizes_amount() {
        let events = vec![
            details(1, EventStatus::Active, vec![10], vec![pct(20, Some(500), Some(150))]),
            details(2, EventStatus::Active, vec![10], vec![fixed(300)]),
        ];
        let candidates = running_discounts(&events, 10, ts(10));
        let (best, amount) = select_best_discount(&candidates, Money::from_cents(2000)).unwrap();
        assert_eq!(best.event_id, 2);
        assert_eq!(amount.cents(), 300);
    }

    #[test]
    fn test_best_discount_tie_breaks_on_lowest_event_id() {
        let events = vec![
            details(7, EventStatus::Active, vec![10], vec![fixed(100)]),
            details(3, EventStatus::Active, vec![10], vec![fixed(100)]),
            details(5, EventStatus::Active, vec![10], vec![fixed(100)]),
        ];
        let candidates = running_discounts(&events, 10, ts(10));
        let (best, _) = select_best_discount(&candidates, Money::from_cents(1000)).unwrap();
        assert_eq!(best.event_id, 3);
    }

    #[test]
    fn test_best_discount_tie_breaks_on_lowest_discount_id() {
        let events = vec![details(
            4,
            EventStatus::Active,
            vec![10],
            vec![fixed(100), fixed(100)],
        )];
        let candidates = running_discounts(&events, 10, ts(10));
        let (best, _) = select_best_discount(&candidates, Money::from_cents(1000)).unwrap();
        assert_eq!(best.discount_id, 400);
    }

    #[test]
    fn test_no_discount_when_every_candidate_is_zero() {
        let events = vec![details(
            1,
            EventStatus::Active,
            vec![10],
            vec![pct(20, Some(5000), None)],
        )];
        let candidates = running_discounts(&events, 10, ts(10));
        assert!(select_best_discount(&candidates, Money::from_cents(1000)).is_none());
    }

    fn arb_rule() -> impl Strategy<Value = DiscountRule> {
        (
            any::<bool>(),
            1i64..=100,
            1i64..=1_000_000,
            proptest::option::of(0i64..=1_000_000),
            proptest::option::of(1i64..=1_000_000),
        )
            .prop_map(|(is_pct, p, amount, min, max)| DiscountRule {
                discount_type: if is_pct {
                    DiscountType::Percentage
                } else {
                    DiscountType::FixedAmount
                },
                value: if is_pct { p } else { amount },
                min_purchase_amount: min.map(Money::from_cents),
                max_discount_amount: max.map(Money::from_cents),
            })
    }

    proptest! {
        #[test]
        fn prop_discount_never_exceeds_line(rule in arb_rule(), line in 0i64..=10_000_000) {
            let line_total = Money::from_cents(line);
            let amount = rule.amount_for(line_total);
            prop_assert!(amount >= Money::zero());
            prop_assert!(amount <= line_total);
        }
    }
}
