//! # Domain Types
//!
//! Catalog, address and order types used throughout Bazaar.
//! Promotion types live in [`crate::promotion`], bill types in [`crate::bill`].
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │   OrderItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  order_id (FK)  │       │
//! │  │  name           │   │  order_number   │   │  variant_id     │       │
//! │  └────────┬────────┘   │  user/address   │   │  *_snapshot     │       │
//! │           │ 1..n       │  amounts        │   │  unit_price     │       │
//! │  ┌────────▼────────┐   │  status         │   │  line_total     │       │
//! │  │ ProductVariant  │   └─────────────────┘   └─────────────────┘       │
//! │  │  sku, price     │                                                    │
//! │  │  stock >= 0     │   ┌─────────────────┐                              │
//! │  │  attributes     │   │  OrderStatus    │  PENDING ─► SHIPPED          │
//! │  └─────────────────┘   │  state machine  │     │          │             │
//! │                        └─────────────────┘     ▼          ▼             │
//! │                                            CANCELLED   COMPLETED        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

/// Open key/value variant attributes (size, color, ...).
///
/// Ordered so serialized snapshots are byte-stable.
pub type Attributes = BTreeMap<String, String>;

// =============================================================================
// Catalog
// =============================================================================

/// A product: the catalog entry that owns variants and joins events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Soft-delete flag.
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A purchasable SKU-level unit of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductVariant {
    pub id: i64,
    pub product_id: i64,
    /// Stock Keeping Unit - unique business identifier.
    pub sku: String,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub attributes: Attributes,
    /// Current unit price in cents.
    pub price_cents: i64,
    /// Units on hand. Never negative.
    pub stock: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl ProductVariant {
    /// Returns the current unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// A variant joined with the display name of its owning product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VariantListing {
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub variant: ProductVariant,
    pub product_name: String,
}

/// Input for adding a variant to a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewVariant {
    pub product_id: i64,
    pub sku: String,
    #[serde(default)]
    pub attributes: Attributes,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: i64,
}

/// Result of an administrative restock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockAdjustment {
    pub variant_id: i64,
    pub sku: String,
    pub previous_stock: i64,
    pub new_stock: i64,
}

// =============================================================================
// Identity
// =============================================================================

/// Role carried by an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Role {
    Customer,
    Admin,
}

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub role: Role,
}

impl Actor {
    pub fn customer(user_id: i64) -> Self {
        Actor {
            user_id,
            role: Role::Customer,
        }
    }

    pub fn admin(user_id: i64) -> Self {
        Actor {
            user_id,
            role: Role::Admin,
        }
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// =============================================================================
// Address
// =============================================================================

/// A delivery address owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Address {
    pub id: i64,
    pub user_id: i64,
    pub recipient: String,
    pub line1: String,
    pub city: String,
    pub postal_code: String,
    /// Tombstone. Deleted addresses are filtered out of every lookup.
    pub is_deleted: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Input for saving a new address.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewAddress {
    pub recipient: String,
    pub line1: String,
    pub city: String,
    pub postal_code: String,
}

impl Address {
    /// Checks that `user_id` owns this address.
    pub fn ensure_owned_by(&self, user_id: i64) -> CoreResult<()> {
        if self.user_id != user_id {
            return Err(CoreError::forbidden(format!(
                "address {} does not belong to user {}",
                self.id, user_id
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
///
/// ## Allowed Transitions
/// ```text
/// PENDING ──► SHIPPED ──► COMPLETED
///    │
///    └──────► CANCELLED
/// ```
/// Every other pair, including a status to itself, is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum OrderStatus {
    /// Placed and paid for; stock already taken.
    Pending,
    /// Handed to the carrier.
    Shipped,
    /// Delivered.
    Completed,
    /// Cancelled before shipping; stock returned.
    Cancelled,
}

impl OrderStatus {
    /// Whether the state machine allows `self -> next`.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Shipped) | (Shipped, Completed) | (Pending, Cancelled)
        )
    }

    /// Validates `self -> next`, returning `next` on success.
    pub fn transition_to(self, next: OrderStatus) -> CoreResult<OrderStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidStatusTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

// =============================================================================
// Order
// =============================================================================

/// A committed order. Monetary fields are immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Order {
    pub id: i64,
    /// Human-readable unique number, e.g. `ORD-20261016-9F2C41AB`.
    pub order_number: String,
    pub user_id: i64,
    pub address_id: i64,
    pub original_amount_cents: i64,
    pub discount_amount_cents: i64,
    pub delivery_fee_cents: i64,
    pub total_amount_cents: i64,
    pub status: OrderStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }
}

/// A line of a committed order.
///
/// Uses the snapshot pattern: SKU, product name and attributes are frozen
/// at commit time, so editing the variant later never rewrites history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub variant_id: i64,
    pub sku_snapshot: String,
    pub product_name_snapshot: String,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub attributes_snapshot: Attributes,
    pub quantity: i64,
    /// Catalog price per unit at commit time.
    pub original_unit_price_cents: i64,
    /// Discounted price per unit actually charged (rounded down).
    pub unit_price_cents: i64,
    /// Discount taken off this line.
    pub discount_cents: i64,
    /// Amount charged for this line. Authoritative over `unit_price × qty`.
    pub line_total_cents: i64,
}

/// An order together with its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderDetails {
    /// Checks that `actor` may read this order.
    pub fn ensure_visible_to(&self, actor: &Actor) -> CoreResult<()> {
        if actor.is_admin() || self.order.user_id == actor.user_id {
            Ok(())
        } else {
            Err(CoreError::forbidden(format!(
                "order {} does not belong to user {}",
                self.order.id, actor.user_id
            )))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_transitions() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Cancelled));
    }

    #[test]
    fn test_rejected_transitions() {
        use OrderStatus::*;
        for (from, to) in [
            (Shipped, Pending),
            (Completed, Shipped),
            (Completed, Pending),
            (Cancelled, Pending),
            (Shipped, Cancelled),
            (Pending, Completed),
            (Pending, Pending),
        ] {
            let err = from.transition_to(to).unwrap_err();
            assert!(matches!(err, CoreError::InvalidStatusTransition { .. }));
        }
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&OrderStatus::Pending).unwrap();
        assert_eq!(json, "\"PENDING\"");
    }

    #[test]
    fn test_address_ownership() {
        let address = Address {
            id: 7,
            user_id: 1,
            recipient: "Ada".to_string(),
            line1: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            postal_code: "12345".to_string(),
            is_deleted: false,
            created_at: Utc::now(),
        };
        assert!(address.ensure_owned_by(1).is_ok());
        assert!(matches!(
            address.ensure_owned_by(2),
            Err(CoreError::Forbidden { .. })
        ));
    }
}
