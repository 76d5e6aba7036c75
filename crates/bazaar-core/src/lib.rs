//! # bazaar-core: Pure Pricing Logic for Bazaar
//!
//! The pricing engine of the Bazaar commerce backend. Everything here is a
//! pure function of its inputs: no database, no network, no clock.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bazaar Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  │    /api/orders/bill, /api/orders, /api/admin/...               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    bazaar-db (Database Layer)                   │   │
//! │  │      repositories, stock ledger, checkout transaction           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bazaar-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │ promotion │  │   bill    │  │   types   │  │   │
//! │  │   │   Money   │  │ Discount  │  │   Bill    │  │   Order   │  │   │
//! │  │   │  floor %  │  │ selection │  │ BillLine  │  │  status   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic
//! - [`promotion`] - Events, discount rules, best-discount selection
//! - [`bill`] - Line pricing and bill aggregation
//! - [`types`] - Catalog, address and order types, order state machine
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use bazaar_core::money::Money;
//! use bazaar_core::promotion::{DiscountRule, DiscountType};
//!
//! let rule = DiscountRule {
//!     discount_type: DiscountType::Percentage,
//!     value: 20,
//!     min_purchase_amount: Some(Money::from_cents(500)),
//!     max_discount_amount: Some(Money::from_cents(150)),
//! };
//!
//! // 2 × $10.00 at 20% off is $4.00, capped at $1.50
//! let line_total = Money::from_cents(1000).checked_multiply_quantity(2).unwrap();
//! assert_eq!(rule.amount_for(line_total).cents(), 150);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bill;
pub mod error;
pub mod money;
pub mod promotion;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use bill::{Bill, BillLine, CartLine, PricingPolicy};
pub use error::{CoreError, CoreResult, StockShortfall, ValidationError};
pub use money::Money;
pub use promotion::{
    Discount, DiscountInfo, DiscountRule, DiscountType, Event, EventDetails, EventStatus,
    NewDiscount, NewEvent,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity on a single cart line.
///
/// Catches accidental over-ordering (1000 typed instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest catalog price accepted for a variant (10 billion in major units).
///
/// Keeps every bill of at most MAX_CART_LINES × MAX_ITEM_QUANTITY units far
/// inside i64.
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000_000;

/// Largest quantity a single restock may add.
pub const MAX_RESTOCK_QUANTITY: i64 = 1_000_000;

/// Flat delivery fee charged when no other policy is configured.
pub const DEFAULT_DELIVERY_FEE_CENTS: i64 = 500;
