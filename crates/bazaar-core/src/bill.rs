//! # Bill Calculation
//!
//! Turns priced cart lines into a bill. Pure: the caller loads variants and
//! discount candidates, this module only does arithmetic.
//!
//! ## Pricing Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CartLine { variant_id, quantity }                                      │
//! │       │  (caller loads VariantListing + running discounts)              │
//! │       ▼                                                                 │
//! │  price_line()                                                           │
//! │       line_total    = price × quantity                                  │
//! │       line_discount = best candidate for line_total (0 if none)         │
//! │       final         = line_total − line_discount                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Bill::assemble()                                                       │
//! │       subtotal = Σ line_total                                           │
//! │       discount = Σ line_discount                                        │
//! │       total    = subtotal − discount + delivery_fee                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The preview endpoint and the order commit both go through these two
//! functions, so a preview and the order placed from it agree to the cent
//! whenever prices and events did not change in between.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::promotion::{select_best_discount, DiscountInfo};
use crate::types::{Attributes, VariantListing};
use crate::DEFAULT_DELIVERY_FEE_CENTS;

// =============================================================================
// Inputs
// =============================================================================

/// One (variant, quantity) pair of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    pub variant_id: i64,
    pub quantity: i64,
}

/// Store-wide pricing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    /// Flat fee added once per order, regardless of items or discounts.
    pub delivery_fee: Money,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        PricingPolicy {
            delivery_fee: Money::from_cents(DEFAULT_DELIVERY_FEE_CENTS),
        }
    }
}

// =============================================================================
// Bill Line
// =============================================================================

/// A priced cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BillLine {
    pub variant_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub sku: String,
    pub attributes: Attributes,
    pub quantity: i64,
    /// Discounted price per unit, rounded down. Display only.
    pub unit_price: Money,
    /// Catalog price per unit.
    pub original_unit_price: Money,
    /// Amount charged for the line (line total minus discount).
    pub total_price: Money,
    /// Catalog price × quantity.
    pub original_total: Money,
    pub discount_amount: Money,
    /// The discount that produced `discount_amount`, if any.
    pub applied_discount: Option<DiscountInfo>,
}

/// Prices one line against its discount candidates.
///
/// Uses the variant's current price. Fails only if `price × quantity`
/// does not fit in an i64.
pub fn price_line(
    listing: &VariantListing,
    quantity: i64,
    candidates: &[DiscountInfo],
) -> CoreResult<BillLine> {
    let variant = &listing.variant;
    let unit = variant.price();
    let line_total =
        unit.checked_multiply_quantity(quantity)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "line total".to_string(),
                min: 0,
                max: i64::MAX,
            })?;

    let (applied_discount, discount_amount) = match select_best_discount(candidates, line_total) {
        Some((info, amount)) => (Some(info), amount),
        None => (None, Money::zero()),
    };
    let total_price = line_total - discount_amount;

    Ok(BillLine {
        variant_id: variant.id,
        product_id: variant.product_id,
        product_name: listing.product_name.clone(),
        sku: variant.sku.clone(),
        attributes: variant.attributes.clone(),
        quantity,
        unit_price: total_price.per_unit_floor(quantity),
        original_unit_price: unit,
        total_price,
        original_total: line_total,
        discount_amount,
        applied_discount,
    })
}

// =============================================================================
// Bill
// =============================================================================

/// The computed price of a prospective order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Bill {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub delivery_fee: Money,
    pub total_amount: Money,
    pub items: Vec<BillLine>,
}

impl Bill {
    /// Sums priced lines into a bill.
    ///
    /// `total_amount >= delivery_fee` always holds because every line
    /// discount is clamped to its line total.
    ///
    /// ## Errors
    /// `OutOfRange` if a sum does not fit in an i64. Catalog prices are
    /// bounded, so this only fires for lines priced outside the catalog.
    pub fn assemble(items: Vec<BillLine>, policy: &PricingPolicy) -> CoreResult<Bill> {
        let overflow = |field: &str| ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        };

        let subtotal = Money::checked_sum(items.iter().map(|l| l.original_total))
            .ok_or_else(|| overflow("subtotal"))?;
        let discount_amount = Money::checked_sum(items.iter().map(|l| l.discount_amount))
            .ok_or_else(|| overflow("discount"))?;
        let delivery_fee = policy.delivery_fee;
        let total_amount = subtotal
            .checked_sub(discount_amount)
            .and_then(|net| net.checked_add(delivery_fee))
            .ok_or_else(|| overflow("total"))?;

        Ok(Bill {
            subtotal,
            discount_amount,
            delivery_fee,
            total_amount,
            items,
        })
    }

    /// Total quantity across all lines.
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|l| l.quantity).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
