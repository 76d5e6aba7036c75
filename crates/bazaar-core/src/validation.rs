//! # Validation Module
//!
//! Input validation for carts, catalog entries and promotions.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP (apps/api)                                              │
//! │  └── Type validation (JSON deserialization)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Business rule validation                                          │
//! │  └── Runs before any transaction starts                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0), CHECK (price_cents >= 0)                      │
//! │  ├── UNIQUE (sku), UNIQUE (event name), UNIQUE (order number)          │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bazaar_core::validation::{validate_sku, validate_quantity};
//!
//! validate_sku("TEE-RED-M").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::bill::CartLine;
use crate::error::ValidationError;
use crate::promotion::{DiscountType, NewDiscount};
use crate::{MAX_CART_LINES, MAX_ITEM_QUANTITY, MAX_PRICE_CENTS, MAX_RESTOCK_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use bazaar_core::validation::validate_sku;
///
/// assert!(validate_sku("TEE-RED-M").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("A".repeat(100).as_str()).is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name: non-empty, at most 200 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_text("name", name, 200)
}

/// Validates an event name: non-empty, at most 100 characters.
pub fn validate_event_name(name: &str) -> ValidationResult<()> {
    validate_text("event name", name, 100)
}

fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a quantity moved in or out of stock outside a cart.
pub fn validate_positive_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a restock quantity.
///
/// ## Rules
/// - Must be positive
/// - Must not exceed MAX_RESTOCK_QUANTITY
pub fn validate_restock_quantity(qty: i64) -> ValidationResult<()> {
    validate_positive_quantity(qty)?;
    if qty > MAX_RESTOCK_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_RESTOCK_QUANTITY,
        });
    }
    Ok(())
}

/// Validates a price in cents.
///
/// ## Example
/// ```rust
/// use bazaar_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());     // free item
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(i64::MAX).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

// =============================================================================
// Cart Validators
// =============================================================================

/// Validates a whole cart before it is priced or committed.
///
/// ## Rules
/// - At least one line, at most MAX_CART_LINES (100)
/// - Every quantity passes [`validate_quantity`]
/// - A variant appears on at most one line
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  POST /api/orders/bill  { addressId, items: [...] }                     │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_cart(items) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── []?               → "items must not be empty"                 │
/// │       ├── quantity <= 0?    → "quantity must be positive"               │
/// │       ├── same variant ×2?  → "items contains duplicate value: 7"      │
/// │       │                                                                 │
/// │       └── OK → load variants, price lines                              │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_cart(lines: &[CartLine]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::Empty {
            field: "items".to_string(),
        });
    }

    if lines.len() > MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_CART_LINES as i64,
        });
    }

    let mut seen = HashSet::with_capacity(lines.len());
    for line in lines {
        validate_quantity(line.quantity)?;
        if !seen.insert(line.variant_id) {
            return Err(ValidationError::Duplicate {
                field: "items".to_string(),
                value: line.variant_id.to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Promotion Validators
// =============================================================================

/// Validates an event window. Both bounds are inclusive, so `start == end`
/// is a one-instant event and allowed.
pub fn validate_event_window(start: DateTime<Utc>, end: DateTime<Utc>) -> ValidationResult<()> {
    if start > end {
        return Err(ValidationError::InvalidFormat {
            field: "event window".to_string(),
            reason: "start date must not be after end date".to_string(),
        });
    }
    Ok(())
}

/// Validates a discount configuration.
///
/// ## Rules
/// | Field               | PERCENTAGE        | FIXED_AMOUNT |
/// |---------------------|-------------------|--------------|
/// | value               | 1..=100           | > 0          |
/// | minPurchaseAmount   | >= 0 or absent    | >= 0 or absent |
/// | maxDiscountAmount   | > 0 or absent     | must be absent |
pub fn validate_discount(discount: &NewDiscount) -> ValidationResult<()> {
    match discount.discount_type {
        DiscountType::Percentage => {
            if !(1..=100).contains(&discount.value) {
                return Err(ValidationError::OutOfRange {
                    field: "value".to_string(),
                    min: 1,
                    max: 100,
                });
            }
        }
        DiscountType::FixedAmount => {
            if discount.value <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "value".to_string(),
                });
            }
            if discount.max_discount_amount.is_some() {
                return Err(ValidationError::InvalidFormat {
                    field: "maxDiscountAmount".to_string(),
                    reason: "only applies to PERCENTAGE discounts".to_string(),
                });
            }
        }
    }

    if let Some(min) = discount.min_purchase_amount {
        if min < 0 {
            return Err(ValidationError::OutOfRange {
                field: "minPurchaseAmount".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
    }

    if let Some(max) = discount.max_discount_amount {
        if max <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "maxDiscountAmount".to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn line(variant_id: i64, quantity: i64) -> CartLine {
        CartLine {
            variant_id,
            quantity,
        }
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("TEE-RED-M").is_ok());
        assert!(validate_sku("mug_01").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_event_name() {
        assert!(validate_event_name("Summer Sale").is_ok());
        assert!(validate_event_name("  ").is_err());
        assert!(validate_event_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_cart() {
        assert!(validate_cart(&[line(1, 2), line(2, 1)]).is_ok());

        assert!(matches!(
            validate_cart(&[]),
            Err(ValidationError::Empty { .. })
        ));
        assert!(matches!(
            validate_cart(&[line(1, 0)]),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            validate_cart(&[line(1, 1), line(1, 3)]),
            Err(ValidationError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_cart_line_limit() {
        let lines: Vec<CartLine> = (0..=MAX_CART_LINES as i64).map(|i| line(i, 1)).collect();
        assert!(validate_cart(&lines).is_err());
        assert!(validate_cart(&lines[..MAX_CART_LINES]).is_ok());
    }

    #[test]
    fn test_validate_event_window() {
        let start = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 6, 30, 0, 0, 0).unwrap();
        assert!(validate_event_window(start, end).is_ok());
        assert!(validate_event_window(start, start).is_ok());
        assert!(validate_event_window(end, start).is_err());
    }

    #[test]
    fn test_validate_discount() {
        let pct = |value, min, max| NewDiscount {
            discount_type: DiscountType::Percentage,
            value,
            min_purchase_amount: min,
            max_discount_amount: max,
        };
        assert!(validate_discount(&pct(20, Some(500), Some(150))).is_ok());
        assert!(validate_discount(&pct(0, None, None)).is_err());
        assert!(validate_discount(&pct(101, None, None)).is_err());
        assert!(validate_discount(&pct(20, Some(-1), None)).is_err());
        assert!(validate_discount(&pct(20, None, Some(0))).is_err());

        let fixed = |value, max| NewDiscount {
            discount_type: DiscountType::FixedAmount,
            value,
            min_purchase_amount: None,
            max_discount_amount: max,
        };
        assert!(validate_discount(&fixed(300, None)).is_ok());
        assert!(validate_discount(&fixed(0, None)).is_err());
        assert!(validate_discount(&fixed(300, Some(100))).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-100).is_err());
        assert!(validate_price_cents(MAX_PRICE_CENTS).is_ok());
        assert!(validate_price_cents(MAX_PRICE_CENTS + 1).is_err());
        assert!(validate_price_cents(i64::MAX).is_err());
    }

    #[test]
    fn test_validate_stock_quantities() {
        assert!(validate_positive_quantity(1).is_ok());
        assert!(validate_positive_quantity(i64::MAX).is_ok());
        assert!(validate_positive_quantity(0).is_err());

        assert!(validate_restock_quantity(MAX_RESTOCK_QUANTITY).is_ok());
        assert!(matches!(
            validate_restock_quantity(MAX_RESTOCK_QUANTITY + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            validate_restock_quantity(-3),
            Err(ValidationError::MustBePositive { .. })
        ));
    }
}
