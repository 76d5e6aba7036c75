//! # Error Types
//!
//! Domain-specific error types for bazaar-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bazaar-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures (InvalidInput)       │
//! │                                                                         │
//! │  bazaar-db errors (separate crate)                                     │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── StoreError       - CoreError | DbError from service calls         │
//! │                                                                         │
//! │  HTTP errors (apps/api)                                                │
//! │  └── ApiError         - { code, message } JSON body + status          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StoreError → ApiError → client    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, ID, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to one machine-readable API code

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::types::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced entity does not exist (or is soft-deleted).
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// One or more cart lines cannot be fulfilled.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout: [TEE-M × 2, MUG-01 × 5]
    ///      │
    ///      ▼
    /// decrement TEE-M  ✓   decrement MUG-01 ✗ (stock 3)
    ///      │
    ///      ▼
    /// ROLLBACK (TEE-M restored), InsufficientStock [MUG-01: 3 < 5]
    /// ```
    #[error("Insufficient stock: {}", format_shortfalls(.shortfalls))]
    InsufficientStock { shortfalls: Vec<StockShortfall> },

    /// The caller may not act on this resource (e.g. another user's address).
    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    /// The operation collides with existing state (duplicate event name, SKU).
    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    /// Order status change not allowed by the state machine.
    #[error("Cannot move order from {from:?} to {to:?}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Forbidden error.
    pub fn forbidden(reason: impl Into<String>) -> Self {
        CoreError::Forbidden {
            reason: reason.into(),
        }
    }

    /// Creates a Conflict error.
    pub fn conflict(reason: impl Into<String>) -> Self {
        CoreError::Conflict {
            reason: reason.into(),
        }
    }
}

/// One unfulfillable cart line, reported inside `InsufficientStock`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockShortfall {
    pub variant_id: i64,
    pub sku: String,
    pub available: i64,
    pub requested: i64,
}

fn format_shortfalls(shortfalls: &[StockShortfall]) -> String {
    shortfalls
        .iter()
        .map(|s| {
            format!(
                "{} (available {}, requested {})",
                s.sku, s.available, s.requested
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any transaction starts.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., bad SKU characters, inverted date range).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// The same key appears twice where it must be unique (e.g. a cart line).
    #[error("{field} contains duplicate value: {value}")]
    Duplicate { field: String, value: String },

    /// Collection must contain at least one element.
    #[error("{field} must not be empty")]
    Empty { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_names_every_sku() {
        let err = CoreError::InsufficientStock {
            shortfalls: vec![
                StockShortfall {
                    variant_id: 1,
                    sku: "TEE-M".to_string(),
                    available: 0,
                    requested: 1,
                },
                StockShortfall {
                    variant_id: 2,
                    sku: "MUG-01".to_string(),
                    available: 3,
                    requested: 5,
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock: TEE-M (available 0, requested 1), MUG-01 (available 3, requested 5)"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "sku".to_string(),
        };
        assert_eq!(err.to_string(), "sku is required");

        let err = ValidationError::Empty {
            field: "items".to_string(),
        };
        assert_eq!(err.to_string(), "items must not be empty");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }

    #[test]
    fn test_transition_message() {
        let err = CoreError::InvalidStatusTransition {
            from: OrderStatus::Completed,
            to: OrderStatus::Pending,
        };
        assert_eq!(err.to_string(), "Cannot move order from Completed to Pending");
    }
}
