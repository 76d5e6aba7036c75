//! # Stock Ledger
//!
//! The only code that mutates `product_variants.stock`.
//!
//! ## Conditional Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE product_variants                                                │
//! │  SET    stock = stock - :qty                                            │
//! │  WHERE  id = :variant AND stock >= :qty                                 │
//! │  RETURNING stock                                                        │
//! │                                                                         │
//! │  row returned   → taken, value is the remaining stock                   │
//! │  no row         → not enough stock (or no such variant); nothing moved  │
//! │                                                                         │
//! │  stock=1, two checkouts of qty 1:                                       │
//! │     A: UPDATE ... WHERE stock >= 1   → 1 row, stock=0                   │
//! │     B: UPDATE ... WHERE stock >= 1   → 0 rows   → InsufficientStock     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The check and the write are one statement, so there is no window between
//! reading the stock and changing it. Stock can never go negative.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use bazaar_core::validation::{validate_positive_quantity, validate_restock_quantity};
use bazaar_core::{CoreError, StockAdjustment, StockShortfall};

use crate::error::{DbResult, StoreResult};

// =============================================================================
// Queries
// =============================================================================

/// Takes `quantity` units if at least that many are on hand.
///
/// Returns the remaining stock, or `None` if nothing was taken.
pub(crate) async fn try_decrement(
    conn: &mut SqliteConnection,
    variant_id: i64,
    quantity: i64,
) -> DbResult<Option<i64>> {
    let remaining: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE product_variants
        SET stock = stock - ?1, updated_at = ?2
        WHERE id = ?3 AND stock >= ?1
        RETURNING stock
        "#,
    )
    .bind(quantity)
    .bind(Utc::now())
    .bind(variant_id)
    .fetch_optional(&mut *conn)
    .await?;

    debug!(variant_id, quantity, taken = remaining.is_some(), "Stock decrement");
    Ok(remaining)
}

/// Adds `quantity` units unless the result would not fit in an INTEGER.
///
/// SQLite turns an overflowing `stock + ?` into a REAL, which would pass
/// `CHECK (stock >= 0)` and then fail to decode on every later read, so the
/// guard lives in the WHERE clause.
///
/// Returns `(sku, new_stock)`.
///
/// ## Errors
/// - `NotFound` if the variant does not exist
/// - `Conflict` if the new stock would overflow
pub(crate) async fn increment(
    conn: &mut SqliteConnection,
    variant_id: i64,
    quantity: i64,
) -> StoreResult<(String, i64)> {
    let row: Option<(String, i64)> = sqlx::query_as(
        r#"
        UPDATE product_variants
        SET stock = stock + ?1, updated_at = ?2
        WHERE id = ?3 AND stock <= 9223372036854775807 - ?1
        RETURNING sku, stock
        "#,
    )
    .bind(quantity)
    .bind(Utc::now())
    .bind(variant_id)
    .fetch_optional(&mut *conn)
    .await?;

    debug!(variant_id, quantity, applied = row.is_some(), "Stock increment");
    if let Some(row) = row {
        return Ok(row);
    }

    match current_stock(conn, variant_id).await? {
        Some((sku, stock)) => {
            warn!(variant_id, sku = %sku, stock, quantity, "Restock would overflow stock");
            Err(CoreError::conflict(format!(
                "Adding {quantity} units to '{sku}' would overflow its stock of {stock}"
            ))
            .into())
        }
        None => Err(CoreError::not_found("Variant", variant_id).into()),
    }
}

/// Reads `(sku, stock)` for reporting a shortfall.
pub(crate) async fn current_stock(
    conn: &mut SqliteConnection,
    variant_id: i64,
) -> DbResult<Option<(String, i64)>> {
    let row: Option<(String, i64)> =
        sqlx::query_as("SELECT sku, stock FROM product_variants WHERE id = ?1")
            .bind(variant_id)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(row)
}

/// Builds the shortfall for a failed decrement, or `NotFound` if the
/// variant has vanished.
pub(crate) async fn shortfall(
    conn: &mut SqliteConnection,
    variant_id: i64,
    requested: i64,
) -> StoreResult<StockShortfall> {
    let (sku, available) = current_stock(conn, variant_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Variant", variant_id))?;

    Ok(StockShortfall {
        variant_id,
        sku,
        available,
        requested,
    })
}

// =============================================================================
// Ledger
// =============================================================================

/// Pool-backed access to the stock ledger for single-variant operations.
///
/// Checkout does not go through this type: it calls the query functions
/// above on its own transaction so the decrements commit or roll back with
/// the order.
#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: SqlitePool,
}

impl StockLedger {
    pub fn new(pool: SqlitePool) -> Self {
        StockLedger { pool }
    }

    /// Takes `quantity` units from a variant.
    ///
    /// ## Returns
    /// * `Ok(remaining)` - units left after the decrement
    /// * `Err(InsufficientStock)` - fewer than `quantity` on hand; stock unchanged
    /// * `Err(NotFound)` - no such variant
    pub async fn try_decrement(&self, variant_id: i64, quantity: i64) -> StoreResult<i64> {
        validate_positive_quantity(quantity)?;
        let mut conn = self.pool.acquire().await?;

        match try_decrement(&mut conn, variant_id, quantity).await? {
            Some(remaining) => Ok(remaining),
            None => {
                let shortfall = shortfall(&mut conn, variant_id, quantity).await?;
                Err(CoreError::InsufficientStock {
                    shortfalls: vec![shortfall],
                }
                .into())
            }
        }
    }

    /// Administrative restock. Adds `quantity` units and reports the stock
    /// before and after.
    ///
    /// `quantity` must be in `1..=MAX_RESTOCK_QUANTITY`.
    pub async fn increment(&self, variant_id: i64, quantity: i64) -> StoreResult<StockAdjustment> {
        validate_restock_quantity(quantity)?;
        let mut conn = self.pool.acquire().await?;

        let (sku, new_stock) = increment(&mut conn, variant_id, quantity).await?;

        let adjustment = StockAdjustment {
            variant_id,
            sku,
            previous_stock: new_stock - quantity,
            new_stock,
        };
        info!(
            variant_id,
            sku = %adjustment.sku,
            previous = adjustment.previous_stock,
            new = adjustment.new_stock,
            "Variant restocked"
        );
        Ok(adjustment)
    }

    /// Units currently on hand.
    pub async fn available(&self, variant_id: i64) -> StoreResult<i64> {
        let mut conn = self.pool.acquire().await?;
        let (_, stock) = current_stock(&mut conn, variant_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Variant", variant_id))?;
        Ok(stock)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use bazaar_core::ValidationError;
    use crate::repository::test_support::{seed_variant, test_db};

    #[tokio::test]
    async fn test_decrement_within_stock() {
        let db = test_db().await;
        let variant = seed_variant(&db, "Mug", "MUG-01", 800, 3).await;

        assert_eq!(db.stock().try_decrement(variant.id, 2).await.unwrap(), 1);
        assert_eq!(db.stock().available(variant.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_decrement_to_exactly_zero() {
        let db = test_db().await;
        let variant = seed_variant(&db, "Mug", "MUG-01", 800, 3).await;

        assert_eq!(db.stock().try_decrement(variant.id, 3).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_overdraw_leaves_stock_untouched() {
        let db = test_db().await;
        let variant = seed_variant(&db, "Mug", "MUG-01", 800, 3).await;

        let err = db.stock().try_decrement(variant.id, 5).await.unwrap_err();
        match err {
            StoreError::Core(CoreError::InsufficientStock { shortfalls }) => {
                assert_eq!(shortfalls.len(), 1);
                assert_eq!(shortfalls[0].sku, "MUG-01");
                assert_eq!(shortfalls[0].available, 3);
                assert_eq!(shortfalls[0].requested, 5);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_eq!(db.stock().available(variant.id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_decrement_missing_variant() {
        let db = test_db().await;
        let err = db.stock().try_decrement(404, 1).await.unwrap_err();
        assert!(matches!(err, StoreError::Core(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_increment_reports_previous_and_new() {
        let db = test_db().await;
        let variant = seed_variant(&db, "Mug", "MUG-01", 800, 3).await;

        let adjustment = db.stock().increment(variant.id, 10).await.unwrap();
        assert_eq!(adjustment.sku, "MUG-01");
        assert_eq!(adjustment.previous_stock, 3);
        assert_eq!(adjustment.new_stock, 13);
    }

    #[tokio::test]
    async fn test_increment_rejects_non_positive() {
        let db = test_db().await;
        let variant = seed_variant(&db, "Mug", "MUG-01", 800, 3).await;

        assert!(db.stock().increment(variant.id, 0).await.is_err());
        assert!(db.stock().increment(variant.id, -4).await.is_err());
        assert_eq!(db.stock().available(variant.id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_increment_rejects_oversized_restock() {
        let db = test_db().await;
        let variant = seed_variant(&db, "Mug", "MUG-01", 800, 5).await;

        let err = db.stock().increment(variant.id, i64::MAX).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Core(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert_eq!(db.stock().available(variant.id).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_increment_never_overflows_stored_stock() {
        let db = test_db().await;
        let variant = seed_variant(&db, "Mug", "MUG-01", 800, i64::MAX - 2).await;
        let mut conn = db.pool().acquire().await.unwrap();

        let err = increment(&mut conn, variant.id, 3).await.unwrap_err();
        assert!(matches!(err, StoreError::Core(CoreError::Conflict { .. })));
        drop(conn);

        // the row still decodes as an integer and the variant stays sellable
        assert_eq!(db.stock().available(variant.id).await.unwrap(), i64::MAX - 2);
        assert_eq!(db.stock().try_decrement(variant.id, 2).await.unwrap(), i64::MAX - 4);
        let adjustment = db.stock().increment(variant.id, 4).await.unwrap();
        assert_eq!(adjustment.new_stock, i64::MAX);
    }

    #[tokio::test]
    async fn test_increment_missing_variant() {
        let db = test_db().await;
        let err = db.stock().increment(404, 1).await.unwrap_err();
        assert!(matches!(err, StoreError::Core(CoreError::NotFound { .. })));
    }
}
