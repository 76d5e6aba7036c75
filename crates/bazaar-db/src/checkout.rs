//! # Checkout Service
//!
//! Bill preview and order commit. Both price the cart with the same
//! [`price_cart`] function; the commit runs it again inside its own write
//! transaction and never trusts a previously returned preview.
//!
//! ## Commit Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate_cart(lines)                  ← before any transaction        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN IMMEDIATE ──────────────────────────────────────────────────┐   │
//! │  │  address: live and owned by user    → NotFound / Forbidden      │   │
//! │  │  price_cart: variants + discounts   → NotFound                  │   │
//! │  │  for each line: conditional decrement                           │   │
//! │  │       collect every shortfall       → InsufficientStock [..]    │   │
//! │  │  INSERT orders (PENDING), INSERT order_items (snapshots)        │   │
//! │  COMMIT ◄──── any error above: ROLLBACK, nothing persisted ────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use bazaar_core::bill::price_line;
use bazaar_core::validation::validate_cart;
use bazaar_core::{Bill, CartLine, CoreError, OrderDetails, OrderStatus, PricingPolicy};

use crate::error::{DbError, StoreResult};
use crate::repository::{address, catalog, order, promotion, stock};
use crate::tx::ImmediateTx;

/// Prices every line at `at` and sums the bill.
///
/// Read-only. Uses each variant's current price and the discounts of the
/// events running at `at`.
pub(crate) async fn price_cart(
    conn: &mut SqliteConnection,
    lines: &[CartLine],
    at: DateTime<Utc>,
    policy: &PricingPolicy,
) -> StoreResult<Bill> {
    let mut priced = Vec::with_capacity(lines.len());

    for line in lines {
        let listing = catalog::fetch_listing(conn, line.variant_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Variant", line.variant_id))?;
        let candidates =
            promotion::running_candidates(conn, listing.variant.product_id, at).await?;
        priced.push(price_line(&listing, line.quantity, &candidates)?);
    }

    Ok(Bill::assemble(priced, policy)?)
}

async fn commit_order(
    conn: &mut SqliteConnection,
    user_id: i64,
    address_id: i64,
    lines: &[CartLine],
    at: DateTime<Utc>,
    policy: &PricingPolicy,
) -> StoreResult<OrderDetails> {
    address::get_owned(conn, address_id, user_id).await?;
    let bill = price_cart(conn, lines, at, policy).await?;

    let mut shortfalls = Vec::new();
    for line in &bill.items {
        if stock::try_decrement(conn, line.variant_id, line.quantity)
            .await?
            .is_none()
        {
            shortfalls.push(stock::shortfall(conn, line.variant_id, line.quantity).await?);
        }
    }
    if !shortfalls.is_empty() {
        return Err(CoreError::InsufficientStock { shortfalls }.into());
    }

    let order_number = order::generate_order_number(at);
    let order_id =
        order::insert_order(conn, &order_number, user_id, address_id, &bill, at).await?;
    order::insert_items(conn, order_id, &bill.items).await?;

    order::fetch_details(conn, order_id)
        .await?
        .ok_or_else(|| DbError::not_found("Order", order_id).into())
}

async fn transition_order(
    conn: &mut SqliteConnection,
    order_id: i64,
    next: OrderStatus,
    now: DateTime<Utc>,
) -> StoreResult<OrderDetails> {
    let details = order::fetch_details(conn, order_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Order", order_id))?;
    let next = details.order.status.transition_to(next)?;

    // Cancelled orders give their stock back
    if next == OrderStatus::Cancelled {
        for item in &details.items {
            stock::increment(conn, item.variant_id, item.quantity).await?;
        }
    }

    order::update_status(conn, order_id, next, now).await?;
    order::fetch_details(conn, order_id)
        .await?
        .ok_or_else(|| DbError::not_found("Order", order_id).into())
}

// =============================================================================
// Service
// =============================================================================

/// Bill preview, order placement and order status changes.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    pool: SqlitePool,
    policy: PricingPolicy,
}

impl CheckoutService {
    pub fn new(pool: SqlitePool, policy: PricingPolicy) -> Self {
        CheckoutService { pool, policy }
    }

    /// Prices a prospective order now. See [`preview_bill_at`](Self::preview_bill_at).
    pub async fn preview_bill(
        &self,
        user_id: i64,
        address_id: i64,
        lines: &[CartLine],
    ) -> StoreResult<Bill> {
        self.preview_bill_at(user_id, address_id, lines, Utc::now())
            .await
    }

    /// Prices a prospective order as of `at`. Touches no stock.
    ///
    /// ## Errors
    /// - `Validation` - empty cart, non-positive quantity, duplicate variant
    /// - `NotFound` - unknown variant, or address missing/deleted
    /// - `Forbidden` - address belongs to another user
    pub async fn preview_bill_at(
        &self,
        user_id: i64,
        address_id: i64,
        lines: &[CartLine],
        at: DateTime<Utc>,
    ) -> StoreResult<Bill> {
        validate_cart(lines)?;

        let mut conn = self.pool.acquire().await?;
        address::get_owned(&mut conn, address_id, user_id).await?;
        let bill = price_cart(&mut conn, lines, at, &self.policy).await?;

        debug!(
            user_id,
            lines = bill.items.len(),
            total = %bill.total_amount,
            "Bill previewed"
        );
        Ok(bill)
    }

    /// Places an order now. See [`place_order_at`](Self::place_order_at).
    pub async fn place_order(
        &self,
        user_id: i64,
        address_id: i64,
        lines: &[CartLine],
    ) -> StoreResult<OrderDetails> {
        self.place_order_at(user_id, address_id, lines, Utc::now())
            .await
    }

    /// Places an order priced as of `at`: all-or-nothing.
    ///
    /// ## Errors
    /// Everything [`preview_bill_at`](Self::preview_bill_at) returns, plus
    /// `InsufficientStock` naming every line that cannot be filled. On any
    /// error no stock moves and no order exists.
    pub async fn place_order_at(
        &self,
        user_id: i64,
        address_id: i64,
        lines: &[CartLine],
        at: DateTime<Utc>,
    ) -> StoreResult<OrderDetails> {
        validate_cart(lines)?;

        let mut tx = ImmediateTx::begin(&self.pool).await?;
        let placed = commit_order(tx.conn(), user_id, address_id, lines, at, &self.policy).await;

        match placed {
            Ok(details) => {
                tx.commit().await?;
                info!(
                    order_id = details.order.id,
                    order_number = %details.order.order_number,
                    user_id,
                    total = %details.order.total_amount(),
                    "Order placed"
                );
                Ok(details)
            }
            Err(e) => {
                warn!(user_id, address_id, error = %e, "Checkout rejected");
                Err(tx.abort(e).await)
            }
        }
    }

    /// Moves an order along its state machine. Cancelling returns the
    /// order's stock in the same transaction.
    pub async fn update_order_status(
        &self,
        order_id: i64,
        next: OrderStatus,
    ) -> StoreResult<OrderDetails> {
        let mut tx = ImmediateTx::begin(&self.pool).await?;
        let moved = transition_order(tx.conn(), order_id, next, Utc::now()).await;

        match moved {
            Ok(details) => {
                tx.commit().await?;
                info!(order_id, status = ?details.order.status, "Order status changed");
                Ok(details)
            }
            Err(e) => Err(tx.abort(e).await),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
