//! # Order Repository
//!
//! Order and order item persistence.
//!
//! ## What Gets Written When
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  place_order (CheckoutService, one transaction)                         │
//! │     └── insert_order()  → orders row, status PENDING, amounts frozen    │
//! │     └── insert_items()  → one order_items row per bill line             │
//! │                           (sku / name / attributes snapshotted)         │
//! │                                                                         │
//! │  update_order_status (CheckoutService, one transaction)                 │
//! │     └── update_status() → status + updated_at, nothing else            │
//! │                                                                         │
//! │  Amount columns and items are never updated after insert.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use bazaar_core::{Actor, Bill, BillLine, CoreError, Order, OrderDetails, OrderItem, OrderStatus};

use crate::error::{DbResult, StoreResult};

const ORDER_COLUMNS: &str = "id, order_number, user_id, address_id, \
     original_amount_cents, discount_amount_cents, delivery_fee_cents, total_amount_cents, \
     status, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, variant_id, sku_snapshot, product_name_snapshot, \
     attributes_snapshot, quantity, original_unit_price_cents, unit_price_cents, \
     discount_cents, line_total_cents";

/// Generates an order number in format: `ORD-YYYYMMDD-XXXXXXXX`
///
/// - YYYYMMDD: UTC date of the order
/// - XXXXXXXX: 8 upper-case hex digits from a random v4 UUID
///
/// Uniqueness is enforced by the `orders.order_number` UNIQUE index.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(8)
        .collect();
    format!("ORD-{}-{}", now.format("%Y%m%d"), suffix.to_uppercase())
}

// =============================================================================
// Queries
// =============================================================================

/// Inserts the order header for a bill. Returns the new order id.
pub(crate) async fn insert_order(
    conn: &mut SqliteConnection,
    order_number: &str,
    user_id: i64,
    address_id: i64,
    bill: &Bill,
    now: DateTime<Utc>,
) -> DbResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO orders (
            order_number, user_id, address_id,
            original_amount_cents, discount_amount_cents, delivery_fee_cents, total_amount_cents,
            status, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
        "#,
    )
    .bind(order_number)
    .bind(user_id)
    .bind(address_id)
    .bind(bill.subtotal.cents())
    .bind(bill.discount_amount.cents())
    .bind(bill.delivery_fee.cents())
    .bind(bill.total_amount.cents())
    .bind(OrderStatus::Pending)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Inserts one snapshot row per bill line.
pub(crate) async fn insert_items(
    conn: &mut SqliteConnection,
    order_id: i64,
    lines: &[BillLine],
) -> DbResult<()> {
    for line in lines {
        sqlx::query(
            r#"
            INSERT INTO order_items (
                order_id, variant_id,
                sku_snapshot, product_name_snapshot, attributes_snapshot,
                quantity, original_unit_price_cents, unit_price_cents,
                discount_cents, line_total_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(order_id)
        .bind(line.variant_id)
        .bind(&line.sku)
        .bind(&line.product_name)
        .bind(Json(&line.attributes))
        .bind(line.quantity)
        .bind(line.original_unit_price.cents())
        .bind(line.unit_price.cents())
        .bind(line.discount_amount.cents())
        .bind(line.total_price.cents())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub(crate) async fn fetch_order(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> DbResult<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(order)
}

pub(crate) async fn fetch_items(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> DbResult<Vec<OrderItem>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY id");
    let items = sqlx::query_as::<_, OrderItem>(&sql)
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(items)
}

pub(crate) async fn fetch_details(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> DbResult<Option<OrderDetails>> {
    let Some(order) = fetch_order(conn, order_id).await? else {
        return Ok(None);
    };
    let items = fetch_items(conn, order_id).await?;
    Ok(Some(OrderDetails { order, items }))
}

pub(crate) async fn update_status(
    conn: &mut SqliteConnection,
    order_id: i64,
    status: OrderStatus,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query("UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(status)
        .bind(now)
        .bind(order_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Read access to committed orders. Writes go through
/// [`CheckoutService`](crate::checkout::CheckoutService).
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order with its items, regardless of owner.
    pub async fn get_details(&self, order_id: i64) -> StoreResult<OrderDetails> {
        let mut conn = self.pool.acquire().await?;
        fetch_details(&mut conn, order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", order_id).into())
    }

    /// Gets an order as `actor`: customers only see their own orders.
    pub async fn get_for(&self, order_id: i64, actor: &Actor) -> StoreResult<OrderDetails> {
        let details = self.get_details(order_id).await?;
        details.ensure_visible_to(actor)?;
        Ok(details)
    }

    /// A user's orders, newest first, without items.
    pub async fn list_for_user(&self, user_id: i64) -> StoreResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ?1 ORDER BY created_at DESC, id DESC"
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(orders)
    }
}
