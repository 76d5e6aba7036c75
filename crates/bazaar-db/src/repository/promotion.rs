//! # Promotion Repository
//!
//! Events, their discounts and product associations.
//!
//! ## Lookup Path
//! ```text
//! find_best_discount(product, at, line_total)
//!      │
//!      ▼
//! events JOIN event_products WHERE product_id = ? AND status = 'ACTIVE'
//!      │  (+ discounts, product ids per event)
//!      ▼
//! running_discounts(events, product, at)   ← window check in Rust
//!      │
//!      ▼
//! select_best_discount(candidates, line_total)
//! ```
//! The window is compared on parsed `DateTime<Utc>` values rather than in
//! SQL, where the TEXT timestamps would compare as strings.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use bazaar_core::promotion::{running_discounts, select_best_discount};
use bazaar_core::validation::{validate_discount, validate_event_name, validate_event_window};
use bazaar_core::{
    CoreError, Discount, DiscountInfo, Event, EventDetails, EventStatus, Money, NewDiscount,
    NewEvent,
};

use crate::error::{DbError, DbResult, StoreResult};
use crate::repository::catalog;
use crate::tx::ImmediateTx;

const EVENT_COLUMNS: &str = "id, name, start_date, end_date, status, created_at";
const DISCOUNT_COLUMNS: &str =
    "id, event_id, discount_type, value, min_purchase_cents, max_discount_cents";

// =============================================================================
// Queries
// =============================================================================

pub(crate) async fn fetch_event(
    conn: &mut SqliteConnection,
    event_id: i64,
) -> DbResult<Option<Event>> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1");
    let event = sqlx::query_as::<_, Event>(&sql)
        .bind(event_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(event)
}

async fn load_details(conn: &mut SqliteConnection, event: Event) -> DbResult<EventDetails> {
    let sql = format!("SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE event_id = ?1 ORDER BY id");
    let discounts = sqlx::query_as::<_, Discount>(&sql)
        .bind(event.id)
        .fetch_all(&mut *conn)
        .await?;

    let product_ids: Vec<i64> = sqlx::query_scalar(
        "SELECT product_id FROM event_products WHERE event_id = ?1 ORDER BY product_id",
    )
    .bind(event.id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(EventDetails {
        event,
        discounts,
        product_ids,
    })
}

pub(crate) async fn fetch_details(
    conn: &mut SqliteConnection,
    event_id: i64,
) -> DbResult<Option<EventDetails>> {
    match fetch_event(conn, event_id).await? {
        Some(event) => Ok(Some(load_details(conn, event).await?)),
        None => Ok(None),
    }
}

/// ACTIVE events containing `product_id`, in id order, window not yet checked.
async fn active_events_for_product(
    conn: &mut SqliteConnection,
    product_id: i64,
) -> DbResult<Vec<EventDetails>> {
    let events = sqlx::query_as::<_, Event>(
        r#"
        SELECT e.id, e.name, e.start_date, e.end_date, e.status, e.created_at
        FROM events e
        JOIN event_products ep ON ep.event_id = e.id
        WHERE ep.product_id = ?1 AND e.status = ?2
        ORDER BY e.id
        "#,
    )
    .bind(product_id)
    .bind(EventStatus::Active)
    .fetch_all(&mut *conn)
    .await?;

    let mut details = Vec::with_capacity(events.len());
    for event in events {
        details.push(load_details(conn, event).await?);
    }
    Ok(details)
}

/// Every discount that could apply to `product_id` at `at`.
///
/// The bill preview and the order commit both price lines from this list.
pub(crate) async fn running_candidates(
    conn: &mut SqliteConnection,
    product_id: i64,
    at: DateTime<Utc>,
) -> DbResult<Vec<DiscountInfo>> {
    let events = active_events_for_product(conn, product_id).await?;
    let candidates = running_discounts(&events, product_id, at);
    debug!(product_id, candidates = candidates.len(), "Resolved discount candidates");
    Ok(candidates)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for promotional events and discounts.
#[derive(Debug, Clone)]
pub struct PromotionRepository {
    pool: SqlitePool,
}

impl PromotionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PromotionRepository { pool }
    }

    /// Creates an event with no discounts and no products.
    ///
    /// ## Errors
    /// - `Validation` for an empty/long name or `start > end`
    /// - `Conflict` if the name is taken
    pub async fn create_event(&self, new: &NewEvent) -> StoreResult<EventDetails> {
        validate_event_name(&new.name)?;
        validate_event_window(new.start_date, new.end_date)?;
        let name = new.name.trim();

        let sql = format!(
            r#"
            INSERT INTO events (name, start_date, end_date, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING {EVENT_COLUMNS}
            "#
        );
        let inserted = sqlx::query_as::<_, Event>(&sql)
            .bind(name)
            .bind(new.start_date)
            .bind(new.end_date)
            .bind(new.status)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from);

        let event = match inserted {
            Ok(event) => event,
            Err(e) if e.is_unique_violation() => {
                return Err(
                    CoreError::conflict(format!("event name '{name}' already exists")).into(),
                )
            }
            Err(e) => return Err(e.into()),
        };

        info!(event_id = event.id, name = %event.name, status = ?event.status, "Event created");
        Ok(EventDetails {
            event,
            discounts: Vec::new(),
            product_ids: Vec::new(),
        })
    }

    pub async fn get_event(&self, event_id: i64) -> StoreResult<EventDetails> {
        let mut conn = self.pool.acquire().await?;
        fetch_details(&mut conn, event_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Event", event_id).into())
    }

    /// Adds a discount rule to an event.
    pub async fn add_discount(&self, event_id: i64, new: &NewDiscount) -> StoreResult<Discount> {
        validate_discount(new)?;

        let sql = format!(
            r#"
            INSERT INTO discounts
                (event_id, discount_type, value, min_purchase_cents, max_discount_cents)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING {DISCOUNT_COLUMNS}
            "#
        );
        let inserted = sqlx::query_as::<_, Discount>(&sql)
            .bind(event_id)
            .bind(new.discount_type)
            .bind(new.value)
            .bind(new.min_purchase_amount)
            .bind(new.max_discount_amount)
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from);

        match inserted {
            Ok(discount) => {
                info!(
                    event_id,
                    discount_id = discount.id,
                    discount_type = ?discount.discount_type,
                    value = discount.value,
                    "Discount added"
                );
                Ok(discount)
            }
            Err(e) if e.is_foreign_key_violation() => {
                Err(CoreError::not_found("Event", event_id).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Associates products with an event. Already-attached products are
    /// left as they are; either every product is attached or none is.
    pub async fn attach_products(
        &self,
        event_id: i64,
        product_ids: &[i64],
    ) -> StoreResult<EventDetails> {
        let mut tx = ImmediateTx::begin(&self.pool).await?;
        let attached = attach_in(tx.conn(), event_id, product_ids).await;
        match attached {
            Ok(details) => {
                tx.commit().await?;
                info!(event_id, products = ?details.product_ids, "Products attached to event");
                Ok(details)
            }
            Err(e) => Err(tx.abort(e).await),
        }
    }

    pub async fn set_event_status(&self, event_id: i64, status: EventStatus) -> StoreResult<Event> {
        let sql = format!("UPDATE events SET status = ?1 WHERE id = ?2 RETURNING {EVENT_COLUMNS}");
        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(status)
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CoreError::not_found("Event", event_id))?;

        info!(event_id, status = ?status, "Event status changed");
        Ok(event)
    }

    /// Events running at `at` that contain `product_id`, with their
    /// discounts and product sets loaded.
    pub async fn find_active_events_for_product(
        &self,
        product_id: i64,
        at: DateTime<Utc>,
    ) -> StoreResult<Vec<EventDetails>> {
        let mut conn = self.pool.acquire().await?;
        let events = active_events_for_product(&mut conn, product_id).await?;
        Ok(events.into_iter().filter(|e| e.event.is_running(at)).collect())
    }

    /// The discount giving the largest reduction on `line_total` for
    /// `product_id` at `at`, with that reduction. `None` if nothing applies.
    pub async fn find_best_discount(
        &self,
        product_id: i64,
        at: DateTime<Utc>,
        line_total: Money,
    ) -> StoreResult<Option<(DiscountInfo, Money)>> {
        let mut conn = self.pool.acquire().await?;
        let candidates = running_candidates(&mut conn, product_id, at).await?;
        Ok(select_best_discount(&candidates, line_total))
    }
}

async fn attach_in(
    conn: &mut SqliteConnection,
    event_id: i64,
    product_ids: &[i64],
) -> StoreResult<EventDetails> {
    if fetch_event(conn, event_id).await?.is_none() {
        return Err(CoreError::not_found("Event", event_id).into());
    }

    for &product_id in product_ids {
        if !catalog::product_exists(conn, product_id).await? {
            return Err(CoreError::not_found("Product", product_id).into());
        }
        sqlx::query("INSERT OR IGNORE INTO event_products (event_id, product_id) VALUES (?1, ?2)")
            .bind(event_id)
            .bind(product_id)
            .execute(&mut *conn)
            .await?;
    }

    fetch_details(conn, event_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Event", event_id).into())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::repository::test_support::{at_day, june_event, seed_variant, test_db};
    use bazaar_core::DiscountType;

    fn percentage(value: i64, min: Option<i64>, max: Option<i64>) -> NewDiscount {
        NewDiscount {
            discount_type: DiscountType::Percentage,
            value,
            min_purchase_amount: min,
            max_discount_amount: max,
        }
    }

    fn fixed(value: i64) -> NewDiscount {
        NewDiscount {
            discount_type: DiscountType::FixedAmount,
            value,
            min_purchase_amount: None,
            max_discount_amount: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_event_name_is_conflict() {
        let db = test_db().await;
        let promotions = db.promotions();
        promotions.create_event(&june_event("Summer Sale", EventStatus::Active)).await.unwrap();

        let err = promotions
            .create_event(&june_event("Summer Sale", EventStatus::Scheduled))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Core(CoreError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_inverted_window_rejected() {
        let db = test_db().await;
        let mut new = june_event("Backwards", EventStatus::Active);
        std::mem::swap(&mut new.start_date, &mut new.end_date);

        let err = db.promotions().create_event(&new).await.unwrap_err();
        assert!(matches!(err, StoreError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_add_discount_validates() {
        let db = test_db().await;
        let promotions = db.promotions();
        let event = promotions.create_event(&june_event("Sale", EventStatus::Active)).await.unwrap();

        assert!(promotions.add_discount(event.event.id, &percentage(0, None, None)).await.is_err());
        assert!(promotions.add_discount(event.event.id, &percentage(20, Some(-1), None)).await.is_err());
        assert!(promotions.add_discount(event.event.id, &percentage(20, None, Some(150))).await.is_ok());

        let err = promotions.add_discount(999, &fixed(100)).await.unwrap_err();
        assert!(matches!(err, StoreError::Core(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_attach_products_is_idempotent() {
        let db = test_db().await;
        let variant = seed_variant(&db, "Tee", "TEE-RED-M", 1000, 5).await;
        let promotions = db.promotions();
        let event = promotions.create_event(&june_event("Sale", EventStatus::Active)).await.unwrap();

        promotions.attach_products(event.event.id, &[variant.product_id]).await.unwrap();
        let details = promotions
            .attach_products(event.event.id, &[variant.product_id])
            .await
            .unwrap();
        assert_eq!(details.product_ids, vec![variant.product_id]);
    }

    #[tokio::test]
    async fn test_attach_unknown_product_attaches_nothing() {
        let db = test_db().await;
        let variant = seed_variant(&db, "Tee", "TEE-RED-M", 1000, 5).await;
        let promotions = db.promotions();
        let event = promotions.create_event(&june_event("Sale", EventStatus::Active)).await.unwrap();

        let err = promotions
            .attach_products(event.event.id, &[variant.product_id, 999])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Core(CoreError::NotFound { .. })));

        let details = promotions.get_event(event.event.id).await.unwrap();
        assert!(details.product_ids.is_empty());
    }

    #[tokio::test]
    async fn test_find_best_discount_scenario() {
        let db = test_db().await;
        let variant = seed_variant(&db, "Tee", "TEE-RED-M", 1000, 5).await;
        let promotions = db.promotions();

        let sale = promotions.create_event(&june_event("Sale", EventStatus::Active)).await.unwrap();
        promotions
            .add_discount(sale.event.id, &percentage(20, Some(500), Some(150)))
            .await
            .unwrap();
        promotions.attach_products(sale.event.id, &[variant.product_id]).await.unwrap();

        let (info, amount) = promotions
            .find_best_discount(variant.product_id, at_day(10), Money::from_cents(2000))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(info.event_id, sale.event.id);
        assert_eq!(amount.cents(), 150);

        // below min purchase
        let none = promotions
            .find_best_discount(variant.product_id, at_day(10), Money::from_cents(400))
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_only_running_events_apply() {
        let db = test_db().await;
        let variant = seed_variant(&db, "Tee", "TEE-RED-M", 1000, 5).await;
        let promotions = db.promotions();

        let scheduled = promotions
            .create_event(&june_event("Later", EventStatus::Scheduled))
            .await
            .unwrap();
        promotions.add_discount(scheduled.event.id, &fixed(300)).await.unwrap();
        promotions.attach_products(scheduled.event.id, &[variant.product_id]).await.unwrap();

        let found = promotions
            .find_active_events_for_product(variant.product_id, at_day(10))
            .await
            .unwrap();
        assert!(found.is_empty());

        promotions
            .set_event_status(scheduled.event.id, EventStatus::Active)
            .await
            .unwrap();
        let found = promotions
            .find_active_events_for_product(variant.product_id, at_day(10))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].discounts.len(), 1);

        // outside the June window
        let outside = promotions
            .find_active_events_for_product(variant.product_id, at_day(10) + chrono::Duration::days(40))
            .await
            .unwrap();
        assert!(outside.is_empty());
    }

    #[tokio::test]
    async fn test_best_discount_across_events() {
        let db = test_db().await;
        let variant = seed_variant(&db, "Tee", "TEE-RED-M", 1000, 5).await;
        let promotions = db.promotions();

        let pct = promotions.create_event(&june_event("Percent", EventStatus::Active)).await.unwrap();
        promotions
            .add_discount(pct.event.id, &percentage(20, Some(500), Some(150)))
            .await
            .unwrap();
        let flat = promotions.create_event(&june_event("Flat", EventStatus::Active)).await.unwrap();
        promotions.add_discount(flat.event.id, &fixed(300)).await.unwrap();

        for id in [pct.event.id, flat.event.id] {
            promotions.attach_products(id, &[variant.product_id]).await.unwrap();
        }

        let (info, amount) = promotions
            .find_best_discount(variant.product_id, at_day(10), Money::from_cents(2000))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(info.event_id, flat.event.id);
        assert_eq!(amount.cents(), 300);
    }
}
