//! Fixtures shared by the repository and checkout tests.

use chrono::{DateTime, TimeZone, Utc};

use bazaar_core::{Attributes, EventStatus, NewAddress, NewEvent, NewVariant, ProductVariant};

use crate::pool::{Database, DbConfig};

pub(crate) async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// Creates a product and one size-M variant of it.
pub(crate) async fn seed_variant(
    db: &Database,
    product_name: &str,
    sku: &str,
    price_cents: i64,
    stock: i64,
) -> ProductVariant {
    let product = db.catalog().insert_product(product_name).await.unwrap();
    db.catalog()
        .insert_variant(&NewVariant {
            product_id: product.id,
            sku: sku.to_string(),
            attributes: Attributes::from([("size".to_string(), "M".to_string())]),
            price_cents,
            stock,
        })
        .await
        .unwrap()
}

pub(crate) fn home_address() -> NewAddress {
    NewAddress {
        recipient: "Jordan Doe".to_string(),
        line1: "742 Evergreen Terrace".to_string(),
        city: "Springfield".to_string(),
        postal_code: "49007".to_string(),
    }
}

/// Noon UTC on the given day of June 2026.
pub(crate) fn at_day(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, day, 12, 0, 0).unwrap()
}

/// An event covering all of June 2026.
pub(crate) fn june_event(name: &str, status: EventStatus) -> NewEvent {
    NewEvent {
        name: name.to_string(),
        start_date: Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap(),
        end_date: Utc.with_ymd_and_hms(2026, 6, 30, 23, 59, 59).unwrap(),
        status,
    }
}
