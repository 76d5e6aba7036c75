//! # Address Repository
//!
//! Delivery addresses. Deleting an address sets a tombstone; every lookup
//! here filters tombstoned rows, so a deleted address behaves exactly like
//! one that never existed.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use bazaar_core::{Address, CoreError, NewAddress, ValidationError};

use crate::error::{DbResult, StoreResult};

const ADDRESS_COLUMNS: &str =
    "id, user_id, recipient, line1, city, postal_code, is_deleted, created_at";

pub(crate) async fn fetch_live(
    conn: &mut SqliteConnection,
    address_id: i64,
) -> DbResult<Option<Address>> {
    let sql = format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = ?1 AND is_deleted = 0");
    let address = sqlx::query_as::<_, Address>(&sql)
        .bind(address_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(address)
}

/// Loads an address `user_id` may ship to.
///
/// ## Errors
/// - `NotFound` - no such address, or it was deleted
/// - `Forbidden` - the address belongs to another user
pub(crate) async fn get_owned(
    conn: &mut SqliteConnection,
    address_id: i64,
    user_id: i64,
) -> StoreResult<Address> {
    let address = fetch_live(conn, address_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Address", address_id))?;
    address.ensure_owned_by(user_id)?;
    Ok(address)
}

fn validate_new_address(new: &NewAddress) -> Result<(), ValidationError> {
    for (field, value) in [
        ("recipient", &new.recipient),
        ("line1", &new.line1),
        ("city", &new.city),
        ("postal_code", &new.postal_code),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::Required {
                field: field.to_string(),
            });
        }
        if value.len() > 200 {
            return Err(ValidationError::TooLong {
                field: field.to_string(),
                max: 200,
            });
        }
    }
    Ok(())
}

/// Repository for delivery addresses.
#[derive(Debug, Clone)]
pub struct AddressRepository {
    pool: SqlitePool,
}

impl AddressRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AddressRepository { pool }
    }

    pub async fn insert(&self, user_id: i64, new: &NewAddress) -> StoreResult<Address> {
        validate_new_address(new)?;
        debug!(user_id, "Inserting address");

        let sql = format!(
            r#"
            INSERT INTO addresses
                (user_id, recipient, line1, city, postal_code, is_deleted, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)
            RETURNING {ADDRESS_COLUMNS}
            "#
        );
        let address = sqlx::query_as::<_, Address>(&sql)
            .bind(user_id)
            .bind(new.recipient.trim())
            .bind(new.line1.trim())
            .bind(new.city.trim())
            .bind(new.postal_code.trim())
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
        Ok(address)
    }

    pub async fn get_owned(&self, address_id: i64, user_id: i64) -> StoreResult<Address> {
        let mut conn = self.pool.acquire().await?;
        get_owned(&mut conn, address_id, user_id).await
    }

    /// Live addresses of a user, oldest first.
    pub async fn list_for_user(&self, user_id: i64) -> StoreResult<Vec<Address>> {
        let sql = format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE user_id = ?1 AND is_deleted = 0 ORDER BY id"
        );
        let addresses = sqlx::query_as::<_, Address>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(addresses)
    }

    /// Tombstones an address. Orders already placed keep referencing it.
    pub async fn soft_delete(&self, address_id: i64, user_id: i64) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        get_owned(&mut conn, address_id, user_id).await?;

        sqlx::query("UPDATE addresses SET is_deleted = 1 WHERE id = ?1")
            .bind(address_id)
            .execute(&mut *conn)
            .await?;

        info!(address_id, user_id, "Address deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::repository::test_support::{home_address, test_db};

    #[tokio::test]
    async fn test_owner_can_load_address() {
        let db = test_db().await;
        let address = db.addresses().insert(7, &home_address()).await.unwrap();

        let loaded = db.addresses().get_owned(address.id, 7).await.unwrap();
        assert_eq!(loaded.city, "Springfield");
        assert!(!loaded.is_deleted);
    }

    #[tokio::test]
    async fn test_other_user_is_forbidden() {
        let db = test_db().await;
        let address = db.addresses().insert(7, &home_address()).await.unwrap();

        let err = db.addresses().get_owned(address.id, 8).await.unwrap_err();
        assert!(matches!(err, StoreError::Core(CoreError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_deleted_address_is_not_found() {
        let db = test_db().await;
        let address = db.addresses().insert(7, &home_address()).await.unwrap();
        db.addresses().soft_delete(address.id, 7).await.unwrap();

        let err = db.addresses().get_owned(address.id, 7).await.unwrap_err();
        assert!(matches!(err, StoreError::Core(CoreError::NotFound { .. })));
        assert!(db.addresses().list_for_user(7).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_fields_rejected() {
        let db = test_db().await;
        let mut new = home_address();
        new.city = "  ".to_string();

        let err = db.addresses().insert(7, &new).await.unwrap_err();
        assert!(matches!(err, StoreError::Core(CoreError::Validation(_))));
    }
}
