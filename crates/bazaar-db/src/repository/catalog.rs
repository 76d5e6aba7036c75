//! # Catalog Repository
//!
//! Products and their variants. Only what pricing needs: the storefront
//! catalog (brands, categories, images) lives elsewhere.

use chrono::Utc;
use sqlx::types::Json;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use bazaar_core::validation::{validate_price_cents, validate_product_name, validate_sku};
use bazaar_core::{CoreError, NewVariant, Product, ProductVariant, ValidationError, VariantListing};

use crate::error::{DbError, DbResult, StoreResult};

const VARIANT_COLUMNS: &str =
    "id, product_id, sku, attributes, price_cents, stock, created_at, updated_at";

// =============================================================================
// Queries
// =============================================================================

pub(crate) async fn fetch_variant(
    conn: &mut SqliteConnection,
    variant_id: i64,
) -> DbResult<Option<ProductVariant>> {
    let sql = format!("SELECT {VARIANT_COLUMNS} FROM product_variants WHERE id = ?1");
    let variant = sqlx::query_as::<_, ProductVariant>(&sql)
        .bind(variant_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(variant)
}

/// Loads a variant with its product name. Variants of deactivated products
/// are not sellable and come back as `None`.
pub(crate) async fn fetch_listing(
    conn: &mut SqliteConnection,
    variant_id: i64,
) -> DbResult<Option<VariantListing>> {
    let listing = sqlx::query_as::<_, VariantListing>(
        r#"
        SELECT
            v.id, v.product_id, v.sku, v.attributes, v.price_cents, v.stock,
            v.created_at, v.updated_at,
            p.name AS product_name
        FROM product_variants v
        JOIN products p ON p.id = v.product_id
        WHERE v.id = ?1 AND p.is_active = 1
        "#,
    )
    .bind(variant_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(listing)
}

pub(crate) async fn product_exists(conn: &mut SqliteConnection, product_id: i64) -> DbResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(found.is_some())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for products and variants.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Creates an active product.
    pub async fn insert_product(&self, name: &str) -> StoreResult<Product> {
        validate_product_name(name)?;
        let name = name.trim();
        debug!(name = %name, "Inserting product");

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, is_active, created_at)
            VALUES (?1, 1, ?2)
            RETURNING id, name, is_active, created_at
            "#,
        )
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    /// Soft-deletes a product. Its variants stop being sellable.
    pub async fn deactivate_product(&self, product_id: i64) -> StoreResult<()> {
        let result = sqlx::query("UPDATE products SET is_active = 0 WHERE id = ?1")
            .bind(product_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("Product", product_id).into());
        }
        Ok(())
    }

    /// Adds a variant to a product.
    ///
    /// ## Errors
    /// - `Validation` for a malformed SKU, negative price or negative stock
    /// - `NotFound` if the product does not exist
    /// - `Conflict` if the SKU is already taken
    pub async fn insert_variant(&self, new: &NewVariant) -> StoreResult<ProductVariant> {
        validate_sku(&new.sku)?;
        validate_price_cents(new.price_cents)?;
        if new.stock < 0 {
            return Err(ValidationError::OutOfRange {
                field: "stock".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }

        let sku = new.sku.trim();
        let now = Utc::now();
        debug!(product_id = new.product_id, sku = %sku, "Inserting variant");

        let sql = format!(
            r#"
            INSERT INTO product_variants
                (product_id, sku, attributes, price_cents, stock, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            RETURNING {VARIANT_COLUMNS}
            "#
        );
        let inserted = sqlx::query_as::<_, ProductVariant>(&sql)
            .bind(new.product_id)
            .bind(sku)
            .bind(Json(&new.attributes))
            .bind(new.price_cents)
            .bind(new.stock)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from);

        match inserted {
            Ok(variant) => Ok(variant),
            Err(e) if e.is_unique_violation() => {
                Err(CoreError::conflict(format!("SKU '{sku}' already exists")).into())
            }
            Err(e) if e.is_foreign_key_violation() => {
                Err(CoreError::not_found("Product", new.product_id).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_variant(&self, variant_id: i64) -> StoreResult<ProductVariant> {
        let mut conn = self.pool.acquire().await?;
        fetch_variant(&mut conn, variant_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Variant", variant_id).into())
    }

    /// Gets a sellable variant joined with its product name.
    pub async fn get_variant_with_product(&self, variant_id: i64) -> StoreResult<VariantListing> {
        let mut conn = self.pool.acquire().await?;
        fetch_listing(&mut conn, variant_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Variant", variant_id).into())
    }

    /// Changes a variant's current price. Committed orders keep the price
    /// they were charged.
    pub async fn set_variant_price(
        &self,
        variant_id: i64,
        price_cents: i64,
    ) -> StoreResult<ProductVariant> {
        validate_price_cents(price_cents)?;

        let sql = format!(
            r#"
            UPDATE product_variants
            SET price_cents = ?1, updated_at = ?2
            WHERE id = ?3
            RETURNING {VARIANT_COLUMNS}
            "#
        );
        let variant = sqlx::query_as::<_, ProductVariant>(&sql)
            .bind(price_cents)
            .bind(Utc::now())
            .bind(variant_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CoreError::not_found("Variant", variant_id))?;

        info!(variant_id, price_cents, "Variant price changed");
        Ok(variant)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
