//! # Product Repository
//!
//! Database operations for products: CRUD, barcode lookup and stock
//! adjustments.
//!
//! ## Guarded Decrements
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Stock Decrement Strategy                       │
//! │                                                                     │
//! │  ✗ Absolute update (races with concurrent sales):                   │
//! │      UPDATE products SET stock_quantity = 7 WHERE id = ?            │
//! │                                                                     │
//! │  ✓ Guarded delta update:                                            │
//! │      UPDATE products                                                │
//! │      SET stock_quantity = stock_quantity - ?                        │
//! │      WHERE id = ? AND stock_quantity >= ?                           │
//! │                                                                     │
//! │  Zero rows affected means another transaction consumed the stock    │
//! │  first; the caller aborts instead of driving stock negative.        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kiosco_core::Product;

const PRODUCT_COLUMNS: &str =
    "id, barcode, name, price_cents, stock_quantity, category_id, is_active, \
     created_at, updated_at";

/// Resolves an active product by id, on the caller's connection.
///
/// Used inside the checkout transaction so the read happens in the same
/// transaction as the eventual decrement. Soft-deleted products are
/// invisible to sale paths.
pub async fn find_active_by_id(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND is_active = 1");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(product)
}

/// Applies a guarded stock decrement on the caller's connection.
///
/// ## Returns
/// * `Ok(true)` - stock was decremented
/// * `Ok(false)` - guard failed: not enough stock at write time (the row
///   exists but a concurrent transaction got there first)
pub async fn decrement_stock(
    conn: &mut SqliteConnection,
    id: &str,
    amount: i64,
) -> DbResult<bool> {
    debug!(id = %id, amount = %amount, "Decrementing stock");

    let now = Utc::now();

    let result = sqlx::query(
        "UPDATE products
         SET stock_quantity = stock_quantity - ?2, updated_at = ?3
         WHERE id = ?1 AND stock_quantity >= ?2",
    )
    .bind(id)
    .bind(amount)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY name LIMIT ?1"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Gets a product by its ID (including soft-deleted ones).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its barcode.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - barcode already exists
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(barcode = %product.barcode, "Inserting product");

        sqlx::query(
            "INSERT INTO products (
                id, barcode, name, price_cents, stock_quantity,
                category_id, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&product.id)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.stock_quantity)
        .bind(&product.category_id)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing product's editable fields.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET
                barcode = ?2,
                name = ?3,
                price_cents = ?4,
                stock_quantity = ?5,
                category_id = ?6,
                is_active = ?7,
                updated_at = ?8
             WHERE id = ?1",
        )
        .bind(&product.id)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.stock_quantity)
        .bind(&product.category_id)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Adds stock back (restocking, positive adjustment only).
    pub async fn restock(&self, id: &str, amount: i64) -> DbResult<()> {
        debug!(id = %id, amount = %amount, "Restocking");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products
             SET stock_quantity = stock_quantity + ?2, updated_at = ?3
             WHERE id = ?1",
        )
        .bind(id)
        .bind(amount)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Historical sale lines keep referencing the row, so rows are never
    /// hard-deleted.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();

        let result =
            sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}
