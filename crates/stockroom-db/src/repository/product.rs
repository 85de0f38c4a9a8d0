//! # Product Repository
//!
//! Catalog accessor: product reads and writes, plus the row-lock helper
//! shared by the sale and restock paths.
//!
//! ## Row Locks on SQLite
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lock_products(tx, [7, 3, 7, 12])                                       │
//! │       │                                                                 │
//! │       ▼  sort + dedup → [3, 7, 12]                                      │
//! │  UPDATE products SET stock_qty = stock_qty WHERE id = 3   ← writer lock │
//! │  UPDATE products SET stock_qty = stock_qty WHERE id = 7                 │
//! │  UPDATE products SET stock_qty = stock_qty WHERE id = 12                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT ... WHERE id IN (3, 7, 12)        ← authoritative re-read       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The no-op writes go first in the transaction. A competing transaction
//! blocks on the first of them, before it has read anything, and waits at
//! most `busy_timeout`.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;
use stockroom_core::margin::MarkupStrategy;
use stockroom_core::validation::validate_new_product;
use stockroom_core::{CoreError, Money, NewProduct, Product};
use tracing::{debug, info};

use crate::error::DbResult;
use crate::repository::margin;

pub(crate) const PRODUCT_COLUMNS: &str = "id, code, barcode, description, location, \
     stock_max, stock_min, stock_qty, purchase_price_cents, sale_price_cents, \
     supplier_id, category_id, is_active, image, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let product = repo.insert(&new_product).await?;
/// let fetched = repo.get_by_id(product.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    markup: Arc<dyn MarkupStrategy>,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool, markup: Arc<dyn MarkupStrategy>) -> Self {
        ProductRepository { pool, markup }
    }

    /// Gets a product by ID, active or not.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = ?",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a product.
    ///
    /// ## Sale Price
    /// When `sale_price_cents` is `None` it is resolved from the margin
    /// range table inside the same transaction; a purchase price with no
    /// covering range fails the insert.
    ///
    /// ## Errors
    /// - `UniqueViolation` on a code used by an active product, or a used barcode
    /// - `NoMarginRange` when a sale price must be derived and cannot be
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        validate_new_product(product)?;

        debug!(code = %product.code, "Inserting product");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO products (
                code, barcode, description, location,
                stock_max, stock_min, stock_qty,
                purchase_price_cents, sale_price_cents,
                supplier_id, category_id, is_active, image,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?, ?)
            "#,
        )
        .bind(product.code.trim())
        .bind(&product.barcode)
        .bind(product.description.trim())
        .bind(&product.location)
        .bind(product.stock_max)
        .bind(product.stock_min)
        .bind(product.stock_qty)
        .bind(product.purchase_price_cents)
        .bind(product.sale_price_cents.unwrap_or(0))
        .bind(product.supplier_id)
        .bind(product.category_id)
        .bind(&product.image)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        if product.sale_price_cents.is_none() {
            let sale_price = margin::resolve_sale_price(
                &mut *tx,
                self.markup.as_ref(),
                Money::from_cents(product.purchase_price_cents),
            )
            .await?;

            sqlx::query("UPDATE products SET sale_price_cents = ? WHERE id = ?")
                .bind(sale_price.cents())
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        let inserted = fetch_one(&mut *tx, id).await?;
        tx.commit().await?;

        info!(
            id,
            code = %inserted.code,
            sale_price = %inserted.sale_price(),
            "Product created"
        );
        Ok(inserted)
    }

    /// Overwrites the sale price.
    pub async fn set_sale_price(&self, id: i64, price: Money) -> DbResult<Product> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE products SET sale_price_cents = ?, updated_at = ? WHERE id = ?")
            .bind(price.cents())
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(id).into());
        }

        let updated = fetch_one(&mut *tx, id).await?;
        tx.commit().await?;

        debug!(id, sale_price = %price, "Sale price updated");
        Ok(updated)
    }

    /// Soft-deletes a product (sets `is_active = 0`).
    pub async fn deactivate(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(id).into());
        }

        info!(id, "Product deactivated");
        Ok(())
    }

    /// Counts all products (active and inactive).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

async fn fetch_one(conn: &mut SqliteConnection, id: i64) -> DbResult<Product> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {} FROM products WHERE id = ?",
        PRODUCT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(CoreError::ProductNotFound(id))?;

    Ok(product)
}

/// Batch-fetches products by id in one query. Absent ids are simply missing
/// from the map.
pub(crate) async fn fetch_many(
    conn: &mut SqliteConnection,
    ids: &[i64],
) -> DbResult<HashMap<i64, Product>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {} FROM products WHERE id IN (",
        PRODUCT_COLUMNS
    ));
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let products = builder
        .build_query_as::<Product>()
        .fetch_all(&mut *conn)
        .await?;

    Ok(products.into_iter().map(|p| (p.id, p)).collect())
}

/// Locks the given products in ascending id order and re-reads them.
///
/// Must be the first statements of the transaction. Ids that do not exist
/// are absent from the returned map; callers decide whether that is an error.
pub(crate) async fn lock_products(
    conn: &mut SqliteConnection,
    ids: &[i64],
) -> DbResult<HashMap<i64, Product>> {
    let mut ordered = ids.to_vec();
    ordered.sort_unstable();
    ordered.dedup();

    for id in &ordered {
        sqlx::query("UPDATE products SET stock_qty = stock_qty WHERE id = ?")
            .bind(*id)
            .execute(&mut *conn)
            .await?;
    }

    debug!(ids = ?ordered, "Product rows locked");
    fetch_many(conn, &ordered).await
}

// =============================================================================
// Unit Tests
// =============================================================================
