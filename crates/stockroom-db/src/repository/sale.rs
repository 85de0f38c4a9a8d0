//! # Sale Repository
//!
//! Binding sale commit and plain sale reads.
//!
//! ## Commit Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Commit (one transaction)                     │
//! │                                                                         │
//! │  SaleOrder (validated, aggregated, ids ascending)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. BEGIN                                                              │
//! │  2. lock_products(ids)      ← ascending order, bounded wait            │
//! │  3. price_locked()          ← missing → inactive → stock, first fails  │
//! │  4. INSERT sale header      ← total from locked prices only            │
//! │  5. per product:                                                       │
//! │       INSERT sale line                                                 │
//! │       UPDATE stock_qty = stock_qty - qty   ← relative, never absolute  │
//! │  6. COMMIT                                                             │
//! │                                                                         │
//! │  Any failure before 6 → ROLLBACK: no header, no lines, no stock change │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sales are immutable; there is no update path.

use chrono::Utc;
use sqlx::SqlitePool;
use stockroom_core::{CoreError, PricedSale, Sale, SaleDetail, SaleLine, SaleOrder, SaleReceipt};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::product;

const HEADER_SELECT: &str = r#"
    SELECT s.id, s.created_at, s.total_cents, s.payment_method, s.seller_id,
           u.name AS seller_name
    FROM sales s
    LEFT JOIN users u ON u.id = s.seller_id
"#;

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Atomically commits a sale that can never oversell.
    ///
    /// ## Errors
    /// - `ProductNotFound` if a product vanished before the lock
    /// - `ProductInactive` if any product is deactivated
    /// - `InsufficientStock` on the first product whose stock is short
    /// - `LockTimeout` if the lock wait expired
    pub async fn commit(&self, order: &SaleOrder) -> DbResult<SaleReceipt> {
        let product_ids = order.product_ids();
        debug!(
            seller_id = order.seller_id,
            payment_method = %order.payment_method,
            products = ?product_ids,
            "Committing sale"
        );

        let mut tx = self.pool.begin().await?;

        let locked = product::lock_products(&mut *tx, &product_ids).await?;

        let PricedSale { lines, total } = match order.price_locked(&locked) {
            Ok(priced) => priced,
            Err(err) => {
                warn!(seller_id = order.seller_id, error = %err, "Sale rejected");
                return Err(DbError::Domain(err));
            }
        };
        let now = Utc::now();

        let sale_id = sqlx::query(
            "INSERT INTO sales (created_at, total_cents, payment_method, seller_id) VALUES (?, ?, ?, ?)",
        )
        .bind(now)
        .bind(total.cents())
        .bind(order.payment_method)
        .bind(order.seller_id)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for line in &lines {
            sqlx::query(
                "INSERT INTO sale_lines (sale_id, product_id, quantity, unit_price_cents) VALUES (?, ?, ?, ?)",
            )
            .bind(sale_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE products SET stock_qty = stock_qty - ?, updated_at = ? WHERE id = ?")
                .bind(line.quantity)
                .bind(now)
                .bind(line.product_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        info!(
            sale_id,
            seller_id = order.seller_id,
            total = %total,
            lines = lines.len(),
            "Sale committed"
        );

        Ok(SaleReceipt {
            sale_id,
            total_cents: total.cents(),
            payment_method: order.payment_method,
            lines,
        })
    }

    /// Gets a sale with its lines.
    pub async fn get(&self, id: i64) -> DbResult<Option<SaleDetail>> {
        let mut conn = self.pool.acquire().await?;

        let header = sqlx::query_as::<_, Sale>(&format!("{} WHERE s.id = ?", HEADER_SELECT))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        let Some(sale) = header else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, SaleLine>(
            r#"
            SELECT l.product_id, p.description AS description, l.quantity, l.unit_price_cents
            FROM sale_lines l
            LEFT JOIN products p ON p.id = l.product_id
            WHERE l.sale_id = ?
            ORDER BY l.product_id
            "#,
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(Some(SaleDetail { sale, lines }))
    }

    /// Gets a sale or fails with `SaleNotFound`.
    pub async fn require(&self, id: i64) -> DbResult<SaleDetail> {
        self.get(id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(id).into())
    }

    /// Lists sales, newest first.
    pub async fn list(&self) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "{} ORDER BY s.created_at DESC, s.id DESC",
            HEADER_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
