//! # Quotation Repository
//!
//! Draft, non-binding orders. Quotations never touch stock.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create                               update                            │
//! │  ──────                               ──────                            │
//! │  BEGIN                                BEGIN                             │
//! │  INSERT header (total 0)              UPDATE header (0 rows → NotFound) │
//! │       │                               DELETE all lines                  │
//! │       └───────────────┬───────────────────┘                             │
//! │                       ▼                                                 │
//! │  batch-fetch products → price_order() → INSERT lines → UPDATE total     │
//! │                       │                                                 │
//! │                       ▼                                                 │
//! │  COMMIT   (unknown product anywhere → ROLLBACK, header included)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines are value snapshots; later catalog price changes do not alter them.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use stockroom_core::order::{distinct_ids, price_order};
use stockroom_core::validation::QuotationPayload;
use stockroom_core::{
    CoreError, OrderItem, PricedOrder, Quotation, QuotationDetail, QuotationLine,
    QUOTATION_LIST_LIMIT,
};
use tracing::{debug, info};

use crate::error::DbResult;
use crate::repository::product;

const HEADER_SELECT: &str = r#"
    SELECT q.id, q.client, q.payment_method, q.total_cents, q.seller_id,
           u.name AS seller_name, q.created_at, q.updated_at
    FROM quotations q
    LEFT JOIN users u ON u.id = q.seller_id
"#;

/// Repository for quotation database operations.
#[derive(Debug, Clone)]
pub struct QuotationRepository {
    pool: SqlitePool,
}

impl QuotationRepository {
    /// Creates a new QuotationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        QuotationRepository { pool }
    }

    /// Creates a quotation with freshly priced lines.
    ///
    /// ## Errors
    /// - `ProductNotFound` if any item references an unknown product; no
    ///   header is persisted
    pub async fn create(&self, seller_id: i64, payload: &QuotationPayload) -> DbResult<QuotationDetail> {
        debug!(seller_id, items = payload.items.len(), "Creating quotation");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO quotations (client, payment_method, total_cents, seller_id, created_at, updated_at)
            VALUES (?, ?, 0, ?, ?, ?)
            "#,
        )
        .bind(&payload.client)
        .bind(payload.payment_method)
        .bind(seller_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let priced = write_lines(&mut *tx, id, &payload.items).await?;

        tx.commit().await?;

        info!(id, seller_id, total = %priced.total(), "Quotation created");
        self.require(id).await
    }

    /// Replaces header fields and recomputes every line from the payload.
    pub async fn update(&self, id: i64, payload: &QuotationPayload) -> DbResult<QuotationDetail> {
        debug!(id, items = payload.items.len(), "Updating quotation");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE quotations SET client = ?, payment_method = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&payload.client)
        .bind(payload.payment_method)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::QuotationNotFound(id).into());
        }

        sqlx::query("DELETE FROM quotation_lines WHERE quotation_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let priced = write_lines(&mut *tx, id, &payload.items).await?;

        tx.commit().await?;

        info!(id, total = %priced.total(), "Quotation updated");
        self.require(id).await
    }

    /// Gets a quotation with its lines and the current catalog stock per line.
    pub async fn get(&self, id: i64) -> DbResult<Option<QuotationDetail>> {
        let mut conn = self.pool.acquire().await?;

        let header = sqlx::query_as::<_, Quotation>(&format!("{} WHERE q.id = ?", HEADER_SELECT))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        let Some(quotation) = header else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, QuotationLine>(
            r#"
            SELECT l.product_id, l.description_snapshot, l.unit_price_cents,
                   l.quantity, l.subtotal_cents, p.stock_qty AS current_stock
            FROM quotation_lines l
            LEFT JOIN products p ON p.id = l.product_id
            WHERE l.quotation_id = ?
            ORDER BY l.line_no
            "#,
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(Some(QuotationDetail { quotation, lines }))
    }

    /// Lists the most recent quotations, newest first.
    pub async fn list(&self) -> DbResult<Vec<Quotation>> {
        let quotations = sqlx::query_as::<_, Quotation>(&format!(
            "{} ORDER BY q.created_at DESC, q.id DESC LIMIT ?",
            HEADER_SELECT
        ))
        .bind(QUOTATION_LIST_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(quotations)
    }

    /// Deletes a quotation; its lines go with it.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM quotations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::QuotationNotFound(id).into());
        }

        info!(id, "Quotation deleted");
        Ok(())
    }

    async fn require(&self, id: i64) -> DbResult<QuotationDetail> {
        self.get(id)
            .await?
            .ok_or_else(|| CoreError::QuotationNotFound(id).into())
    }
}

/// Prices `items` against the catalog and writes the lines and total.
async fn write_lines(
    conn: &mut SqliteConnection,
    quotation_id: i64,
    items: &[OrderItem],
) -> DbResult<PricedOrder> {
    let catalog = product::fetch_many(conn, &distinct_ids(items)).await?;
    let priced = price_order(items, &catalog)?;

    for (line_no, line) in priced.lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO quotation_lines (
                quotation_id, line_no, product_id, description_snapshot,
                unit_price_cents, quantity, subtotal_cents
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(quotation_id)
        .bind(line_no as i64)
        .bind(line.product_id)
        .bind(&line.description)
        .bind(line.unit_price_cents)
        .bind(line.quantity)
        .bind(line.subtotal_cents)
        .execute(&mut *conn)
        .await?;
    }

    sqlx::query("UPDATE quotations SET total_cents = ? WHERE id = ?")
        .bind(priced.total_cents)
        .bind(quotation_id)
        .execute(&mut *conn)
        .await?;

    Ok(priced)
}

// =============================================================================
// Unit Tests
// =============================================================================
