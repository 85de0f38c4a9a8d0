//! # Margin Range Repository
//!
//! Storage for margin ranges and purchase-price → sale-price resolution.
//!
//! ## Overlap Check
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  INSERT / UPDATE candidate [a, b]         (inside ONE transaction)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  write the row first ← takes the writer lock, serializes range writes  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT ... WHERE id <> :self AND min_cents <= b                        │
//! │         ORDER BY min_cents DESC LIMIT 1   ← predecessor of b           │
//! │       │                                                                 │
//! │       ├── none, or predecessor.max < a  → COMMIT                        │
//! │       └── predecessor.max >= a          → MarginRangeOverlap, ROLLBACK  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stored ranges are pairwise disjoint, so the predecessor of `b` is the only
//! range that can reach back to `a`.

use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;
use stockroom_core::margin::{MarginBounds, MarginRange, MarginRangeInput, MarkupStrategy};
use stockroom_core::{CoreError, Money};
use tracing::{debug, info, warn};

use crate::error::DbResult;

const RANGE_COLUMNS: &str = "id, min_cents, max_cents, markup_bps";

/// Repository for margin ranges.
#[derive(Debug, Clone)]
pub struct MarginRangeRepository {
    pool: SqlitePool,
    markup: Arc<dyn MarkupStrategy>,
}

impl MarginRangeRepository {
    /// Creates a new MarginRangeRepository.
    pub fn new(pool: SqlitePool, markup: Arc<dyn MarkupStrategy>) -> Self {
        MarginRangeRepository { pool, markup }
    }

    /// Lists all ranges ordered by ascending `min`.
    pub async fn list(&self) -> DbResult<Vec<MarginRange>> {
        let ranges = sqlx::query_as::<_, MarginRange>(&format!(
            "SELECT {} FROM margin_ranges ORDER BY min_cents ASC",
            RANGE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(ranges)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<MarginRange>> {
        let range = sqlx::query_as::<_, MarginRange>(&format!(
            "SELECT {} FROM margin_ranges WHERE id = ?",
            RANGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(range)
    }

    /// Inserts a range, rejecting any closed-closed overlap.
    pub async fn insert(&self, input: &MarginRangeInput) -> DbResult<MarginRange> {
        debug!(
            min = input.bounds.min_cents(),
            max = ?input.bounds.max_cents(),
            markup_bps = input.markup.bps(),
            "Inserting margin range"
        );

        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            "INSERT INTO margin_ranges (min_cents, max_cents, markup_bps) VALUES (?, ?, ?)",
        )
        .bind(input.bounds.min_cents())
        .bind(input.bounds.max_cents())
        .bind(input.markup.bps())
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        ensure_disjoint(&mut *tx, id, &input.bounds).await?;

        tx.commit().await?;

        info!(id, "Margin range created");
        Ok(to_range(id, input))
    }

    /// Updates a range, rejecting any overlap with the other ranges.
    pub async fn update(&self, id: i64, input: &MarginRangeInput) -> DbResult<MarginRange> {
        debug!(id, "Updating margin range");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE margin_ranges SET min_cents = ?, max_cents = ?, markup_bps = ? WHERE id = ?",
        )
        .bind(input.bounds.min_cents())
        .bind(input.bounds.max_cents())
        .bind(input.markup.bps())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::MarginRangeNotFound(id).into());
        }

        ensure_disjoint(&mut *tx, id, &input.bounds).await?;

        tx.commit().await?;

        info!(id, "Margin range updated");
        Ok(to_range(id, input))
    }

    /// Deletes a range. No coverage checks are made.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM margin_ranges WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::MarginRangeNotFound(id).into());
        }

        info!(id, "Margin range deleted");
        Ok(())
    }

    /// Resolves the sale price for a purchase price.
    ///
    /// ## Errors
    /// - `NoMarginRange` when no range covers the price
    pub async fn resolve_sale_price(&self, purchase_price: Money) -> DbResult<Money> {
        let mut conn = self.pool.acquire().await?;
        resolve_sale_price(&mut *conn, self.markup.as_ref(), purchase_price).await
    }
}

fn to_range(id: i64, input: &MarginRangeInput) -> MarginRange {
    MarginRange {
        id,
        min_cents: input.bounds.min_cents(),
        max_cents: input.bounds.max_cents(),
        markup_bps: input.markup.bps(),
    }
}

/// The stored range with the greatest `min <= price_cents`, other than `exclude`.
async fn predecessor(
    conn: &mut SqliteConnection,
    price_cents: i64,
    exclude: Option<i64>,
) -> DbResult<Option<MarginRange>> {
    let range = sqlx::query_as::<_, MarginRange>(&format!(
        "SELECT {} FROM margin_ranges \
         WHERE (? IS NULL OR id <> ?) AND min_cents <= ? \
         ORDER BY min_cents DESC LIMIT 1",
        RANGE_COLUMNS
    ))
    .bind(exclude)
    .bind(exclude)
    .bind(price_cents)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(range)
}

/// Fails with `MarginRangeOverlap` if `bounds` intersects any range but `id`.
async fn ensure_disjoint(conn: &mut SqliteConnection, id: i64, bounds: &MarginBounds) -> DbResult<()> {
    if let Some(existing) = predecessor(conn, bounds.upper_edge(), Some(id)).await? {
        if bounds.overlaps(&existing.bounds()) {
            warn!(
                min = bounds.min_cents(),
                max = ?bounds.max_cents(),
                conflicting_id = existing.id,
                "Margin range overlaps an existing range"
            );
            return Err(CoreError::MarginRangeOverlap {
                min_cents: bounds.min_cents(),
                max_cents: bounds.max_cents(),
                conflicting_id: existing.id,
            }
            .into());
        }
    }
    Ok(())
}

/// The range containing `price_cents`, if any.
pub(crate) async fn covering_range(
    conn: &mut SqliteConnection,
    price_cents: i64,
) -> DbResult<Option<MarginRange>> {
    let candidate = predecessor(conn, price_cents, None).await?;
    Ok(candidate.filter(|range| range.bounds().contains(price_cents)))
}

/// Resolves a sale price on an existing connection or transaction.
pub(crate) async fn resolve_sale_price(
    conn: &mut SqliteConnection,
    markup: &dyn MarkupStrategy,
    purchase_price: Money,
) -> DbResult<Money> {
    let range = covering_range(conn, purchase_price.cents())
        .await?
        .ok_or(CoreError::NoMarginRange {
            purchase_price_cents: purchase_price.cents(),
        })?;

    let sale_price = markup.sale_price(purchase_price, &range)?;
    debug!(
        purchase = %purchase_price,
        sale = %sale_price,
        range_id = range.id,
        "Resolved sale price"
    );
    Ok(sale_price)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::test_support::memory_db;
    use stockroom_core::margin::MarkupRate;

    fn input(min: i64, max: Option<i64>, bps: u32) -> MarginRangeInput {
        MarginRangeInput {
            bounds: MarginBounds::new(min, max).unwrap(),
            markup: MarkupRate::from_bps(bps),
        }
    }

    #[tokio::test]
    async fn test_resolve_sale_price_across_ranges() {
        let db = memory_db().await;
        let repo = db.margins();
        repo.insert(&input(0, Some(10_000), 1000)).await.unwrap();
        repo.insert(&input(10_001, None, 500)).await.unwrap();

        // 50.00 → 55.00, 200.00 → 210.00
        let low = repo.resolve_sale_price(Money::from_cents(5_000)).await.unwrap();
        let high = repo.resolve_sale_price(Money::from_cents(20_000)).await.unwrap();
        assert_eq!(low.cents(), 5_500);
        assert_eq!(high.cents(), 21_000);

        // Both endpoints are inside
        let edge = repo.resolve_sale_price(Money::from_cents(10_000)).await.unwrap();
        assert_eq!(edge.cents(), 11_000);
    }

    #[tokio::test]
    async fn test_shared_endpoint_is_rejected() {
        let db = memory_db().await;
        let repo = db.margins();
        repo.insert(&input(0, Some(10_000), 1000)).await.unwrap();

        let err = repo.insert(&input(10_000, Some(20_000), 500)).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::MarginRangeOverlap { .. })
        ));

        // Rejected write left nothing behind
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_overlap_with_unbounded_tail() {
        let db = memory_db().await;
        let repo = db.margins();
        repo.insert(&input(10_000, None, 500)).await.unwrap();

        assert!(repo.insert(&input(50_000, Some(60_000), 300)).await.is_err());
        assert!(repo.insert(&input(0, None, 300)).await.is_err());
        assert!(repo.insert(&input(0, Some(9_999), 300)).await.is_ok());
    }

    #[tokio::test]
    async fn test_gap_in_coverage_is_not_found() {
        let db = memory_db().await;
        let repo = db.margins();
        repo.insert(&input(0, Some(1_000), 1000)).await.unwrap();
        repo.insert(&input(5_000, Some(9_000), 1000)).await.unwrap();

        let err = repo
            .resolve_sale_price(Money::from_cents(3_000))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::NoMarginRange {
                purchase_price_cents: 3_000
            })
        ));
    }

    #[tokio::test]
    async fn test_update_excludes_itself() {
        let db = memory_db().await;
        let repo = db.margins();
        let low = repo.insert(&input(0, Some(10_000), 1000)).await.unwrap();
        repo.insert(&input(20_000, None, 500)).await.unwrap();

        // Widening into its own old interval is fine
        let updated = repo.update(low.id, &input(0, Some(15_000), 1200)).await.unwrap();
        assert_eq!(updated.max_cents, Some(15_000));

        // Reaching the neighbour is not, and the row keeps its old values
        assert!(repo.update(low.id, &input(0, Some(20_000), 1200)).await.is_err());
        let stored = repo.get_by_id(low.id).await.unwrap().unwrap();
        assert_eq!(stored.max_cents, Some(15_000));
        assert_eq!(stored.markup_bps, 1200);
    }

    #[tokio::test]
    async fn test_list_is_ordered_and_delete_reports_missing() {
        let db = memory_db().await;
        let repo = db.margins();
        let tail = repo.insert(&input(10_001, None, 500)).await.unwrap();
        repo.insert(&input(0, Some(10_000), 1000)).await.unwrap();

        let mins: Vec<i64> = repo.list().await.unwrap().iter().map(|r| r.min_cents).collect();
        assert_eq!(mins, vec![0, 10_001]);

        repo.delete(tail.id).await.unwrap();
        assert!(matches!(
            repo.delete(tail.id).await,
            Err(DbError::Domain(CoreError::MarginRangeNotFound(_)))
        ));

        // The deleted tail no longer covers high prices
        assert!(repo.resolve_sale_price(Money::from_cents(50_000)).await.is_err());
    }

    #[tokio::test]
    async fn test_update_missing_range() {
        let db = memory_db().await;
        assert!(matches!(
            db.margins().update(999, &input(0, None, 100)).await,
            Err(DbError::Domain(CoreError::MarginRangeNotFound(999)))
        ));
    }
}
