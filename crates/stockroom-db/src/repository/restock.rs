//! # Restock Repository
//!
//! All-or-nothing batch stock and price adjustment.
//!
//! Entries arrive already validated (positive deltas, well-formed prices).
//! Existence, the active flag and the resulting stock are checked against
//! locked rows before the first entry is applied, so one bad entry leaves
//! every product untouched.
//!
//! `stock_qty = MAX(stock_qty + delta, 0)` is relative, so a sale debit
//! waiting on the same lock composes with it in either order.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqlitePool;
use stockroom_core::validation::RestockEntry;
use stockroom_core::{CoreError, RestockOutcome};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::product;

/// Repository for restock batches.
#[derive(Debug, Clone)]
pub struct RestockRepository {
    pool: SqlitePool,
}

impl RestockRepository {
    /// Creates a new RestockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RestockRepository { pool }
    }

    /// Applies a batch in one transaction.
    ///
    /// Entries for the same product are applied in input order; the last
    /// price given for a product wins.
    ///
    /// ## Returns
    /// Distinct product count and post-update snapshots, ascending by id.
    pub async fn apply(&self, entries: &[RestockEntry]) -> DbResult<RestockOutcome> {
        let mut ids: Vec<i64> = entries.iter().map(|e| e.product_id).collect();
        ids.sort_unstable();
        ids.dedup();

        debug!(entries = entries.len(), products = ids.len(), "Applying restock");

        let mut tx = self.pool.begin().await?;

        let locked = product::lock_products(&mut *tx, &ids).await?;

        if let Some(missing) = ids.iter().find(|id| !locked.contains_key(*id)) {
            warn!(product_id = *missing, "Restock rejected: unknown product");
            return Err(DbError::Domain(CoreError::ProductNotFound(*missing)));
        }
        if let Some(inactive) = ids.iter().map(|id| &locked[id]).find(|p| !p.is_active) {
            warn!(product_id = inactive.id, "Restock rejected: inactive product");
            return Err(DbError::Domain(CoreError::ProductInactive {
                product_id: inactive.id,
                description: inactive.description.clone(),
            }));
        }

        // Deltas summed per product must fit the stored stock count.
        let mut projected: HashMap<i64, i64> = HashMap::with_capacity(ids.len());
        for entry in entries {
            let product = &locked[&entry.product_id];
            let stock = projected.entry(entry.product_id).or_insert(product.stock_qty);
            *stock = match stock.checked_add(entry.quantity_delta) {
                Some(sum) => sum.max(0),
                None => {
                    warn!(product_id = product.id, "Restock rejected: stock overflow");
                    return Err(DbError::Domain(CoreError::StockOverflow {
                        product_id: product.id,
                        description: product.description.clone(),
                        stock_qty: *stock,
                        delta: entry.quantity_delta,
                    }));
                }
            };
        }

        let now = Utc::now();
        for entry in entries {
            sqlx::query(
                r#"
                UPDATE products SET
                    stock_qty = MAX(stock_qty + ?, 0),
                    purchase_price_cents = COALESCE(?, purchase_price_cents),
                    sale_price_cents = COALESCE(?, sale_price_cents),
                    updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(entry.quantity_delta)
            .bind(entry.new_purchase_price.map(|m| m.cents()))
            .bind(entry.new_sale_price.map(|m| m.cents()))
            .bind(now)
            .bind(entry.product_id)
            .execute(&mut *tx)
            .await?;
        }

        let updated = product::fetch_many(&mut *tx, &ids).await?;
        tx.commit().await?;

        let mut products: Vec<_> = updated.into_values().collect();
        products.sort_by_key(|p| p.id);

        info!(products = products.len(), "Restock applied");
        Ok(RestockOutcome {
            updated: products.len(),
            products,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{memory_db, new_product};
    use stockroom_core::Money;

    fn entry(product_id: i64, delta: i64) -> RestockEntry {
        RestockEntry {
            product_id,
            quantity_delta: delta,
            new_purchase_price: None,
            new_sale_price: None,
        }
    }

    #[tokio::test]
    async fn test_restock_is_additive() {
        let db = memory_db().await;
        let p = db.products().insert(&new_product("A", 100, 2)).await.unwrap();

        db.restocks().apply(&[entry(p.id, 5)]).await.unwrap();
        let outcome = db.restocks().apply(&[entry(p.id, 5)]).await.unwrap();

        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.products[0].stock_qty, 12);
    }

    #[tokio::test]
    async fn test_restock_overwrites_prices() {
        let db = memory_db().await;
        let p = db.products().insert(&new_product("A", 100, 0)).await.unwrap();

        let outcome = db
            .restocks()
            .apply(&[RestockEntry {
                product_id: p.id,
                quantity_delta: 4,
                new_purchase_price: Some(Money::from_cents(80)),
                new_sale_price: Some(Money::from_cents(130)),
            }])
            .await
            .unwrap();

        let after = &outcome.products[0];
        assert_eq!(after.stock_qty, 4);
        assert_eq!(after.purchase_price_cents, 80);
        assert_eq!(after.sale_price_cents, 130);
    }

    #[tokio::test]
    async fn test_duplicate_entries_count_once() {
        let db = memory_db().await;
        let a = db.products().insert(&new_product("A", 100, 0)).await.unwrap();
        let b = db.products().insert(&new_product("B", 100, 0)).await.unwrap();

        let outcome = db
            .restocks()
            .apply(&[entry(b.id, 1), entry(a.id, 2), entry(b.id, 3)])
            .await
            .unwrap();

        assert_eq!(outcome.updated, 2);
        assert_eq!(outcome.products[0].id, a.id);
        assert_eq!(outcome.products[1].stock_qty, 4);
    }

    #[tokio::test]
    async fn test_unknown_or_inactive_product_applies_nothing() {
        let db = memory_db().await;
        let a = db.products().insert(&new_product("A", 100, 1)).await.unwrap();
        let b = db.products().insert(&new_product("B", 100, 1)).await.unwrap();

        assert!(matches!(
            db.restocks().apply(&[entry(a.id, 5), entry(777, 1)]).await,
            Err(DbError::Domain(CoreError::ProductNotFound(777)))
        ));

        db.products().deactivate(b.id).await.unwrap();
        assert!(matches!(
            db.restocks().apply(&[entry(a.id, 5), entry(b.id, 1)]).await,
            Err(DbError::Domain(CoreError::ProductInactive { .. }))
        ));

        let a_after = db.products().get_by_id(a.id).await.unwrap().unwrap();
        assert_eq!(a_after.stock_qty, 1);
    }

    #[tokio::test]
    async fn test_overflowing_delta_applies_nothing() {
        let db = memory_db().await;
        let a = db.products().insert(&new_product("A", 100, 1)).await.unwrap();
        let b = db.products().insert(&new_product("B", 100, 10)).await.unwrap();

        // Each delta fits alone; the two entries for B together do not.
        let half = i64::MAX / 2 + 1;
        let err = db
            .restocks()
            .apply(&[entry(a.id, 5), entry(b.id, half), entry(b.id, half)])
            .await
            .unwrap_err();

        match err {
            DbError::Domain(CoreError::StockOverflow {
                product_id,
                stock_qty,
                delta,
                ..
            }) => {
                assert_eq!(product_id, b.id);
                assert_eq!(stock_qty, 10 + half);
                assert_eq!(delta, half);
            }
            other => panic!("expected StockOverflow, got {:?}", other),
        }

        let a_after = db.products().get_by_id(a.id).await.unwrap().unwrap();
        let b_after = db.products().get_by_id(b.id).await.unwrap().unwrap();
        assert_eq!(a_after.stock_qty, 1);
        assert_eq!(b_after.stock_qty, 10);
    }
}
