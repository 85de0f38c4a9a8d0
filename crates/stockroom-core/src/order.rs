//! # Order Lines
//!
//! Pure pricing of requested product lists, and aggregation of sale requests.
//!
//! ## Two Pricing Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Quotation (non-binding)            Sale (binding)                      │
//! │  ───────────────────────            ──────────────                      │
//! │  catalog snapshot, no lock          rows locked in ascending id order   │
//! │        │                                  │                             │
//! │        ▼                                  ▼                             │
//! │  price_order() ← THIS MODULE        price read under the lock           │
//! │        │                                  │                             │
//! │        ▼                                  ▼                             │
//! │  lines frozen into the quotation    SaleOrder::price_locked()           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{PaymentMethod, Product, ReceiptLine};

// =============================================================================
// Quotation Pricing
// =============================================================================

/// One requested line of a quotation payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItem {
    pub product_id: i64,
    /// Already clamped to at least 1.
    pub quantity: i64,
}

impl OrderItem {
    /// Builds an item; a missing quantity defaults to 1 and values below 1
    /// are clamped up to 1.
    pub fn new(product_id: i64, quantity: Option<i64>) -> Self {
        OrderItem {
            product_id,
            quantity: quantity.unwrap_or(1).max(1),
        }
    }
}

/// A line priced from a catalog snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricedLine {
    pub product_id: i64,
    pub description: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub subtotal_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricedOrder {
    pub lines: Vec<PricedLine>,
    pub total_cents: i64,
}

impl PricedOrder {
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Distinct product ids referenced by a list of items, ascending.
pub fn distinct_ids(items: &[OrderItem]) -> Vec<i64> {
    let mut ids: Vec<i64> = items.iter().map(|i| i.product_id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Prices items against a catalog snapshot.
///
/// ## Rules
/// - Line order follows the request order; duplicates stay separate lines
/// - `unit_price = product.sale_price` at snapshot time
/// - Any id missing from the snapshot fails the whole computation
/// - A subtotal or total that does not fit in cents rejects the offending
///   `items[i].quantity`
pub fn price_order(items: &[OrderItem], catalog: &HashMap<i64, Product>) -> CoreResult<PricedOrder> {
    let mut lines = Vec::with_capacity(items.len());
    let mut total = Money::zero();

    for (index, item) in items.iter().enumerate() {
        let product = catalog
            .get(&item.product_id)
            .ok_or(CoreError::ProductNotFound(item.product_id))?;

        let unit_price = product.sale_price();
        let field = format!("items[{}].quantity", index);
        let subtotal = line_subtotal(unit_price, item.quantity, &field)?;
        total = total
            .checked_add(subtotal)
            .ok_or_else(|| quantity_out_of_range(&field, unit_price))?;

        lines.push(PricedLine {
            product_id: product.id,
            description: product.description.clone(),
            unit_price_cents: unit_price.cents(),
            quantity: item.quantity,
            subtotal_cents: subtotal.cents(),
        });
    }

    Ok(PricedOrder {
        lines,
        total_cents: total.cents(),
    })
}

fn quantity_out_of_range(field: &str, unit_price: Money) -> CoreError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 1,
        max: unit_price.max_quantity(),
    }
    .into()
}

fn line_subtotal(unit_price: Money, quantity: i64, field: &str) -> CoreResult<Money> {
    unit_price
        .checked_mul_quantity(quantity)
        .ok_or_else(|| quantity_out_of_range(field, unit_price))
}

// =============================================================================
// Sale Aggregation
// =============================================================================

/// A validated sale request with quantities merged per product.
///
/// `BTreeMap` keeps the product ids in ascending order, which is the lock
/// acquisition order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleOrder {
    pub payment_method: PaymentMethod,
    pub seller_id: i64,
    quantities: BTreeMap<i64, i64>,
    /// Request index of the first line naming each product, for error fields.
    first_index: BTreeMap<i64, usize>,
}

impl SaleOrder {
    /// Validates and aggregates a sale request.
    ///
    /// ## Rules
    /// - At least one line
    /// - Every quantity a positive integer (no clamping for sales)
    /// - Duplicate product ids are summed
    pub fn new(
        payment_method: PaymentMethod,
        seller_id: i64,
        lines: &[(i64, i64)],
    ) -> Result<Self, ValidationError> {
        if lines.is_empty() {
            return Err(ValidationError::required("items"));
        }

        let mut quantities: BTreeMap<i64, i64> = BTreeMap::new();
        let mut first_index: BTreeMap<i64, usize> = BTreeMap::new();
        for (index, (product_id, quantity)) in lines.iter().enumerate() {
            if *quantity <= 0 {
                return Err(ValidationError::must_be_positive(format!(
                    "items[{}].quantity",
                    index
                )));
            }
            first_index.entry(*product_id).or_insert(index);
            let entry = quantities.entry(*product_id).or_insert(0);
            *entry = entry.checked_add(*quantity).ok_or_else(|| ValidationError::OutOfRange {
                field: format!("items[{}].quantity", index),
                min: 1,
                max: i64::MAX,
            })?;
        }

        Ok(SaleOrder {
            payment_method,
            seller_id,
            quantities,
            first_index,
        })
    }

    /// Distinct product ids, ascending.
    pub fn product_ids(&self) -> Vec<i64> {
        self.quantities.keys().copied().collect()
    }

    /// `(product_id, required_quantity)` pairs, ascending by id.
    pub fn lines(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.quantities.iter().map(|(id, qty)| (*id, *qty))
    }

    fn quantity_field(&self, product_id: i64) -> String {
        let index = self.first_index.get(&product_id).copied().unwrap_or(0);
        format!("items[{}].quantity", index)
    }

    /// Checks the locked rows and prices the sale from them.
    ///
    /// ## Order of Checks
    /// 1. Every requested id is among the locked rows
    /// 2. Every locked product is active
    /// 3. Every required quantity fits the locked stock
    /// 4. Every subtotal, and their sum, fits in cents
    ///
    /// The first violation aborts; nothing is partially fulfilled.
    pub fn price_locked(&self, locked: &HashMap<i64, Product>) -> CoreResult<PricedSale> {
        for product_id in self.quantities.keys() {
            if !locked.contains_key(product_id) {
                return Err(CoreError::ProductNotFound(*product_id));
            }
        }

        for product_id in self.quantities.keys() {
            let product = &locked[product_id];
            if !product.is_active {
                return Err(CoreError::ProductInactive {
                    product_id: product.id,
                    description: product.description.clone(),
                });
            }
        }

        let mut receipt = Vec::with_capacity(self.quantities.len());
        let mut total = Money::zero();
        for (product_id, required) in self.lines() {
            let product = &locked[&product_id];
            if !product.can_fulfil(required) {
                return Err(CoreError::InsufficientStock {
                    product_id,
                    description: product.description.clone(),
                    available: product.stock_qty,
                    requested: required,
                });
            }

            let unit_price = product.sale_price();
            let field = self.quantity_field(product_id);
            let subtotal = line_subtotal(unit_price, required, &field)?;
            total = total
                .checked_add(subtotal)
                .ok_or_else(|| quantity_out_of_range(&field, unit_price))?;

            receipt.push(ReceiptLine {
                product_id,
                description: product.description.clone(),
                quantity: required,
                unit_price_cents: unit_price.cents(),
                subtotal_cents: subtotal.cents(),
            });
        }

        Ok(PricedSale {
            lines: receipt,
            total,
        })
    }
}

/// Receipt lines of a sale priced under lock, ascending by product id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedSale {
    pub lines: Vec<ReceiptLine>,
    pub total: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
