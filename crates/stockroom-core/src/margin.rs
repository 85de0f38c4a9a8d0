//! # Margin Ranges
//!
//! Purchase-price intervals mapped to a markup, used by catalog write paths
//! to derive a sale price.
//!
//! ## Interval Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Closed on BOTH ends: [min, max], max = None is the open-ended tail     │
//! │                                                                         │
//! │   [0, 10000] → 10%        [10001, ∞) → 5%                               │
//! │   ├──────────┤            ├────────────────────►                        │
//! │   0       10000           10001                                         │
//! │                                                                         │
//! │   [0, 10000] + [10000, 20000]  ❌ shared endpoint IS an overlap          │
//! │   [0, 10000] + [10001, 20000]  ✅ disjoint                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The range table is kept pairwise disjoint, so ordering by `min` also orders
//! by `max`. The only existing range that can intersect a candidate `[a, b]`
//! is the one with the greatest `min <= b`; the repository finds it with one
//! indexed lookup and asks [`MarginBounds::overlaps`] to decide.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;

// =============================================================================
// Markup Rate
// =============================================================================

/// Markup represented in basis points (1000 bps = 10%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MarkupRate(u32);

impl MarkupRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        MarkupRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

}

impl fmt::Display for MarkupRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

// =============================================================================
// Bounds
// =============================================================================

/// A validated closed-closed interval of purchase prices, in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MarginBounds {
    min_cents: i64,
    max_cents: Option<i64>,
}

impl MarginBounds {
    /// Builds bounds, rejecting negative minimums and inverted intervals.
    pub fn new(min_cents: i64, max_cents: Option<i64>) -> Result<Self, ValidationError> {
        if min_cents < 0 {
            return Err(ValidationError::OutOfRange {
                field: "min".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
        if let Some(max) = max_cents {
            if max < min_cents {
                return Err(ValidationError::InvalidRange {
                    min: min_cents,
                    max,
                });
            }
        }
        Ok(MarginBounds {
            min_cents,
            max_cents,
        })
    }

    #[inline]
    pub fn min_cents(&self) -> i64 {
        self.min_cents
    }

    #[inline]
    pub fn max_cents(&self) -> Option<i64> {
        self.max_cents
    }

    /// `max` as a comparable upper edge (unbounded → `i64::MAX`).
    #[inline]
    pub fn upper_edge(&self) -> i64 {
        self.max_cents.unwrap_or(i64::MAX)
    }

    pub fn contains(&self, price_cents: i64) -> bool {
        price_cents >= self.min_cents && price_cents <= self.upper_edge()
    }

    /// Closed-closed intersection test. Touching endpoints overlap.
    pub fn overlaps(&self, other: &MarginBounds) -> bool {
        self.min_cents <= other.upper_edge() && other.min_cents <= self.upper_edge()
    }
}

// =============================================================================
// Margin Range
// =============================================================================

/// A stored margin range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MarginRange {
    pub id: i64,
    pub min_cents: i64,
    /// `None` is the unbounded tail.
    pub max_cents: Option<i64>,
    pub markup_bps: u32,
}

impl MarginRange {
    pub fn bounds(&self) -> MarginBounds {
        MarginBounds {
            min_cents: self.min_cents,
            max_cents: self.max_cents,
        }
    }

    #[inline]
    pub fn markup(&self) -> MarkupRate {
        MarkupRate::from_bps(self.markup_bps)
    }
}

/// Validated write payload for insert/update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarginRangeInput {
    pub bounds: MarginBounds,
    pub markup: MarkupRate,
}

// =============================================================================
// Markup Strategy
// =============================================================================

/// Turns a purchase price into a sale price given the covering range.
///
/// The formula is pluggable; [`PercentageMarkup`] is the default.
pub trait MarkupStrategy: fmt::Debug + Send + Sync {
    fn sale_price(&self, purchase_price: Money, range: &MarginRange) -> CoreResult<Money>;
}

/// `sale = purchase × (1 + pct/100)`, rounded half up to the cent.
#[derive(Debug, Clone, Copy, Default)]
pub struct PercentageMarkup;

impl MarkupStrategy for PercentageMarkup {
    fn sale_price(&self, purchase_price: Money, range: &MarginRange) -> CoreResult<Money> {
        purchase_price.apply_markup(range.markup()).ok_or_else(|| {
            let factor = 10_000_i128 + i128::from(range.markup_bps);
            let max = i64::try_from(i128::from(i64::MAX) * 10_000 / factor).unwrap_or(i64::MAX);
            ValidationError::OutOfRange {
                field: "purchase_price".to_string(),
                min: 0,
                max,
            }
            .into()
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
