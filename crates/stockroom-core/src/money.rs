//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Purchase price 19.99 marked up 10% must be exactly 21.99, every time. │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    1999 cents × 11000 / 10000 = 2198.9 → 2199 cents (rounded once)     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::money::Money;
//!
//! let price = Money::from_cents(1099); // 10.99
//! let line = price.checked_mul_quantity(3).unwrap();
//! assert_eq!(line.cents(), 3297);
//!
//! // Arithmetic never wraps
//! assert!(price.checked_mul_quantity(i64::MAX).is_none());
//!
//! // Payload text is parsed exactly, never through f64
//! assert_eq!(Money::parse_decimal("10.99").unwrap().cents(), 1099);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::margin::MarkupRate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.purchase_price ──► MarginRange markup ──► Product.sale_price   │
/// │                                                                         │
/// │  Product.sale_price ──┬──► QuotationLine.unit_price (snapshot)          │
/// │                       └──► SaleLine.unit_price (read under lock)        │
/// │                                                                         │
/// │  Σ line subtotals ──► Quotation.total / Sale.total                     │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity, or `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(2000);
    /// assert_eq!(unit_price.checked_mul_quantity(3).map(|m| m.cents()), Some(6000));
    /// ```
    #[inline]
    pub const fn checked_mul_quantity(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts, or `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Largest quantity this unit price can be multiplied by without
    /// overflowing.
    #[inline]
    pub const fn max_quantity(&self) -> i64 {
        if self.0 == 0 {
            i64::MAX
        } else {
            (i64::MAX / self.0).abs()
        }
    }

    /// Applies a markup and returns the marked-up amount, or `None` when the
    /// result does not fit in cents.
    ///
    /// ## Implementation
    /// Integer math: `(amount * (10000 + bps) + 5000) / 10000`.
    /// The +5000 rounds half up, once, on the final amount.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::margin::MarkupRate;
    /// use stockroom_core::money::Money;
    ///
    /// let purchase = Money::from_cents(5000); // 50.00
    /// let sale = purchase.apply_markup(MarkupRate::from_bps(1000)).unwrap(); // +10%
    /// assert_eq!(sale.cents(), 5500);
    /// ```
    pub fn apply_markup(&self, rate: MarkupRate) -> Option<Money> {
        // i128 keeps large purchase prices from overflowing the intermediate
        let factor = 10_000_i128 + i128::from(rate.bps());
        let cents = (i128::from(self.0) * factor + 5_000) / 10_000;
        i64::try_from(cents).ok().map(Money)
    }

    /// Parses a decimal amount (`"12"`, `"12.5"`, `"12.50"`) into cents.
    ///
    /// ## Rules
    /// - Optional leading `-`
    /// - At most two fractional digits
    /// - No exponent, no thousands separators
    ///
    /// Returns `None` when the text is not an exact cent amount.
    pub fn parse_decimal(text: &str) -> Option<Money> {
        let text = text.trim();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };

        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return None;
        }
        if fraction.len() > 2 {
            return None;
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return None;
        }

        let whole_cents = if whole.is_empty() {
            0
        } else {
            whole.parse::<i64>().ok()?.checked_mul(100)?
        };
        let fraction_cents = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().ok()? * 10,
            _ => fraction.parse::<i64>().ok()?,
        };

        let cents = whole_cents.checked_add(fraction_cents)?;
        Some(Money(if negative { -cents } else { cents }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display for logs and receipts: `12.34`, `-5.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-5.50");
        assert_eq!(format!("{}", Money::zero()), "0.00");
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!(a.checked_add(b), Some(Money::from_cents(1500)));
        assert_eq!(a.checked_mul_quantity(3), Some(Money::from_cents(3000)));
    }

    #[test]
    fn test_checked_arithmetic_overflow() {
        let price = Money::from_cents(2000);
        assert!(price.checked_mul_quantity(9_000_000_000_000_000_000).is_none());
        assert!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)).is_none());

        let max = price.max_quantity();
        assert!(price.checked_mul_quantity(max).is_some());
        assert!(price.checked_mul_quantity(max + 1).is_none());
        assert_eq!(Money::zero().max_quantity(), i64::MAX);
    }

    #[test]
    fn test_markup_overflow_is_none() {
        let huge = Money::from_cents(i64::MAX - 10);
        assert!(huge.apply_markup(MarkupRate::from_bps(1000)).is_none());
        assert_eq!(
            huge.apply_markup(MarkupRate::from_bps(0)),
            Some(Money::from_cents(i64::MAX - 10))
        );
    }

    #[test]
    fn test_markup_exact() {
        // 50.00 at 10% → 55.00, 200.00 at 5% → 210.00
        assert_eq!(
            Money::from_cents(5000)
                .apply_markup(MarkupRate::from_bps(1000))
                .unwrap()
                .cents(),
            5500
        );
        assert_eq!(
            Money::from_cents(20000)
                .apply_markup(MarkupRate::from_bps(500))
                .unwrap()
                .cents(),
            21000
        );
    }

    #[test]
    fn test_markup_rounds_half_up_once() {
        // 19.99 × 1.10 = 21.989 → 21.99
        assert_eq!(
            Money::from_cents(1999)
                .apply_markup(MarkupRate::from_bps(1000))
                .unwrap()
                .cents(),
            2199
        );
        // 0.05 × 1.10 = 0.055 → 0.06
        assert_eq!(
            Money::from_cents(5)
                .apply_markup(MarkupRate::from_bps(1000))
                .unwrap()
                .cents(),
            6
        );
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Money::parse_decimal("12").map(|m| m.cents()), Some(1200));
        assert_eq!(Money::parse_decimal("12.5").map(|m| m.cents()), Some(1250));
        assert_eq!(Money::parse_decimal(" 12.05 ").map(|m| m.cents()), Some(1205));
        assert_eq!(Money::parse_decimal(".5").map(|m| m.cents()), Some(50));
        assert_eq!(Money::parse_decimal("-3.10").map(|m| m.cents()), Some(-310));

        assert!(Money::parse_decimal("").is_none());
        assert!(Money::parse_decimal(".").is_none());
        assert!(Money::parse_decimal("12.345").is_none());
        assert!(Money::parse_decimal("1e3").is_none());
        assert!(Money::parse_decimal("12,50").is_none());
        assert!(Money::parse_decimal("abc").is_none());
    }
}
