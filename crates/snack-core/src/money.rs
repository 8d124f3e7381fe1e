//! # Money Module
//!
//! Provides the `Money` type for stored monetary values, plus the bridge
//! to `Decimal` used by per-unit pricing.
//!
//! ## Two Kinds of Numbers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  STORED AMOUNTS (Money, i64 cents)     PER-UNIT VALUES (Decimal, 4dp)   │
//! │  ───────────────────────────────       ──────────────────────────────   │
//! │  container_cost      24.00            unit_cost            2.0000       │
//! │  combo_price          2.00            effective price      0.6667       │
//! │  sale total          15.00            profit margin        0.1667       │
//! │  debt amount_paid     8.00                                              │
//! │                                                                         │
//! │  Decimal × quantity ──► from_decimal() ──► Money (banker's rounding)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A box of 24 sold in combos of 3 for 2.00 has a per-unit price of
//! 0.6666..., which cannot be held in cents. It is kept as a `Decimal`
//! and only turned back into cents when multiplied by a quantity.
//!
//! ## Usage
//! ```rust
//! use snack_core::money::Money;
//! use rust_decimal::Decimal;
//!
//! let cost = Money::from_cents(2400); // 24.00
//! let per_unit = cost.to_decimal() / Decimal::from(12);
//! assert_eq!(per_unit, Decimal::new(200, 2));
//!
//! let line = Money::from_decimal(Decimal::new(6667, 4) * Decimal::from(3));
//! assert_eq!(line.cents(), 200);
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents.
///
/// ## Design Decisions
/// - **i64 (signed)**: reports may legitimately go negative (profit below zero)
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **No float constructor**: amounts enter as cents or as `Decimal`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use snack_core::money::Money;
    ///
    /// let price = Money::from_cents(500); // 5.00
    /// assert_eq!(price.cents(), 500);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Converts a decimal amount to cents using banker's rounding.
    ///
    /// ## Bankers Rounding
    /// ```text
    /// 2.0001  → 2.00
    /// 0.125   → 0.12   (half goes to the even cent)
    /// 0.135   → 0.14
    /// ```
    ///
    /// Values outside the i64 range saturate; the amounts handled by a
    /// snack stand never come close.
    pub fn from_decimal(amount: Decimal) -> Self {
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
        let cents = rounded * Decimal::ONE_HUNDRED;
        let cents = cents.to_i64().unwrap_or(if cents.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        });
        Money(cents)
    }

    /// Returns the exact decimal value (two decimal places).
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns `self - other`, floored at zero.
    ///
    /// Used for debt remainders: a debt that received more than its amount
    /// owes nothing, it does not owe a negative balance.
    #[inline]
    pub fn saturating_remaining(&self, paid: Money) -> Money {
        Money((self.0 - paid.0).max(0))
    }

    /// `self + other`, or `None` when the sum leaves the i64 range.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Multiplies a per-unit decimal price by a quantity, rounded to cents.
    ///
    /// ## Example
    /// ```rust
    /// use snack_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// // 3 units of a combo-derived 0.6667 price
    /// let subtotal = Money::line_subtotal(Decimal::new(6667, 4), 3);
    /// assert_eq!(subtotal.cents(), 200);
    /// ```
    pub fn line_subtotal(unit_price: Decimal, qty: i64) -> Money {
        Money::from_decimal(unit_price.saturating_mul(Decimal::from(qty)))
    }

    /// Like [`Money::line_subtotal`], but `None` instead of saturating when
    /// the result does not fit in cents.
    pub fn checked_line_subtotal(unit_price: Decimal, qty: i64) -> Option<Money> {
        unit_price
            .checked_mul(Decimal::from(qty))?
            .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
            .checked_mul(Decimal::ONE_HUNDRED)?
            .to_i64()
            .map(Money)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly rendering. The UI formats amounts itself.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
