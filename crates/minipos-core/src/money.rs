//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A committed sale must satisfy                                          │
//! │    final_amount == Σ line.total_price − discount + tax                  │
//! │  EXACTLY. With integer minor units (cents) it always does.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use minipos_core::money::Money;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let line = price.multiply_quantity(2); // $21.98
//! assert_eq!((line - Money::from_cents(98)).cents(), 2100);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

use crate::types::{LoyaltyRate, TaxRate};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: lets `total - discount` be checked for sign instead of
///   wrapping
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Transparent serde**: serializes as a bare integer on the wire
///
/// ## Where Money is Used
/// ```text
/// Product.price ──► SaleLineItem.unit_price ──► SaleLineItem.total_price
///                                                      │
///                         Σ ───────────────────────────┘
///                         ▼
///                   Sale.total_amount − discount + tax = Sale.final_amount
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
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

    /// Multiplies a unit price by a quantity to get a line total.
    ///
    /// ## Example
    /// ```rust
    /// use minipos_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Like [`Money::multiply_quantity`], but returns `None` on overflow.
    ///
    /// Used on caller-supplied prices, which are not bounded by the catalog.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Subtracts `other`, returning `None` on overflow.
    #[inline]
    pub const fn checked_sub(&self, other: Money) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Calculates tax with half-up rounding in integer math.
    ///
    /// ## Implementation
    /// `(amount * bps + 5000) / 10000`, computed in i128.
    ///
    /// ## Example
    /// ```rust
    /// use minipos_core::money::Money;
    /// use minipos_core::types::TaxRate;
    ///
    /// let taxable = Money::from_cents(1000);
    /// assert_eq!(taxable.calculate_tax(TaxRate::from_bps(825)).cents(), 83);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents as i64)
    }

    /// Loyalty points earned for spending this amount.
    ///
    /// `floor(whole currency units × rate)`; never negative.
    ///
    /// ## Example
    /// ```rust
    /// use minipos_core::money::Money;
    /// use minipos_core::types::LoyaltyRate;
    ///
    /// // One point per whole dollar
    /// assert_eq!(Money::from_cents(5250).loyalty_points(LoyaltyRate::default()), 52);
    /// ```
    pub fn loyalty_points(&self, rate: LoyaltyRate) -> i64 {
        if self.0 <= 0 {
            return 0;
        }
        (self.0 as i128 * rate.bps() as i128 / (100 * 10_000)) as i64
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// For logs and debugging only.
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

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
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
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::zero()), "$0.00");
    }

    #[test]
    fn test_sum_of_lines() {
        let lines = vec![
            Money::from_cents(2500).multiply_quantity(2),
            Money::from_cents(500).multiply_quantity(3),
        ];
        let total: Money = lines.into_iter().sum();
        assert_eq!(total.cents(), 6500);
    }

    #[test]
    fn test_checked_multiply_overflow() {
        assert!(Money::from_cents(i64::MAX).checked_multiply_quantity(2).is_none());
        assert_eq!(
            Money::from_cents(100).checked_multiply_quantity(3),
            Some(Money::from_cents(300))
        );
    }

    #[test]
    fn test_checked_add_sub() {
        let near_max = Money::from_cents(i64::MAX - 10);
        assert!(near_max.checked_add(Money::from_cents(11)).is_none());
        assert_eq!(
            near_max.checked_add(Money::from_cents(10)),
            Some(Money::from_cents(i64::MAX))
        );
        assert!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)).is_none());
        assert_eq!(
            Money::from_cents(500).checked_sub(Money::from_cents(200)),
            Some(Money::from_cents(300))
        );
    }

    #[test]
    fn test_tax_calculation_with_rounding() {
        // $10.00 at 8.25% = $0.825 → $0.83
        let tax = Money::from_cents(1000).calculate_tax(TaxRate::from_bps(825));
        assert_eq!(tax.cents(), 83);
    }

    #[test]
    fn test_loyalty_points_floor() {
        let rate = LoyaltyRate::from_bps(10_000);
        assert_eq!(Money::from_cents(5250).loyalty_points(rate), 52);
        assert_eq!(Money::from_cents(99).loyalty_points(rate), 0);
        assert_eq!(Money::from_cents(-500).loyalty_points(rate), 0);

        // Double points promotion
        let double = LoyaltyRate::from_bps(20_000);
        assert_eq!(Money::from_cents(5250).loyalty_points(double), 105);
    }

    #[test]
    fn test_serializes_as_integer() {
        let json = serde_json::to_string(&Money::from_cents(5250)).unwrap();
        assert_eq!(json, "5250");
    }
}
