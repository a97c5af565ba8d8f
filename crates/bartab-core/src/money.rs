//! # Money Module
//!
//! Provides the `Money` type for prices and totals.
//!
//! ## Representation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  WHY NOT f64                                                            │
//! │                                                                         │
//! │  6000 × 0.85 × 0.9 in floating point can land on 4589.999999...        │
//! │  and two "equal" prices no longer compare equal when merging lines.    │
//! │                                                                         │
//! │  OUR SOLUTION: whole currency units (the bar prices in pesos)          │
//! │    every discount step rounds half-up to a whole unit                  │
//! │    frozen line prices compare exactly                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bartab_core::money::Money;
//! use bartab_core::types::Percent;
//!
//! let price = Money::from_units(10_000);
//! let discounted = price.apply_discount(Percent::new(10));
//! assert_eq!(discounted.units(), 9_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use ts_rs::TS;

use crate::types::Percent;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole currency units.
///
/// ## Where Money is Used
/// ```text
/// Product.price ──► effective_price() ──► OrderItem.price (frozen)
///                                             │
///                                             ▼
///                               qty × price ──► order total ──► reports
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole currency units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units)
    }

    /// Returns the value in whole currency units.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0
    }

    /// The empty amount.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// True for an empty amount.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// True when strictly above zero.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies money by a line quantity.
    ///
    /// ## Example
    /// ```rust
    /// use bartab_core::money::Money;
    ///
    /// let unit_price = Money::from_units(6_000);
    /// assert_eq!(unit_price.multiply_quantity(3).units(), 18_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: u32) -> Self {
        Money(self.0 * qty as i64)
    }

    /// Price after taking `discount` off, rounded half-up to a whole unit.
    ///
    /// A 15% discount on 2500 leaves 2125; on 2501 (2125.85) it leaves 2126.
    /// Chained calls round at every step; use [`Money::apply_discounts`] to
    /// stack several discounts with a single rounding.
    pub fn apply_discount(&self, discount: Percent) -> Money {
        self.apply_discounts(&[discount])
    }

    /// Stacks `discounts` multiplicatively and rounds half-up once, at the end.
    ///
    /// ```text
    /// 10000 ──(10%)──► 9000 ──(20%)──► 7200
    /// 3     ──(50%)──► 1.5  ──(50%)──► 0.75 ──► 1
    /// ```
    ///
    /// ## Example
    /// ```rust
    /// use bartab_core::money::Money;
    /// use bartab_core::types::Percent;
    ///
    /// let discounts = [Percent::new(10), Percent::new(20)];
    /// let price = Money::from_units(10_000).apply_discounts(&discounts);
    /// assert_eq!(price.units(), 7_200);
    /// ```
    pub fn apply_discounts(&self, discounts: &[Percent]) -> Money {
        // exact fraction in i128: price × Π(100 - d) / 100ⁿ
        let mut numerator = self.0 as i128;
        let mut denominator = 1i128;
        for discount in discounts.iter().filter(|d| !d.is_zero()) {
            numerator *= 100 - discount.value() as i128;
            denominator *= 100;
        }
        if denominator == 1 {
            return *self;
        }
        let rounded = (numerator * 2 + denominator).div_euclid(denominator * 2);
        Money(rounded as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money with thousands separators, e.g. `$12,500`.
///
/// ## Note
/// This is for logs and notifications. The presentation layer does its own
/// localized formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        write!(f, "{}${}", sign, grouped)
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

impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        self.multiply_quantity(qty)
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
