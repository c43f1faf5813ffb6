//! # Money Module
//!
//! `Money` (integer cents) and `Percent` (basis points).
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE RECALCULATION DRIFT PROBLEM                                        │
//! │                                                                         │
//! │  Float state recalculated on every UI tick:                             │
//! │    140 × 0.15 = 21.000000000000004 → display 21.00, store 21.0000…04    │
//! │    re-add, re-multiply, re-round ... totals wander by a cent            │
//! │                                                                         │
//! │  OUR SOLUTION: integer cents + basis points                             │
//! │    14000 × 1500 = 21_000_000 (exact)                                    │
//! │    ÷ 10000, rounded half-up ONCE → 2100 cents                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Floats never enter the arithmetic. Major-unit decimals from the HTTP layer
//! are converted exactly with [`Money::from_decimal`].

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

/// Basis points in 100%.
const BPS_SCALE: i128 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (piastres / cents).
///
/// ## Where Money Flows
/// ```text
/// Product.price_cents ──► OrderItem.unit_price_cents ──► line_total
///                                                          │
///            Σ line totals ◄──────────────────────────────┘
///                 │
///                 ▼
///            subtotal ──► tax, service tax, discount ──► total
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use menu_core::money::Money;
    ///
    /// let price = Money::from_cents(14_000); // 140.00
    /// assert_eq!(price.cents(), 14_000);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Converts a major-unit decimal (e.g. `140.5`) into cents.
    ///
    /// Rounds half-up to two decimal places. Returns `None` when the value
    /// does not fit in an `i64` of cents.
    ///
    /// ```rust
    /// use menu_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let value = Decimal::new(140_505, 3); // 140.505
    /// assert_eq!(Money::from_decimal(value).unwrap().cents(), 14_051);
    /// ```
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let cents = rounded.checked_mul(Decimal::ONE_HUNDRED)?;
        cents.to_i64().map(Money)
    }

    /// Returns the value as a major-unit decimal with two decimal places.
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero money value.
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

    /// Multiplies a unit price by a quantity, `None` on overflow.
    ///
    /// ```rust
    /// use menu_core::money::Money;
    ///
    /// let line = Money::from_cents(6_500).multiply_quantity(3);
    /// assert_eq!(line.map(|m| m.cents()), Some(19_500));
    /// assert!(Money::from_cents(i64::MAX / 2).multiply_quantity(3).is_none());
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Sums amounts, `None` as soon as the running total overflows.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }

    /// Returns the smaller of two amounts.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        Money(self.0.min(other.0))
    }

    /// Clamps negative amounts to zero.
    #[inline]
    pub fn non_negative(self) -> Money {
        Money(self.0.max(0))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
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

// =============================================================================
// Percent Type
// =============================================================================

/// A percentage in basis points (1 bp = 0.01%).
///
/// Used for the tax rate, the service rate, percentage vouchers and the
/// global menu discount. `Percent::from_whole(15)` is 15% = 1500 bps.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Percent(u32);

impl Percent {
    /// 100%.
    pub const FULL: Percent = Percent(10_000);

    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percent(bps)
    }

    /// Creates a percentage from a whole number (`15` → 15%).
    #[inline]
    pub const fn from_whole(pct: u32) -> Self {
        Percent(pct * 100)
    }

    /// Converts a decimal percentage (`14.5`) into basis points.
    ///
    /// Returns `None` for negative values, values with more precision than
    /// a basis point, or values that overflow.
    pub fn from_decimal(pct: Decimal) -> Option<Self> {
        if pct.is_sign_negative() {
            return None;
        }
        let bps = pct.checked_mul(Decimal::ONE_HUNDRED)?;
        if !bps.fract().is_zero() {
            return None;
        }
        bps.to_u32().map(Percent)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a decimal percentage (`1450` → `14.50`).
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0 as i64, 2)
    }

    #[inline]
    pub const fn zero() -> Self {
        Percent(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// `100% − self`, saturating at zero.
    #[inline]
    pub const fn complement(&self) -> Percent {
        Percent(10_000u32.saturating_sub(self.0))
    }

    /// Applies this percentage to an amount, rounding half-up to a cent.
    ///
    /// The product `cents × bps` is exact in `i128`; the single division by
    /// 10 000 is the only rounding step.
    ///
    /// ```rust
    /// use menu_core::money::{Money, Percent};
    ///
    /// // 140.00 × 15% = 21.00
    /// assert_eq!(Percent::from_whole(15).of(Money::from_cents(14_000)).cents(), 2_100);
    /// // 0.10 × 25% = 0.025 → 0.03 (half-up)
    /// assert_eq!(Percent::from_whole(25).of(Money::from_cents(10)).cents(), 3);
    /// ```
    pub fn of(&self, amount: Money) -> Money {
        let scaled = amount.cents() as i128 * self.0 as i128;
        let half = BPS_SCALE / 2;
        let rounded = if scaled >= 0 {
            (scaled + half) / BPS_SCALE
        } else {
            (scaled - half) / BPS_SCALE
        };
        Money::from_cents(rounded as i64)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
