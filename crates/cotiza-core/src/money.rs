//! # Money Module
//!
//! Provides the `Money` type for whole currency amounts and the `Rate` type
//! for percentages.
//!
//! ## Two Kinds of Numbers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  MONEY vs RATE                                                          │
//! │                                                                         │
//! │  Money: whole pesos in an i64                                           │
//! │    unit prices, line subtotals, persisted totals                        │
//! │                                                                         │
//! │  Rate: a percentage held as an exact decimal                            │
//! │    19% IVA, 10% discount, 0.966% ICA                                    │
//! │    0.966 does not fit basis points, so no integer trick here           │
//! │                                                                         │
//! │  Intermediate results (Money × Rate, Money ÷ (1 + Rate)) stay as       │
//! │  Decimal until round_half_up() turns them back into Money.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cotiza_core::money::{round_half_up, Money, Rate};
//!
//! let price = Money::from_units(100_000);
//! let iva = Rate::percent("19").unwrap();
//!
//! let tax = iva.of(price.to_decimal());
//! assert_eq!(round_half_up(tax), Money::from_units(19_000));
//! assert_eq!(price.format_cop(), "$100.000");
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole currency units (Colombian pesos).
///
/// ## Design Decisions
/// - **i64 (signed)**: a total can go negative when withholdings exceed
///   the payable amount and the policy allows it
/// - **Whole units**: prices are quoted without a minor unit
///
/// ## Where Money is Used
/// ```text
/// Product.sale_price ──► LineItem.unit_price ──► line subtotal
///                                                      │
///                          Cart.subtotal() ◄───────────┘
///                                │
///                                ▼
///                 QuoteTotals (Decimal) ──► RoundedTotals (Money) ──► Quote
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole currency units.
    ///
    /// ## Example
    /// ```rust
    /// use cotiza_core::money::Money;
    ///
    /// let price = Money::from_units(45_900);
    /// assert_eq!(price.units(), 45_900);
    /// ```
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units)
    }

    /// Returns the value in whole currency units.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
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

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use cotiza_core::money::Money;
    ///
    /// let unit_price = Money::from_units(100_000);
    /// assert_eq!(unit_price.multiply_quantity(2).units(), 200_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Widens to an exact decimal for percentage math.
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::from(self.0)
    }

    /// Formats the amount the way Colombian documents print it:
    /// `$` prefix, `.` as the thousands separator, no decimals.
    ///
    /// ## Example
    /// ```rust
    /// use cotiza_core::money::Money;
    ///
    /// assert_eq!(Money::from_units(214_200).format_cop(), "$214.200");
    /// assert_eq!(Money::from_units(-1_500).format_cop(), "-$1.500");
    /// assert_eq!(Money::from_units(0).format_cop(), "$0");
    /// ```
    pub fn format_cop(&self) -> String {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}${}", sign, grouped)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_cop())
    }
}

impl Add for Money {
    type Output = Money;

    #[inline]
    fn add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Money) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Money;

    #[inline]
    fn sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Money) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Money;

    #[inline]
    fn mul(self, qty: i64) -> Money {
        self.multiply_quantity(qty)
    }
}

impl Neg for Money {
    type Output = Money;

    #[inline]
    fn neg(self) -> Money {
        Money(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl From<i64> for Money {
    fn from(units: i64) -> Self {
        Money(units)
    }
}

// =============================================================================
// Rounding
// =============================================================================

/// Rounds a decimal amount to whole units, ties toward +∞.
///
/// This is `floor(x + 0.5)`: 0.5 → 1, -0.5 → 0, -1.5 → -1. Every displayed
/// and persisted amount goes through this one function.
///
/// Values beyond the i64 range saturate.
///
/// ## Example
/// ```rust
/// use cotiza_core::money::{round_half_up, Money};
/// use rust_decimal::Decimal;
///
/// assert_eq!(round_half_up(Decimal::new(25, 1)), Money::from_units(3));
/// assert_eq!(round_half_up(Decimal::new(-25, 1)), Money::from_units(-2));
/// ```
pub fn round_half_up(value: Decimal) -> Money {
    let half = Decimal::new(5, 1);
    let floored = value.checked_add(half).unwrap_or(value).floor();
    match floored.to_i64() {
        Some(units) => Money(units),
        None if floored.is_sign_negative() => Money(i64::MIN),
        None => Money(i64::MAX),
    }
}

/// Coerces free-text amount input to Money.
///
/// Blank, non-numeric and negative input all become zero; fractional input
/// is rounded with [`round_half_up`]. A leading `$` and surrounding spaces
/// are ignored.
///
/// ## Example
/// ```rust
/// use cotiza_core::money::{parse_amount_input, Money};
///
/// assert_eq!(parse_amount_input("45000"), Money::from_units(45_000));
/// assert_eq!(parse_amount_input("abc"), Money::zero());
/// assert_eq!(parse_amount_input("-10"), Money::zero());
/// ```
pub fn parse_amount_input(input: &str) -> Money {
    let cleaned = input.trim().trim_start_matches('$').trim();
    match Decimal::from_str(cleaned) {
        Ok(value) if value.is_sign_positive() => round_half_up(value),
        _ => Money::zero(),
    }
}

// =============================================================================
// Rate Type
// =============================================================================

/// A percentage in the range [0, 100], held exactly.
///
/// `Rate` stores the percent itself (19 means 19%), not the fraction.
///
/// ## Example
/// ```rust
/// use cotiza_core::money::Rate;
/// use rust_decimal::Decimal;
///
/// let ica = Rate::percent("0.966").unwrap();
/// assert_eq!(ica.as_decimal(), Decimal::new(966, 3));
///
/// assert!(Rate::percent("101").is_err());
/// assert!(Rate::percent("-1").is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(try_from = "Decimal", into = "Decimal")]
#[ts(export)]
pub struct Rate(#[ts(type = "string")] Decimal);

impl Rate {
    /// Parses a percentage from user input. Accepts `,` as decimal separator.
    pub fn percent(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().replace(',', ".");
        let value = Decimal::from_str(&normalized).map_err(|e| ValidationError::InvalidFormat {
            field: "percent".to_string(),
            reason: e.to_string(),
        })?;
        Self::from_decimal(value)
    }

    /// Wraps a decimal percent, rejecting values outside [0, 100].
    pub fn from_decimal(value: Decimal) -> Result<Self, ValidationError> {
        if (value.is_sign_negative() && !value.is_zero()) || value > Decimal::ONE_HUNDRED {
            return Err(ValidationError::out_of_range("percent", 0, 100));
        }
        Ok(Rate(value.normalize()))
    }

    #[inline]
    pub const fn zero() -> Self {
        Rate(Decimal::ZERO)
    }

    /// `mantissa × 10^-scale` percent. Callers keep the value in [0, 100].
    pub(crate) const fn from_parts(mantissa: u32, scale: u32) -> Self {
        Rate(Decimal::from_parts(mantissa, 0, 0, false, scale))
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// The percent value (19 for 19%).
    #[inline]
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// The fraction value (0.19 for 19%).
    #[inline]
    pub fn fraction(&self) -> Decimal {
        self.0 / Decimal::ONE_HUNDRED
    }

    /// Applies the rate to an amount: `amount × percent / 100`.
    ///
    /// ## Example
    /// ```rust
    /// use cotiza_core::money::Rate;
    /// use rust_decimal::Decimal;
    ///
    /// let discount = Rate::percent("10").unwrap();
    /// assert_eq!(discount.of(Decimal::from(200_000)), Decimal::from(20_000));
    /// ```
    #[inline]
    pub fn of(&self, amount: Decimal) -> Decimal {
        amount * self.0 / Decimal::ONE_HUNDRED
    }
}

impl TryFrom<Decimal> for Rate {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Rate::from_decimal(value)
    }
}

impl From<Rate> for Decimal {
    fn from(rate: Rate) -> Self {
        rate.0
    }
}

impl FromStr for Rate {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rate::percent(s)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_units(100_000);
        let b = Money::from_units(45_000);

        assert_eq!((a + b).units(), 145_000);
        assert_eq!((a - b).units(), 55_000);
        assert_eq!((b * 3).units(), 135_000);
        assert_eq!((-b).units(), -45_000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.units(), 190_000);
    }

    #[test]
    fn test_format_cop_grouping() {
        assert_eq!(Money::from_units(999).format_cop(), "$999");
        assert_eq!(Money::from_units(1_000).format_cop(), "$1.000");
        assert_eq!(Money::from_units(1_234_567).format_cop(), "$1.234.567");
        assert_eq!(Money::from_units(-45_000).to_string(), "-$45.000");
    }

    #[test]
    fn test_round_half_up_ties_go_up() {
        assert_eq!(round_half_up(Decimal::new(5, 1)).units(), 1);
        assert_eq!(round_half_up(Decimal::new(15, 1)).units(), 2);
        assert_eq!(round_half_up(Decimal::new(-5, 1)).units(), 0);
        assert_eq!(round_half_up(Decimal::new(-15, 1)).units(), -1);
        assert_eq!(round_half_up(Decimal::new(-16, 1)).units(), -2);
        assert_eq!(round_half_up(Decimal::new(16_806_723, 1)).units(), 1_680_672);
    }

    #[test]
    fn test_round_half_up_saturates() {
        assert_eq!(round_half_up(Decimal::MAX).units(), i64::MAX);
        assert_eq!(round_half_up(Decimal::MIN).units(), i64::MIN);
    }

    #[test]
    fn test_parse_amount_input() {
        assert_eq!(parse_amount_input(" 80000 ").units(), 80_000);
        assert_eq!(parse_amount_input("$ 1500").units(), 1_500);
        assert_eq!(parse_amount_input("12.5").units(), 13);
        assert_eq!(parse_amount_input("").units(), 0);
        assert_eq!(parse_amount_input("NaN").units(), 0);
        assert_eq!(parse_amount_input("-5000").units(), 0);
    }

    #[test]
    fn test_rate_bounds() {
        assert!(Rate::percent("0").is_ok());
        assert!(Rate::percent("100").is_ok());
        assert!(Rate::percent("100.01").is_err());
        assert!(Rate::percent("-0.5").is_err());
        assert!(matches!(
            Rate::percent("diez"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_rate_accepts_comma_decimal() {
        let rate = Rate::percent("0,966").unwrap();
        assert_eq!(rate.as_decimal(), Decimal::new(966, 3));
        assert_eq!(rate.to_string(), "0.966%");
    }

    #[test]
    fn test_rate_of_and_fraction() {
        let iva = Rate::percent("19").unwrap();
        assert_eq!(iva.fraction(), Decimal::new(19, 2));
        assert_eq!(iva.of(Decimal::from(180_000)), Decimal::from(34_200));

        let ica = Rate::percent("0.966").unwrap();
        assert_eq!(ica.of(Decimal::from(180_000)), Decimal::new(17_388, 1));
    }

    #[test]
    fn test_rate_serde_validates() {
        let rate: Rate = serde_json::from_str("\"2.5\"").unwrap();
        assert_eq!(rate, Rate::percent("2.5").unwrap());

        let bad: Result<Rate, _> = serde_json::from_str("\"150\"");
        assert!(bad.is_err());
    }
}
