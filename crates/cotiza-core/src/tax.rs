//! # Tax and Discount Decomposition
//!
//! Splits a subtotal into taxable base, tax and discount according to an
//! explicit [`TaxMode`].
//!
//! ## The Two Tax Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ExclusiveAdded (prices do NOT include IVA)                             │
//! │    tax_base = subtotal                                                  │
//! │    tax      = (subtotal − discount) × t/100   ◄── discounted amount     │
//! │    total adds tax on top                                                │
//! │                                                                         │
//! │  InclusiveEmbedded (prices already include IVA, breakdown shown)        │
//! │    tax_base = subtotal ÷ (1 + t/100)                                    │
//! │    tax      = subtotal − tax_base             ◄── gross subtotal        │
//! │    total does NOT add tax again                                         │
//! │                                                                         │
//! │  None (t = 0)                                                           │
//! │    tax_base = subtotal, tax = 0                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The two taxed paths use different amounts for the tax. Both are kept as
//! they are; quotes priced either way must reproduce the same totals.
//!
//! In every mode `discount = subtotal × d/100` and
//! `subtotal_after_discount = subtotal − discount`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Rate};

// =============================================================================
// Tax Mode
// =============================================================================

/// How the sales tax relates to the entered prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TaxMode {
    /// No tax applies.
    None,
    /// Tax is computed on the discounted subtotal and added to the total.
    ExclusiveAdded,
    /// Prices already contain the tax; it is only split out for display.
    InclusiveEmbedded,
}

impl Default for TaxMode {
    fn default() -> Self {
        TaxMode::None
    }
}

impl TaxMode {
    /// Picks the mode from the two inputs a seller controls.
    ///
    /// ## Example
    /// ```rust
    /// use cotiza_core::money::Rate;
    /// use cotiza_core::tax::TaxMode;
    ///
    /// let iva = Rate::percent("19").unwrap();
    /// assert_eq!(TaxMode::from_flags(iva, true), TaxMode::InclusiveEmbedded);
    /// assert_eq!(TaxMode::from_flags(iva, false), TaxMode::ExclusiveAdded);
    /// assert_eq!(TaxMode::from_flags(Rate::zero(), true), TaxMode::None);
    /// ```
    pub fn from_flags(tax_percent: Rate, breakdown_shown: bool) -> Self {
        if tax_percent.is_zero() {
            TaxMode::None
        } else if breakdown_shown {
            TaxMode::InclusiveEmbedded
        } else {
            TaxMode::ExclusiveAdded
        }
    }

    /// Whether the tax is added on top of the discounted subtotal.
    #[inline]
    pub const fn adds_to_total(&self) -> bool {
        matches!(self, TaxMode::ExclusiveAdded)
    }
}

// =============================================================================
// Breakdown
// =============================================================================

/// Unrounded result of the decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxBreakdown {
    pub mode: TaxMode,
    #[ts(type = "string")]
    pub tax_base: Decimal,
    #[ts(type = "string")]
    pub tax_amount: Decimal,
    #[ts(type = "string")]
    pub discount_amount: Decimal,
    #[ts(type = "string")]
    pub subtotal_after_discount: Decimal,
}

/// Splits `subtotal` into base, tax and discount.
///
/// ## Example
/// ```rust
/// use cotiza_core::money::{Money, Rate};
/// use cotiza_core::tax::{decompose, TaxMode};
/// use rust_decimal::Decimal;
///
/// let split = decompose(
///     Money::from_units(119_000),
///     Rate::zero(),
///     Rate::percent("19").unwrap(),
///     TaxMode::InclusiveEmbedded,
/// );
/// assert_eq!(split.tax_base, Decimal::from(100_000));
/// assert_eq!(split.tax_amount, Decimal::from(19_000));
/// ```
pub fn decompose(
    subtotal: Money,
    discount_percent: Rate,
    tax_percent: Rate,
    mode: TaxMode,
) -> TaxBreakdown {
    let gross = subtotal.to_decimal();
    let discount_amount = discount_percent.of(gross);
    let subtotal_after_discount = gross - discount_amount;

    let (tax_base, tax_amount) = match mode {
        TaxMode::None => (gross, Decimal::ZERO),
        TaxMode::ExclusiveAdded => (gross, tax_percent.of(subtotal_after_discount)),
        TaxMode::InclusiveEmbedded => {
            let base = inclusive_base(gross, tax_percent);
            (base, gross - base)
        }
    };

    TaxBreakdown {
        mode,
        tax_base,
        tax_amount,
        discount_amount,
        subtotal_after_discount,
    }
}

/// `amount ÷ (1 + t/100)`: the pre-tax part of a tax-inclusive amount.
pub fn inclusive_base(amount: Decimal, tax_percent: Rate) -> Decimal {
    amount / (Decimal::ONE + tax_percent.fraction())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::round_half_up;

    fn pct(s: &str) -> Rate {
        Rate::percent(s).unwrap()
    }

    #[test]
    fn test_exclusive_taxes_discounted_subtotal() {
        let split = decompose(
            Money::from_units(200_000),
            pct("10"),
            pct("19"),
            TaxMode::ExclusiveAdded,
        );

        assert_eq!(split.tax_base, Decimal::from(200_000));
        assert_eq!(split.discount_amount, Decimal::from(20_000));
        assert_eq!(split.subtotal_after_discount, Decimal::from(180_000));
        assert_eq!(split.tax_amount, Decimal::from(34_200));
    }

    #[test]
    fn test_inclusive_taxes_gross_subtotal() {
        let split = decompose(
            Money::from_units(119_000),
            pct("10"),
            pct("19"),
            TaxMode::InclusiveEmbedded,
        );

        // Discount does not change the embedded split.
        assert_eq!(split.tax_base, Decimal::from(100_000));
        assert_eq!(split.tax_amount, Decimal::from(19_000));
        assert_eq!(split.discount_amount, Decimal::from(11_900));
    }

    #[test]
    fn test_inclusive_base_plus_tax_is_subtotal() {
        for units in [1, 999, 200_000, 1_234_567, 45_990_001] {
            let subtotal = Money::from_units(units);
            let split = decompose(subtotal, Rate::zero(), pct("19"), TaxMode::InclusiveEmbedded);

            let base = round_half_up(split.tax_base);
            let tax = round_half_up(split.tax_amount);
            let diff = (base + tax - subtotal).units().abs();
            assert!(diff <= 1, "units={} base={} tax={}", units, base, tax);
        }
    }

    #[test]
    fn test_no_tax_mode() {
        let split = decompose(Money::from_units(50_000), pct("5"), Rate::zero(), TaxMode::None);
        assert_eq!(split.tax_base, Decimal::from(50_000));
        assert_eq!(split.tax_amount, Decimal::ZERO);
        assert_eq!(split.subtotal_after_discount, Decimal::from(47_500));
    }

    #[test]
    fn test_only_exclusive_adds_to_total() {
        assert!(TaxMode::ExclusiveAdded.adds_to_total());
        assert!(!TaxMode::InclusiveEmbedded.adds_to_total());
        assert!(!TaxMode::None.adds_to_total());
    }
}
