//! # Totals Assembler
//!
//! Combines subtotal, tax decomposition, withholdings and surcharges into
//! the payable total and the breakdown shown on screen and persisted.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal ──► tax::decompose ──► discount, tax_base, tax_amount         │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │            Withholdings::compute(subtotal_after_discount, tax_amount)   │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │  total = subtotal_after_discount                                        │
//! │        + tax_amount            (ExclusiveAdded only)                    │
//! │        + delivery_amount                                                │
//! │        + service_amount                                                 │
//! │        − withholding_total                                              │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │  NegativeTotalPolicy (Allow | Clamp) ──► QuoteTotals ──► rounded()      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `QuoteTotals` keeps exact decimals. `RoundedTotals` is what gets shown and
//! stored; every field is rounded on its own with `round_half_up`, so the
//! rounded parts need not add up to the rounded total.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{round_half_up, Money, Rate};
use crate::tax::{decompose, TaxMode};
use crate::withholding::{WithholdingAmounts, WithholdingKind, Withholdings};

// =============================================================================
// Fiscal Options
// =============================================================================

/// Per-quote fiscal choices made by the seller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FiscalOptions {
    pub discount_percent: Rate,
    pub tax_percent: Rate,
    /// Prices include the tax and the split is shown.
    pub breakdown_shown: bool,
    pub withholdings: Withholdings,
}

impl FiscalOptions {
    #[inline]
    pub fn tax_mode(&self) -> TaxMode {
        TaxMode::from_flags(self.tax_percent, self.breakdown_shown)
    }
}

// =============================================================================
// Negative Total Policy
// =============================================================================

/// What to do when withholdings push the total below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum NegativeTotalPolicy {
    /// Keep the negative total (a credit in the buyer's favor).
    Allow,
    /// Floor the total at zero.
    Clamp,
}

impl Default for NegativeTotalPolicy {
    fn default() -> Self {
        NegativeTotalPolicy::Allow
    }
}

impl FromStr for NegativeTotalPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "allow" => Ok(NegativeTotalPolicy::Allow),
            "clamp" => Ok(NegativeTotalPolicy::Clamp),
            other => Err(ValidationError::InvalidFormat {
                field: "negative_total_policy".to_string(),
                reason: format!("expected 'allow' or 'clamp', got '{}'", other),
            }),
        }
    }
}

impl fmt::Display for NegativeTotalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegativeTotalPolicy::Allow => f.write_str("allow"),
            NegativeTotalPolicy::Clamp => f.write_str("clamp"),
        }
    }
}

// =============================================================================
// Quote Totals
// =============================================================================

/// Exact breakdown of a quote. Recomputed on every draft change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuoteTotals {
    pub mode: TaxMode,
    #[ts(type = "string")]
    pub subtotal: Decimal,
    #[ts(type = "string")]
    pub tax_base: Decimal,
    #[ts(type = "string")]
    pub tax_amount: Decimal,
    #[ts(type = "string")]
    pub discount_amount: Decimal,
    #[ts(type = "string")]
    pub subtotal_after_discount: Decimal,
    #[ts(type = "string")]
    pub delivery_amount: Decimal,
    #[ts(type = "string")]
    pub service_amount: Decimal,
    pub withholdings: WithholdingAmounts,
    #[ts(type = "string")]
    pub withholding_total: Decimal,
    #[ts(type = "string")]
    pub total: Decimal,
}

impl QuoteTotals {
    /// Assembles the totals for a subtotal and a set of fiscal options.
    ///
    /// ## Example
    /// ```rust
    /// use cotiza_core::money::{Money, Rate};
    /// use cotiza_core::totals::{FiscalOptions, NegativeTotalPolicy, QuoteTotals};
    ///
    /// let options = FiscalOptions {
    ///     discount_percent: Rate::percent("10").unwrap(),
    ///     tax_percent: Rate::percent("19").unwrap(),
    ///     ..Default::default()
    /// };
    ///
    /// let rounded = QuoteTotals::compute(
    ///     Money::from_units(200_000),
    ///     &options,
    ///     Money::zero(),
    ///     Money::zero(),
    ///     NegativeTotalPolicy::Allow,
    /// )
    /// .rounded();
    ///
    /// assert_eq!(rounded.discount_amount.units(), 20_000);
    /// assert_eq!(rounded.subtotal_after_discount.units(), 180_000);
    /// assert_eq!(rounded.tax_amount.units(), 34_200);
    /// assert_eq!(rounded.total.units(), 214_200);
    /// ```
    pub fn compute(
        subtotal: Money,
        options: &FiscalOptions,
        delivery: Money,
        service: Money,
        policy: NegativeTotalPolicy,
    ) -> Self {
        let mode = options.tax_mode();
        let split = decompose(subtotal, options.discount_percent, options.tax_percent, mode);
        let withholdings = options
            .withholdings
            .compute(split.subtotal_after_discount, split.tax_amount);
        let withholding_total = withholdings.total();

        let delivery_amount = delivery.to_decimal();
        let service_amount = service.to_decimal();
        let added_tax = if mode.adds_to_total() {
            split.tax_amount
        } else {
            Decimal::ZERO
        };

        let mut total = split.subtotal_after_discount + added_tax + delivery_amount
            + service_amount
            - withholding_total;
        if policy == NegativeTotalPolicy::Clamp && total < Decimal::ZERO {
            total = Decimal::ZERO;
        }

        QuoteTotals {
            mode,
            subtotal: subtotal.to_decimal(),
            tax_base: split.tax_base,
            tax_amount: split.tax_amount,
            discount_amount: split.discount_amount,
            subtotal_after_discount: split.subtotal_after_discount,
            delivery_amount,
            service_amount,
            withholdings,
            withholding_total,
            total,
        }
    }

    /// Rounds every field independently for display and persistence.
    pub fn rounded(&self) -> RoundedTotals {
        RoundedTotals {
            subtotal: round_half_up(self.subtotal),
            tax_base: round_half_up(self.tax_base),
            tax_amount: round_half_up(self.tax_amount),
            discount_amount: round_half_up(self.discount_amount),
            subtotal_after_discount: round_half_up(self.subtotal_after_discount),
            delivery_amount: round_half_up(self.delivery_amount),
            service_amount: round_half_up(self.service_amount),
            retefuente: round_half_up(self.withholdings.retefuente),
            reteiva: round_half_up(self.withholdings.reteiva),
            ica: round_half_up(self.withholdings.ica),
            reteica: round_half_up(self.withholdings.reteica),
            withholding_total: round_half_up(self.withholding_total),
            total: round_half_up(self.total),
        }
    }
}

// =============================================================================
// Rounded Totals
// =============================================================================

/// Whole-unit totals: what the seller sees and what the quote stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoundedTotals {
    pub subtotal: Money,
    pub tax_base: Money,
    pub tax_amount: Money,
    pub discount_amount: Money,
    pub subtotal_after_discount: Money,
    pub delivery_amount: Money,
    pub service_amount: Money,
    pub retefuente: Money,
    pub reteiva: Money,
    pub ica: Money,
    pub reteica: Money,
    pub withholding_total: Money,
    pub total: Money,
}

impl RoundedTotals {
    pub fn withholding(&self, kind: WithholdingKind) -> Money {
        match kind {
            WithholdingKind::Retefuente => self.retefuente,
            WithholdingKind::Reteiva => self.reteiva,
            WithholdingKind::Ica => self.ica,
            WithholdingKind::Reteica => self.reteica,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pct(s: &str) -> Rate {
        Rate::percent(s).unwrap()
    }

    fn options(discount: &str, tax: &str, breakdown: bool) -> FiscalOptions {
        FiscalOptions {
            discount_percent: pct(discount),
            tax_percent: pct(tax),
            breakdown_shown: breakdown,
            withholdings: Withholdings::default(),
        }
    }

    #[test]
    fn test_exclusive_scenario() {
        let totals = QuoteTotals::compute(
            Money::from_units(200_000),
            &options("10", "19", false),
            Money::zero(),
            Money::zero(),
            NegativeTotalPolicy::Allow,
        );

        assert_eq!(totals.mode, TaxMode::ExclusiveAdded);
        assert_eq!(totals.subtotal, Decimal::from(200_000));
        assert_eq!(totals.discount_amount, Decimal::from(20_000));
        assert_eq!(totals.subtotal_after_discount, Decimal::from(180_000));
        assert_eq!(totals.tax_amount, Decimal::from(34_200));
        assert_eq!(totals.total, Decimal::from(214_200));
    }

    #[test]
    fn test_inclusive_scenario_does_not_add_tax() {
        let totals = QuoteTotals::compute(
            Money::from_units(119_000),
            &options("0", "19", true),
            Money::zero(),
            Money::zero(),
            NegativeTotalPolicy::Allow,
        );

        let rounded = totals.rounded();
        assert_eq!(rounded.tax_base.units(), 100_000);
        assert_eq!(rounded.tax_amount.units(), 19_000);
        assert_eq!(rounded.total.units(), 119_000);
    }

    #[test]
    fn test_surcharges_and_withholdings() {
        let mut opts = options("0", "19", false);
        opts.withholdings.set_enabled(WithholdingKind::Retefuente, true);
        opts.withholdings.set_enabled(WithholdingKind::Reteiva, true);

        let totals = QuoteTotals::compute(
            Money::from_units(100_000),
            &opts,
            Money::from_units(10_000),
            Money::from_units(50_000),
            NegativeTotalPolicy::Allow,
        );

        // 100000 + 19000 + 10000 + 50000 − (2500 + 2850)
        let rounded = totals.rounded();
        assert_eq!(rounded.retefuente.units(), 2_500);
        assert_eq!(rounded.reteiva.units(), 2_850);
        assert_eq!(rounded.withholding_total.units(), 5_350);
        assert_eq!(rounded.total.units(), 173_650);
    }

    #[test]
    fn test_negative_total_policy() {
        let mut heavy = options("0", "0", false);
        for kind in WithholdingKind::ALL {
            heavy.withholdings.set_enabled(kind, true);
            heavy.withholdings.set_percent(kind, pct("60"));
        }

        let allowed = QuoteTotals::compute(
            Money::from_units(10_000),
            &heavy,
            Money::zero(),
            Money::zero(),
            NegativeTotalPolicy::Allow,
        );
        // 10000 − 3 × 6000 (ReteIVA has no tax to work on)
        assert_eq!(allowed.withholdings.reteiva, Decimal::ZERO);
        assert_eq!(allowed.total, Decimal::from(-8_000));
        assert_eq!(allowed.rounded().total.units(), -8_000);

        let clamped = QuoteTotals::compute(
            Money::from_units(10_000),
            &heavy,
            Money::zero(),
            Money::zero(),
            NegativeTotalPolicy::Clamp,
        );
        assert_eq!(clamped.total, Decimal::ZERO);
        assert_eq!(clamped.withholding_total, Decimal::from(18_000));
    }

    #[test]
    fn test_rounding_is_per_field() {
        let mut opts = options("0", "0", false);
        opts.withholdings.set_enabled(WithholdingKind::Ica, true);
        opts.withholdings.set_enabled(WithholdingKind::Reteica, true);

        // 0.966% of 1500 = 14.49 each, 28.98 withheld in total
        let totals = QuoteTotals::compute(
            Money::from_units(1_500),
            &opts,
            Money::zero(),
            Money::zero(),
            NegativeTotalPolicy::Allow,
        );
        let rounded = totals.rounded();

        assert_eq!(rounded.ica.units(), 14);
        assert_eq!(rounded.reteica.units(), 14);
        assert_eq!(rounded.withholding_total.units(), 29);
        // 1500 − 28.98 = 1471.02, one less than 1500 − 14 − 14
        assert_eq!(rounded.total.units(), 1_471);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("Clamp".parse::<NegativeTotalPolicy>().unwrap(), NegativeTotalPolicy::Clamp);
        assert_eq!(NegativeTotalPolicy::default(), NegativeTotalPolicy::Allow);
        assert!("never".parse::<NegativeTotalPolicy>().is_err());
    }
}
