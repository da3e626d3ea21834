//! # Withholdings (Retenciones)
//!
//! The four Colombian withholdings a buyer may deduct from the payable
//! total. Each one is switched on independently and carries its own percent.
//!
//! ```text
//! ┌──────────────┬───────────────────────────────┬─────────┐
//! │ Kind         │ Applied to                    │ Default │
//! ├──────────────┼───────────────────────────────┼─────────┤
//! │ RETEFUENTE   │ subtotal after discount       │ 2.5 %   │
//! │ RETEIVA      │ tax amount (only when > 0)    │ 15 %    │
//! │ ICA          │ subtotal after discount       │ 0.966 % │
//! │ RETEICA      │ subtotal after discount       │ 0.966 % │
//! └──────────────┴───────────────────────────────┴─────────┘
//! ```
//!
//! A disabled withholding contributes exactly zero whatever its percent.
//! The defaults only seed the input; the seller can edit them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Rate;

// =============================================================================
// Kind
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum WithholdingKind {
    /// Income-tax withholding.
    Retefuente,
    /// VAT withholding.
    Reteiva,
    /// Municipal industry and commerce tax.
    Ica,
    /// ICA withholding.
    Reteica,
}

impl WithholdingKind {
    /// Every kind, in the order documents print them.
    pub const ALL: [WithholdingKind; 4] = [
        WithholdingKind::Retefuente,
        WithholdingKind::Reteiva,
        WithholdingKind::Ica,
        WithholdingKind::Reteica,
    ];

    /// Percent that seeds the input the first time the withholding is enabled.
    pub const fn default_percent(&self) -> Rate {
        match self {
            WithholdingKind::Retefuente => Rate::from_parts(25, 1),
            WithholdingKind::Reteiva => Rate::from_parts(15, 0),
            WithholdingKind::Ica => Rate::from_parts(966, 3),
            WithholdingKind::Reteica => Rate::from_parts(966, 3),
        }
    }

    /// Label printed on documents.
    pub const fn label(&self) -> &'static str {
        match self {
            WithholdingKind::Retefuente => "Retefuente",
            WithholdingKind::Reteiva => "ReteIVA",
            WithholdingKind::Ica => "ICA",
            WithholdingKind::Reteica => "ReteICA",
        }
    }

    /// Whether this kind is computed on the tax amount instead of the
    /// discounted subtotal.
    #[inline]
    pub const fn applies_to_tax(&self) -> bool {
        matches!(self, WithholdingKind::Reteiva)
    }
}

impl fmt::Display for WithholdingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Single Withholding
// =============================================================================

/// One withholding toggle and its percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Withholding {
    pub enabled: bool,
    pub percent: Rate,
}

impl Withholding {
    /// Disabled, seeded with the kind's default percent.
    pub const fn seeded(kind: WithholdingKind) -> Self {
        Withholding {
            enabled: false,
            percent: kind.default_percent(),
        }
    }

    /// Restores a withholding from a saved percent.
    ///
    /// Saved quotes store zero for disabled withholdings, so anything above
    /// zero comes back enabled; zero comes back disabled with the default.
    pub fn from_persisted(kind: WithholdingKind, stored: Rate) -> Self {
        if stored.is_zero() {
            Withholding::seeded(kind)
        } else {
            Withholding {
                enabled: true,
                percent: stored,
            }
        }
    }

    /// Percent to store: zero when disabled.
    pub fn persisted_percent(&self) -> Rate {
        if self.enabled {
            self.percent
        } else {
            Rate::zero()
        }
    }
}

// =============================================================================
// The Four Withholdings
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Withholdings {
    pub retefuente: Withholding,
    pub reteiva: Withholding,
    pub ica: Withholding,
    pub reteica: Withholding,
}

impl Default for Withholdings {
    fn default() -> Self {
        Withholdings {
            retefuente: Withholding::seeded(WithholdingKind::Retefuente),
            reteiva: Withholding::seeded(WithholdingKind::Reteiva),
            ica: Withholding::seeded(WithholdingKind::Ica),
            reteica: Withholding::seeded(WithholdingKind::Reteica),
        }
    }
}

impl Withholdings {
    pub fn get(&self, kind: WithholdingKind) -> &Withholding {
        match kind {
            WithholdingKind::Retefuente => &self.retefuente,
            WithholdingKind::Reteiva => &self.reteiva,
            WithholdingKind::Ica => &self.ica,
            WithholdingKind::Reteica => &self.reteica,
        }
    }

    pub fn get_mut(&mut self, kind: WithholdingKind) -> &mut Withholding {
        match kind {
            WithholdingKind::Retefuente => &mut self.retefuente,
            WithholdingKind::Reteiva => &mut self.reteiva,
            WithholdingKind::Ica => &mut self.ica,
            WithholdingKind::Reteica => &mut self.reteica,
        }
    }

    pub fn set_enabled(&mut self, kind: WithholdingKind, enabled: bool) {
        self.get_mut(kind).enabled = enabled;
    }

    pub fn set_percent(&mut self, kind: WithholdingKind, percent: Rate) {
        self.get_mut(kind).percent = percent;
    }

    pub fn any_enabled(&self) -> bool {
        WithholdingKind::ALL.iter().any(|kind| self.get(*kind).enabled)
    }

    /// Computes the four amounts.
    ///
    /// ## Example
    /// ```rust
    /// use cotiza_core::withholding::{WithholdingKind, Withholdings};
    /// use rust_decimal::Decimal;
    ///
    /// let mut w = Withholdings::default();
    /// w.set_enabled(WithholdingKind::Retefuente, true);
    /// w.set_enabled(WithholdingKind::Reteiva, true);
    ///
    /// // No tax: ReteIVA stays at zero even though it is enabled.
    /// let amounts = w.compute(Decimal::from(100_000), Decimal::ZERO);
    /// assert_eq!(amounts.retefuente, Decimal::from(2_500));
    /// assert_eq!(amounts.reteiva, Decimal::ZERO);
    /// ```
    pub fn compute(
        &self,
        subtotal_after_discount: Decimal,
        tax_amount: Decimal,
    ) -> WithholdingAmounts {
        let amount = |kind: WithholdingKind| -> Decimal {
            let w = self.get(kind);
            if !w.enabled {
                return Decimal::ZERO;
            }
            let basis = if kind.applies_to_tax() {
                if tax_amount <= Decimal::ZERO {
                    return Decimal::ZERO;
                }
                tax_amount
            } else {
                subtotal_after_discount
            };
            w.percent.of(basis).max(Decimal::ZERO)
        };

        WithholdingAmounts {
            retefuente: amount(WithholdingKind::Retefuente),
            reteiva: amount(WithholdingKind::Reteiva),
            ica: amount(WithholdingKind::Ica),
            reteica: amount(WithholdingKind::Reteica),
        }
    }
}

// =============================================================================
// Amounts
// =============================================================================

/// Unrounded withholding amounts, each ≥ 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WithholdingAmounts {
    #[ts(type = "string")]
    pub retefuente: Decimal,
    #[ts(type = "string")]
    pub reteiva: Decimal,
    #[ts(type = "string")]
    pub ica: Decimal,
    #[ts(type = "string")]
    pub reteica: Decimal,
}

impl WithholdingAmounts {
    pub fn get(&self, kind: WithholdingKind) -> Decimal {
        match kind {
            WithholdingKind::Retefuente => self.retefuente,
            WithholdingKind::Reteiva => self.reteiva,
            WithholdingKind::Ica => self.ica,
            WithholdingKind::Reteica => self.reteica,
        }
    }

    pub fn total(&self) -> Decimal {
        self.retefuente + self.reteiva + self.ica + self.reteica
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_enabled() -> Withholdings {
        let mut w = Withholdings::default();
        for kind in WithholdingKind::ALL {
            w.set_enabled(kind, true);
        }
        w
    }

    #[test]
    fn test_default_percents() {
        let w = Withholdings::default();
        assert_eq!(w.retefuente.percent, Rate::percent("2.5").unwrap());
        assert_eq!(w.reteiva.percent, Rate::percent("15").unwrap());
        assert_eq!(w.ica.percent, Rate::percent("0.966").unwrap());
        assert_eq!(w.reteica.percent, Rate::percent("0.966").unwrap());
        assert!(!w.any_enabled());
    }

    #[test]
    fn test_disabled_forces_zero() {
        let mut w = all_enabled();
        w.set_percent(WithholdingKind::Ica, Rate::percent("50").unwrap());
        w.set_enabled(WithholdingKind::Ica, false);

        let amounts = w.compute(Decimal::from(180_000), Decimal::from(34_200));
        assert_eq!(amounts.ica, Decimal::ZERO);
        assert!(amounts.retefuente > Decimal::ZERO);
    }

    #[test]
    fn test_all_four_amounts() {
        let amounts = all_enabled().compute(Decimal::from(180_000), Decimal::from(34_200));

        assert_eq!(amounts.retefuente, Decimal::from(4_500));
        assert_eq!(amounts.reteiva, Decimal::from(5_130));
        assert_eq!(amounts.ica, Decimal::new(17_388, 1));
        assert_eq!(amounts.reteica, Decimal::new(17_388, 1));
        assert_eq!(amounts.total(), Decimal::new(131_076, 1));
    }

    #[test]
    fn test_reteiva_needs_tax() {
        let amounts = all_enabled().compute(Decimal::from(180_000), Decimal::ZERO);
        assert_eq!(amounts.reteiva, Decimal::ZERO);
    }

    #[test]
    fn test_persisted_round_trip_of_flags() {
        let mut w = Withholdings::default();
        w.set_enabled(WithholdingKind::Retefuente, true);
        w.set_percent(WithholdingKind::Retefuente, Rate::percent("3.5").unwrap());

        let stored_on = w.retefuente.persisted_percent();
        let stored_off = w.ica.persisted_percent();
        assert_eq!(stored_off, Rate::zero());

        let back_on = Withholding::from_persisted(WithholdingKind::Retefuente, stored_on);
        assert!(back_on.enabled);
        assert_eq!(back_on.percent, Rate::percent("3.5").unwrap());

        let back_off = Withholding::from_persisted(WithholdingKind::Ica, stored_off);
        assert!(!back_off.enabled);
        assert_eq!(back_off.percent, WithholdingKind::Ica.default_percent());
    }
}
