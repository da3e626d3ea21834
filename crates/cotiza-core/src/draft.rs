//! # Quote Draft
//!
//! The in-progress quote a seller edits, and the state machine that turns it
//! into a persisted record.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌─────────┐  begin_submit()   ┌────────────┐  mark_saved(id)  ┌──────┐│
//! │   │ Editing │ ────────────────► │ Submitting │ ───────────────► │Saved ││
//! │   └─────────┘   (validated)     └────────────┘                  └──────┘│
//! │     ▲  │  ▲                           │                            │    │
//! │     │  │  │                           │ mark_failed(msg)           │    │
//! │     │  │  │                           ▼                            │    │
//! │     │  │  │                     ┌────────────┐                     │    │
//! │     │  │  └──── any mutation ── │ SaveFailed │                     │    │
//! │     │  │                        └────────────┘                     │    │
//! │     │  └─ validation error: stays Editing, nothing persisted       │    │
//! │     └───────────────────────── any mutation ───────────────────────┘    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Mutations only change fields; [`QuoteDraft::totals`] is a pure function
//! of them. A failed save leaves the draft intact so the seller can retry.
//!
//! ## Editing a Saved Quote
//! [`QuoteDraft::from_saved`] rebuilds a draft from a stored quote. Saving it
//! again keeps the quote id, creation time and status, and the caller
//! replaces the header and every line in one go.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, Rate};
use crate::surcharge::{DeliverySelection, ServiceCharge};
use crate::totals::{FiscalOptions, NegativeTotalPolicy, QuoteTotals};
use crate::types::{
    Client, DeliveryZone, Product, Quote, QuoteLineRecord, QuoteLineView, QuoteStatus,
    ServiceType, Session, WorkshopTicket,
};
use crate::withholding::{Withholding, WithholdingKind, Withholdings};
use crate::DEFAULT_VALIDITY_DAYS;

// =============================================================================
// Draft State
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DraftState {
    Editing,
    Submitting,
    Saved { quote_id: String },
    SaveFailed { message: String },
}

impl Default for DraftState {
    fn default() -> Self {
        DraftState::Editing
    }
}

impl fmt::Display for DraftState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftState::Editing => f.write_str("editing"),
            DraftState::Submitting => f.write_str("submitting"),
            DraftState::Saved { .. } => f.write_str("saved"),
            DraftState::SaveFailed { .. } => f.write_str("save_failed"),
        }
    }
}

/// Identity carried over when a stored quote is edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EditingContext {
    pub quote_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub status: QuoteStatus,
}

// =============================================================================
// Submit Plan
// =============================================================================

/// Everything the persistence layer writes for one save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SubmitPlan {
    pub quote: Quote,
    pub lines: Vec<QuoteLineRecord>,
    /// Companion workshop ticket, when the quote bundles a new service.
    pub ticket: Option<WorkshopTicket>,
    /// Replace an existing quote rather than create one.
    pub is_update: bool,
}

// =============================================================================
// Quote Draft
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuoteDraft {
    client: Option<Client>,
    cart: Cart,
    fiscal: FiscalOptions,
    delivery: DeliverySelection,
    service: ServiceCharge,
    validity_days: i64,
    seller_name: String,
    notes: String,
    editing: Option<EditingContext>,
    #[serde(skip)]
    #[ts(skip)]
    pending: Option<EditingContext>,
    state: DraftState,
}

impl Default for QuoteDraft {
    fn default() -> Self {
        QuoteDraft::with_defaults(DEFAULT_VALIDITY_DAYS, Withholdings::default())
    }
}

impl QuoteDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty draft seeded with configured validity and withholding
    /// percents.
    pub fn with_defaults(validity_days: i64, withholdings: Withholdings) -> Self {
        QuoteDraft {
            client: None,
            cart: Cart::new(),
            fiscal: FiscalOptions {
                withholdings,
                ..FiscalOptions::default()
            },
            delivery: DeliverySelection::default(),
            service: ServiceCharge::default(),
            validity_days: if validity_days > 0 {
                validity_days
            } else {
                DEFAULT_VALIDITY_DAYS
            },
            seller_name: String::new(),
            notes: String::new(),
            editing: None,
            pending: None,
            state: DraftState::Editing,
        }
    }

    /// Rebuilds a draft from a stored quote for editing.
    ///
    /// The client comes from the quote's snapshot. Withholdings with a
    /// stored percent above zero come back enabled. A stored service amount
    /// comes back included, with its ticket marked as already created.
    pub fn from_saved(
        quote: &Quote,
        lines: Vec<QuoteLineView>,
        zone: Option<DeliveryZone>,
    ) -> Self {
        let non_empty = |s: &str| {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };

        let client = Client {
            id: quote.client_id.clone().unwrap_or_default(),
            seller_id: quote.seller_id.clone(),
            name: quote.client_name.clone(),
            phone: non_empty(&quote.client_phone),
            tax_id: non_empty(&quote.client_tax_id),
            email: non_empty(&quote.client_email),
            address: non_empty(&quote.client_address),
            city: non_empty(&quote.client_city),
            created_at: quote.created_at,
        };

        let mut withholdings = Withholdings::default();
        for kind in WithholdingKind::ALL {
            *withholdings.get_mut(kind) =
                Withholding::from_persisted(kind, quote.withholding_percent(kind));
        }

        let mut delivery = DeliverySelection::default();
        match (quote.delivery_zone_id.as_ref(), zone) {
            (Some(_), Some(zone)) => delivery.select_zone(zone),
            (Some(_), None) => delivery.set_included(true),
            (None, _) => {}
        }

        QuoteDraft {
            client: Some(client),
            cart: Cart::from_lines(lines),
            fiscal: FiscalOptions {
                discount_percent: quote.discount_percent,
                tax_percent: quote.tax_percent,
                breakdown_shown: quote.breakdown_shown,
                withholdings,
            },
            delivery,
            service: ServiceCharge::restored(Money::from_units(quote.service_amount)),
            validity_days: if quote.validity_days > 0 {
                quote.validity_days
            } else {
                DEFAULT_VALIDITY_DAYS
            },
            seller_name: quote.seller_name.clone(),
            notes: quote.notes.clone(),
            editing: Some(EditingContext {
                quote_id: quote.id.clone(),
                created_at: quote.created_at,
                status: quote.status,
            }),
            pending: None,
            state: DraftState::Editing,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> &DraftState {
        &self.state
    }

    pub fn client(&self) -> Option<&Client> {
        self.client.as_ref()
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn fiscal(&self) -> &FiscalOptions {
        &self.fiscal
    }

    pub fn delivery(&self) -> &DeliverySelection {
        &self.delivery
    }

    pub fn service(&self) -> &ServiceCharge {
        &self.service
    }

    pub fn validity_days(&self) -> i64 {
        self.validity_days
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Id of the stored quote this draft edits, if any.
    pub fn editing_quote_id(&self) -> Option<&str> {
        self.editing.as_ref().map(|ctx| ctx.quote_id.as_str())
    }

    /// Current totals. Pure; call as often as needed.
    pub fn totals(&self, policy: NegativeTotalPolicy) -> QuoteTotals {
        QuoteTotals::compute(
            self.cart.subtotal(),
            &self.fiscal,
            self.delivery.amount(),
            self.service.amount(),
            policy,
        )
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    fn touch(&mut self) {
        self.state = DraftState::Editing;
        self.pending = None;
    }

    pub fn select_client(&mut self, client: Client) {
        self.client = Some(client);
        self.touch();
    }

    pub fn clear_client(&mut self) {
        self.client = None;
        self.touch();
    }

    pub fn add_product(&mut self, product: &Product) {
        self.cart.add_item(product);
        self.touch();
    }

    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        self.cart.set_quantity(product_id, quantity)?;
        self.touch();
        Ok(())
    }

    pub fn set_unit_price(&mut self, product_id: &str, price: Money) -> CoreResult<()> {
        self.cart.set_unit_price(product_id, price)?;
        self.touch();
        Ok(())
    }

    pub fn set_unit_price_input(&mut self, product_id: &str, input: &str) -> CoreResult<()> {
        self.cart.set_unit_price_input(product_id, input)?;
        self.touch();
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<()> {
        self.cart.remove_item(product_id)?;
        self.touch();
        Ok(())
    }

    pub fn set_discount_percent(&mut self, percent: Rate) {
        self.fiscal.discount_percent = percent;
        self.touch();
    }

    pub fn set_tax_percent(&mut self, percent: Rate) {
        self.fiscal.tax_percent = percent;
        self.touch();
    }

    pub fn set_breakdown_shown(&mut self, shown: bool) {
        self.fiscal.breakdown_shown = shown;
        self.touch();
    }

    pub fn set_withholding_enabled(&mut self, kind: WithholdingKind, enabled: bool) {
        self.fiscal.withholdings.set_enabled(kind, enabled);
        self.touch();
    }

    pub fn set_withholding_percent(&mut self, kind: WithholdingKind, percent: Rate) {
        self.fiscal.withholdings.set_percent(kind, percent);
        self.touch();
    }

    /// Unchecking delivery drops the zone as well.
    pub fn include_delivery(&mut self, included: bool) {
        self.delivery.set_included(included);
        self.touch();
    }

    pub fn select_zone(&mut self, zone: DeliveryZone) {
        self.delivery.select_zone(zone);
        self.touch();
    }

    pub fn include_service(&mut self, included: bool) {
        self.service.included = included;
        self.touch();
    }

    pub fn set_service_price(&mut self, price: Money) {
        self.service.price = price.max(Money::zero());
        self.touch();
    }

    pub fn set_service_price_input(&mut self, input: &str) {
        self.service.set_price_input(input);
        self.touch();
    }

    pub fn set_service_type(&mut self, service_type: ServiceType) {
        self.service.service_type = service_type;
        self.touch();
    }

    pub fn set_service_description(&mut self, description: impl Into<String>) {
        self.service.description = description.into();
        self.touch();
    }

    /// Non-positive values fall back to the default validity.
    pub fn set_validity_days(&mut self, days: i64) {
        self.validity_days = if days > 0 { days } else { DEFAULT_VALIDITY_DAYS };
        self.touch();
    }

    pub fn set_seller_name(&mut self, name: impl Into<String>) {
        self.seller_name = name.into();
        self.touch();
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
        self.touch();
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Checks the submit guards, in the order the seller fixes them.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.cart.is_empty() {
            return Err(ValidationError::EmptyCart);
        }
        if self.client.is_none() {
            return Err(ValidationError::MissingClient);
        }
        if self.delivery.is_missing_zone() {
            return Err(ValidationError::MissingDeliveryZone);
        }
        if self.service.is_missing_price() {
            return Err(ValidationError::MissingServicePrice);
        }
        Ok(())
    }

    /// Validates and moves to `Submitting`, returning what to persist.
    ///
    /// On a validation error the draft stays in `Editing` and nothing is
    /// produced.
    ///
    /// ## Example
    /// ```rust
    /// use cotiza_core::draft::QuoteDraft;
    /// use cotiza_core::error::{CoreError, ValidationError};
    /// use cotiza_core::totals::NegativeTotalPolicy;
    /// use cotiza_core::types::Session;
    ///
    /// let session = Session {
    ///     user_id: "u1".into(),
    ///     seller_id: "s1".into(),
    ///     display_name: "Juan Pérez".into(),
    /// };
    /// let mut draft = QuoteDraft::new();
    ///
    /// let err = draft
    ///     .begin_submit(&session, NegativeTotalPolicy::Allow, chrono::Utc::now())
    ///     .unwrap_err();
    /// assert!(matches!(err, CoreError::Validation(ValidationError::EmptyCart)));
    /// ```
    pub fn begin_submit(
        &mut self,
        session: &Session,
        policy: NegativeTotalPolicy,
        now: DateTime<Utc>,
    ) -> CoreResult<SubmitPlan> {
        if self.state == DraftState::Submitting {
            return Err(CoreError::InvalidDraftState {
                current: self.state.to_string(),
                operation: "begin submit".to_string(),
            });
        }

        if let Err(err) = self.validate() {
            self.state = DraftState::Editing;
            return Err(err.into());
        }
        let client = self.client.as_ref().ok_or(ValidationError::MissingClient)?;

        let context = self.editing.clone().unwrap_or_else(|| EditingContext {
            quote_id: uuid::Uuid::new_v4().to_string(),
            created_at: now,
            status: QuoteStatus::Pending,
        });
        let is_update = self.editing.is_some();

        let totals = self.totals(policy).rounded();
        let withholdings = &self.fiscal.withholdings;
        let seller_name = if self.seller_name.trim().is_empty() {
            session.display_name.clone()
        } else {
            self.seller_name.trim().to_string()
        };

        let quote = Quote {
            id: context.quote_id.clone(),
            seller_id: session.seller_id.clone(),
            client_id: (!client.id.is_empty()).then(|| client.id.clone()),
            client_name: client.name.clone(),
            client_tax_id: client.tax_id.clone().unwrap_or_default(),
            client_phone: client.phone.clone().unwrap_or_default(),
            client_email: client.email.clone().unwrap_or_default(),
            client_address: client.address.clone().unwrap_or_default(),
            client_city: client.city.clone().unwrap_or_default(),
            status: context.status,
            validity_days: self.validity_days,
            seller_name,
            notes: self.notes.clone(),
            discount_percent: self.fiscal.discount_percent,
            tax_percent: self.fiscal.tax_percent,
            breakdown_shown: self.fiscal.breakdown_shown,
            retefuente_percent: withholdings.retefuente.persisted_percent(),
            reteiva_percent: withholdings.reteiva.persisted_percent(),
            ica_percent: withholdings.ica.persisted_percent(),
            reteica_percent: withholdings.reteica.persisted_percent(),
            delivery_zone_id: self.delivery.zone_id(),
            subtotal: totals.subtotal.units(),
            tax_base: totals.tax_base.units(),
            tax_amount: totals.tax_amount.units(),
            discount_amount: totals.discount_amount.units(),
            delivery_amount: totals.delivery_amount.units(),
            service_amount: totals.service_amount.units(),
            retefuente_amount: totals.retefuente.units(),
            reteiva_amount: totals.reteiva.units(),
            ica_amount: totals.ica.units(),
            reteica_amount: totals.reteica.units(),
            total: totals.total.units(),
            created_at: context.created_at,
            updated_at: now,
        };

        let lines = self.cart.line_records(&quote.id);
        let ticket = self.service.companion_ticket(
            &session.seller_id,
            &quote.id,
            &client.name,
            client.phone.as_deref().unwrap_or_default(),
            now,
        );

        self.pending = Some(context);
        self.state = DraftState::Submitting;

        Ok(SubmitPlan {
            quote,
            lines,
            ticket,
            is_update,
        })
    }

    /// Completes a submission. Later saves update the same quote and do not
    /// create another companion ticket.
    pub fn mark_saved(&mut self, quote_id: &str) -> CoreResult<()> {
        if self.state != DraftState::Submitting {
            return Err(CoreError::InvalidDraftState {
                current: self.state.to_string(),
                operation: "mark saved".to_string(),
            });
        }
        self.editing = self.pending.take();
        if self.service.included && self.service.price.is_positive() {
            self.service.ticket_already_created = true;
        }
        self.state = DraftState::Saved {
            quote_id: quote_id.to_string(),
        };
        Ok(())
    }

    /// Records a backend failure; the draft is kept for retry.
    pub fn mark_failed(&mut self, message: impl Into<String>) -> CoreResult<()> {
        if self.state != DraftState::Submitting {
            return Err(CoreError::InvalidDraftState {
                current: self.state.to_string(),
                operation: "mark failed".to_string(),
            });
        }
        self.pending = None;
        self.state = DraftState::SaveFailed {
            message: message.into(),
        };
        Ok(())
    }
}
