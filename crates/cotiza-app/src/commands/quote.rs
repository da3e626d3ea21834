//! # Quote Commands
//!
//! Drafting, saving and managing quotes.
//!
//! ## Submit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Quote Submit Flow                                    │
//! │                                                                         │
//! │  draft.begin_submit()                                                   │
//! │     │                                                                   │
//! │     ├── ValidationError ──► ApiError, draft stays Editing,              │
//! │     │                       no database call                            │
//! │     ▼                                                                   │
//! │  QuoteRepository::save(plan)   (one transaction)                        │
//! │     │                                                                   │
//! │     ├── DbError ──► draft.mark_failed(message) ──► ApiError             │
//! │     ▼                                                                   │
//! │  draft.mark_saved(id)                                                   │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  number = quote_number(quote, seller's quotes)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use cotiza_core::numbering::quote_number;
use cotiza_core::validation::validate_uuid;
use cotiza_core::{
    DeliveryZone, Money, Quote, QuoteDraft, QuoteLineView, QuoteStatus, RoundedTotals, Session,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// =============================================================================
// DTOs
// =============================================================================

/// What the seller sees after a successful save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResult {
    pub quote_id: String,
    /// `None` when the quote was stored but the listing that numbers it
    /// could not be read. The save itself succeeded.
    pub number: Option<String>,
    pub total: Money,
    /// An existing quote was rewritten rather than created.
    pub updated: bool,
    pub ticket_id: Option<String>,
    /// The quote was saved but its workshop ticket was not.
    pub ticket_error: Option<String>,
}

/// One row of the seller's quote list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummary {
    pub id: String,
    pub number: String,
    pub client_name: String,
    pub status: QuoteStatus,
    pub total: Money,
    pub created_at: DateTime<Utc>,
}

/// A stored quote with everything needed to show or send it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDetail {
    pub quote: Quote,
    pub number: String,
    pub lines: Vec<QuoteLineView>,
    /// `None` when no delivery was quoted or the zone has since been deleted.
    pub zone: Option<DeliveryZone>,
}

// =============================================================================
// Drafting
// =============================================================================

/// An empty draft seeded from the pricing configuration.
pub fn new_draft(state: &AppState) -> QuoteDraft {
    let pricing = &state.config.pricing;
    QuoteDraft::with_defaults(pricing.default_validity_days, pricing.withholdings())
}

/// Live totals for the draft, rounded the way they will be stored.
pub fn compute_totals(state: &AppState, draft: &QuoteDraft) -> RoundedTotals {
    draft
        .totals(state.config.pricing.negative_total_policy)
        .rounded()
}

/// Saves the draft, creating a quote or rewriting the one being edited.
///
/// Validation happens before anything touches the database. A backend
/// failure leaves the draft in `SaveFailed` with the backend's message so the
/// seller can retry.
pub async fn submit_quote(
    state: &AppState,
    session: &Session,
    draft: &mut QuoteDraft,
) -> ApiResult<SubmitResult> {
    let plan = draft.begin_submit(
        session,
        state.config.pricing.negative_total_policy,
        Utc::now(),
    )?;

    debug!(
        quote_id = %plan.quote.id,
        seller_id = %session.seller_id,
        lines = plan.lines.len(),
        update = plan.is_update,
        "submit_quote command"
    );

    let outcome = match state.db.quotes().save(&plan).await {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(quote_id = %plan.quote.id, error = %err, "Quote save failed");
            draft.mark_failed(err.to_string())?;
            return Err(err.into());
        }
    };
    draft.mark_saved(&outcome.quote_id)?;

    let number = match state.db.quotes().list_for_seller(&session.seller_id).await {
        Ok(all) => Some(quote_number(
            &plan.quote,
            &all,
            state.config.pricing.numbering_start,
        )),
        Err(err) => {
            warn!(quote_id = %outcome.quote_id, error = %err, "Quote saved but not numbered");
            None
        }
    };

    info!(
        quote_id = %outcome.quote_id,
        number = ?number,
        total = plan.quote.total,
        "Quote saved"
    );

    Ok(SubmitResult {
        quote_id: outcome.quote_id,
        number,
        total: plan.quote.total(),
        updated: plan.is_update,
        ticket_id: outcome.ticket_id,
        ticket_error: outcome.ticket_error,
    })
}

/// Rebuilds an editable draft from a stored quote.
pub async fn load_draft(state: &AppState, session: &Session, quote_id: &str) -> ApiResult<QuoteDraft> {
    debug!(quote_id = %quote_id, "load_draft command");

    let quote = fetch_quote(state, session, quote_id).await?;
    let lines = state.db.quotes().lines(&session.seller_id, &quote.id).await?;
    let zone = fetch_zone(state, &quote).await?;

    Ok(QuoteDraft::from_saved(&quote, lines, zone))
}

// =============================================================================
// Reading
// =============================================================================

pub async fn get_quote(state: &AppState, session: &Session, quote_id: &str) -> ApiResult<QuoteDetail> {
    debug!(quote_id = %quote_id, "get_quote command");

    let quote = fetch_quote(state, session, quote_id).await?;
    let all = state.db.quotes().list_for_seller(&session.seller_id).await?;
    let number = quote_number(&quote, &all, state.config.pricing.numbering_start);
    let lines = state.db.quotes().lines(&session.seller_id, &quote.id).await?;
    let zone = fetch_zone(state, &quote).await?;

    Ok(QuoteDetail {
        quote,
        number,
        lines,
        zone,
    })
}

/// The seller's quotes, newest first, with their display numbers.
pub async fn list_quotes(state: &AppState, session: &Session) -> ApiResult<Vec<QuoteSummary>> {
    let all = state.db.quotes().list_for_seller(&session.seller_id).await?;
    let start = state.config.pricing.numbering_start;

    let summaries: Vec<QuoteSummary> = all
        .iter()
        .rev()
        .map(|quote| QuoteSummary {
            id: quote.id.clone(),
            number: quote_number(quote, &all, start),
            client_name: quote.client_name.clone(),
            status: quote.status,
            total: quote.total(),
            created_at: quote.created_at,
        })
        .collect();

    debug!(seller_id = %session.seller_id, count = summaries.len(), "list_quotes command");
    Ok(summaries)
}

// =============================================================================
// Status and Deletion
// =============================================================================

/// Moves a quote to `status`. Only a pending quote can be accepted or
/// rejected, and only those can go back to pending.
pub async fn set_status(
    state: &AppState,
    session: &Session,
    quote_id: &str,
    status: QuoteStatus,
) -> ApiResult<QuoteStatus> {
    let quote = fetch_quote(state, session, quote_id).await?;
    let next = quote.status.transition_to(status)?;

    state
        .db
        .quotes()
        .update_status(&session.seller_id, &quote.id, next, Utc::now())
        .await?;

    Ok(next)
}

pub async fn delete_quote(state: &AppState, session: &Session, quote_id: &str) -> ApiResult<()> {
    validate_uuid(quote_id)?;
    state.db.quotes().delete(&session.seller_id, quote_id).await?;
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

pub(crate) async fn fetch_quote(state: &AppState, session: &Session, quote_id: &str) -> ApiResult<Quote> {
    validate_uuid(quote_id)?;
    state
        .db
        .quotes()
        .get(&session.seller_id, quote_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Quote", quote_id))
}

async fn fetch_zone(state: &AppState, quote: &Quote) -> ApiResult<Option<DeliveryZone>> {
    let Some(zone_id) = quote.delivery_zone_id.as_deref() else {
        return Ok(None);
    };

    let zone = state.db.zones().get_by_id(zone_id).await?;
    if zone.is_none() {
        warn!(quote_id = %quote.id, zone_id = %zone_id, "Quote references a deleted delivery zone");
    }
    Ok(zone)
}
