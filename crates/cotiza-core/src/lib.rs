//! # cotiza-core: Pure Quotation Logic for Cotiza
//!
//! This crate is the **heart** of Cotiza. It contains the quotation pricing
//! engine and everything derived from it as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cotiza Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    cotiza-app (commands)                        │   │
//! │  │    submit_quote, render_document, whatsapp_link, ...            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cotiza-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   money ─► cart ─► tax ─► withholding ─► surcharge ─► totals   │   │
//! │  │                                                        │        │   │
//! │  │                      draft (state machine) ◄───────────┘        │   │
//! │  │   numbering • document • messaging • catalog • validation      │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    cotiza-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - `Money` (whole currency units), `Rate` (decimal percent), rounding
//! - [`cart`] - Line-item aggregator
//! - [`tax`] - Tax/discount decomposition with explicit `TaxMode`
//! - [`withholding`] - The four Colombian withholdings
//! - [`surcharge`] - Delivery and workshop-service fees
//! - [`totals`] - Totals assembler and persistence rounding
//! - [`draft`] - Quote draft state machine and submit plan
//! - [`numbering`] - Read-time sequential quote numbers
//! - [`document`] - Document breakdown recomputed from a persisted quote
//! - [`messaging`] - Messaging deep-link handoff
//! - [`catalog`] - Product and delivery-zone text search
//! - [`types`] - Records (Product, Client, Quote, WorkshopTicket, ...)
//! - [`validation`] - Field validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use cotiza_core::money::{Money, Rate};
//! use cotiza_core::totals::{FiscalOptions, NegativeTotalPolicy, QuoteTotals};
//!
//! let mut options = FiscalOptions::default();
//! options.discount_percent = Rate::percent("10").unwrap();
//! options.tax_percent = Rate::percent("19").unwrap();
//!
//! let totals = QuoteTotals::compute(
//!     Money::from_units(200_000),
//!     &options,
//!     Money::zero(),
//!     Money::zero(),
//!     NegativeTotalPolicy::Allow,
//! );
//! assert_eq!(totals.rounded().total.units(), 214_200);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod document;
pub mod draft;
pub mod error;
pub mod messaging;
pub mod money;
pub mod numbering;
pub mod surcharge;
pub mod tax;
pub mod totals;
pub mod types;
pub mod validation;
pub mod withholding;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, LineItem};
pub use draft::{DraftState, QuoteDraft, SubmitPlan};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, Rate};
pub use tax::TaxMode;
pub use totals::{FiscalOptions, NegativeTotalPolicy, QuoteTotals, RoundedTotals};
pub use types::*;
pub use withholding::{Withholding, WithholdingKind, Withholdings};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// First sequence number handed out by [`numbering::quote_number`].
pub const DEFAULT_NUMBERING_START: u32 = 3001;

/// Days a quote stays valid unless the seller says otherwise.
pub const DEFAULT_VALIDITY_DAYS: i64 = 5;

/// Maximum number of product suggestions returned by a catalog search.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Description given to a companion workshop ticket when the seller leaves
/// the service description blank.
pub const DEFAULT_SERVICE_DESCRIPTION: &str = "Servicio agregado desde cotización";
