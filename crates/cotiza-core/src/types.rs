//! # Domain Types
//!
//! Records shared by every layer of Cotiza.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Quote       │   │ WorkshopTicket  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  reference      │   │  client snapshot│   │  quote_id (FK)  │       │
//! │  │  sale_price     │   │  fiscal options │   │  service_type   │       │
//! │  └─────────────────┘   │  rounded totals │   │  estimated_price│       │
//! │                        └────────┬────────┘   └─────────────────┘       │
//! │  ┌─────────────────┐            │                                       │
//! │  │  DeliveryZone   │   ┌────────▼────────┐   ┌─────────────────┐       │
//! │  │  neighborhood   │   │ QuoteLineRecord │   │     Client      │       │
//! │  │  price          │   │ qty × unit_price│   │  seller-scoped  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A quote copies the client's name, tax id, phone, email, address and city
//! at save time, and each line record freezes the unit price. Later edits to
//! the client or product do not rewrite saved quotes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Rate};
use crate::tax::TaxMode;
use crate::withholding::WithholdingKind;

// =============================================================================
// Session
// =============================================================================

/// The signed-in seller, passed explicitly to every operation.
///
/// `seller_id` is an opaque tenant filter: every read and write of clients,
/// quotes and tickets is scoped by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Session {
    pub user_id: String,
    pub seller_id: String,
    pub display_name: String,
}

// =============================================================================
// Business Profile
// =============================================================================

/// The business issuing quotes, printed on documents and message signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BusinessProfile {
    pub name: String,
    pub address: String,
    pub phone: String,
    /// Dialing prefix added to local client numbers, without `+`.
    pub country_code: String,
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product that can be quoted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business reference code, searched alongside the name.
    pub reference: String,

    /// Display name shown on the quote and the document.
    pub name: String,

    pub brand: Option<String>,

    /// List price in whole currency units. Seeds the line's unit price.
    pub sale_price: i64,

    pub stock: i64,

    /// Picture printed on the document when reachable.
    pub image_url: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_units(self.sale_price)
    }
}

// =============================================================================
// Client
// =============================================================================

/// A customer registered by a seller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Client {
    pub id: String,
    pub seller_id: String,
    pub name: String,
    pub phone: Option<String>,
    /// NIT or cédula.
    pub tax_id: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Delivery Zone
// =============================================================================

/// A neighborhood with a flat delivery fee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeliveryZone {
    pub id: String,
    pub neighborhood: String,
    /// Flat fee in whole currency units.
    pub price: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl DeliveryZone {
    #[inline]
    pub fn fee(&self) -> Money {
        Money::from_units(self.price)
    }
}

// =============================================================================
// Quote Status
// =============================================================================

/// Lifecycle of a saved quote.
///
/// ```text
///              ┌──────────► Accepted ──┐
///   Pending ───┤                       ├──► Pending
///              └──────────► Rejected ──┘
/// ```
///
/// Every change is an explicit seller action. Accepted and Rejected never
/// flip into each other directly; the quote goes back to Pending first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Pending,
    Accepted,
    Rejected,
}

impl Default for QuoteStatus {
    fn default() -> Self {
        QuoteStatus::Pending
    }
}

impl QuoteStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Pending => "pending",
            QuoteStatus::Accepted => "accepted",
            QuoteStatus::Rejected => "rejected",
        }
    }

    pub fn can_transition_to(&self, next: QuoteStatus) -> bool {
        matches!(
            (self, next),
            (QuoteStatus::Pending, QuoteStatus::Accepted)
                | (QuoteStatus::Pending, QuoteStatus::Rejected)
                | (QuoteStatus::Accepted, QuoteStatus::Pending)
                | (QuoteStatus::Rejected, QuoteStatus::Pending)
        )
    }

    /// Validates a status change and returns the new status.
    ///
    /// ## Example
    /// ```rust
    /// use cotiza_core::types::QuoteStatus;
    ///
    /// let status = QuoteStatus::Pending.transition_to(QuoteStatus::Accepted).unwrap();
    /// assert_eq!(status, QuoteStatus::Accepted);
    /// assert!(status.transition_to(QuoteStatus::Rejected).is_err());
    /// ```
    pub fn transition_to(&self, next: QuoteStatus) -> CoreResult<QuoteStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidStatusTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QuoteStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(QuoteStatus::Pending),
            "accepted" => Ok(QuoteStatus::Accepted),
            "rejected" => Ok(QuoteStatus::Rejected),
            other => Err(CoreError::Validation(
                crate::error::ValidationError::InvalidFormat {
                    field: "status".to_string(),
                    reason: format!("unknown status '{}'", other),
                },
            )),
        }
    }
}

// =============================================================================
// Quote
// =============================================================================

/// A persisted quote: client snapshot, flattened fiscal options and the
/// totals rounded at save time.
///
/// Withholding percents are stored as zero when the withholding was off, so
/// a percent above zero means "enabled" on reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Quote {
    pub id: String,
    pub seller_id: String,
    pub client_id: Option<String>,

    // Client snapshot
    pub client_name: String,
    pub client_tax_id: String,
    pub client_phone: String,
    pub client_email: String,
    pub client_address: String,
    pub client_city: String,

    pub status: QuoteStatus,
    pub validity_days: i64,
    pub seller_name: String,
    pub notes: String,

    // Fiscal options
    pub discount_percent: Rate,
    pub tax_percent: Rate,
    /// Prices already include the tax and the document shows the split.
    pub breakdown_shown: bool,
    pub retefuente_percent: Rate,
    pub reteiva_percent: Rate,
    pub ica_percent: Rate,
    pub reteica_percent: Rate,
    pub delivery_zone_id: Option<String>,

    // Rounded totals
    pub subtotal: i64,
    pub tax_base: i64,
    pub tax_amount: i64,
    pub discount_amount: i64,
    pub delivery_amount: i64,
    pub service_amount: i64,
    pub retefuente_amount: i64,
    pub reteiva_amount: i64,
    pub ica_amount: i64,
    pub reteica_amount: i64,
    pub total: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Quote {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_units(self.total)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_units(self.subtotal)
    }

    /// The tax mode the quote was priced with.
    pub fn tax_mode(&self) -> TaxMode {
        TaxMode::from_flags(self.tax_percent, self.breakdown_shown)
    }

    pub fn withholding_percent(&self, kind: WithholdingKind) -> Rate {
        match kind {
            WithholdingKind::Retefuente => self.retefuente_percent,
            WithholdingKind::Reteiva => self.reteiva_percent,
            WithholdingKind::Ica => self.ica_percent,
            WithholdingKind::Reteica => self.reteica_percent,
        }
    }

    pub fn withholding_amount(&self, kind: WithholdingKind) -> Money {
        Money::from_units(match kind {
            WithholdingKind::Retefuente => self.retefuente_amount,
            WithholdingKind::Reteiva => self.reteiva_amount,
            WithholdingKind::Ica => self.ica_amount,
            WithholdingKind::Reteica => self.reteica_amount,
        })
    }

    /// Sum of the four stored withholding amounts.
    pub fn withholding_total(&self) -> Money {
        WithholdingKind::ALL
            .iter()
            .map(|kind| self.withholding_amount(*kind))
            .sum()
    }
}

// =============================================================================
// Quote Lines
// =============================================================================

/// An immutable line row written when a quote is saved.
///
/// `line_subtotal` is always `quantity × unit_price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuoteLineRecord {
    pub quote_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub line_subtotal: i64,
}

/// A line row joined with the product fields needed to show it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuoteLineView {
    pub product_id: String,
    pub product_name: String,
    pub product_reference: String,
    pub image_url: Option<String>,
    pub quantity: i64,
    pub unit_price: i64,
    pub line_subtotal: i64,
}

impl QuoteLineView {
    #[inline]
    pub fn line_subtotal(&self) -> Money {
        Money::from_units(self.line_subtotal)
    }
}

// =============================================================================
// Workshop Ticket
// =============================================================================

/// Kind of in-shop service bundled with a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Maintenance,
    Repair,
    Inspection,
}

impl Default for ServiceType {
    fn default() -> Self {
        ServiceType::Maintenance
    }
}

impl ServiceType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Maintenance => "maintenance",
            ServiceType::Repair => "repair",
            ServiceType::Inspection => "inspection",
        }
    }
}

/// Progress of a workshop ticket. New tickets start at `Received`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Received,
    Diagnosis,
    Repairing,
    Ready,
    Delivered,
}

impl Default for TicketStatus {
    fn default() -> Self {
        TicketStatus::Received
    }
}

impl TicketStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Received => "received",
            TicketStatus::Diagnosis => "diagnosis",
            TicketStatus::Repairing => "repairing",
            TicketStatus::Ready => "ready",
            TicketStatus::Delivered => "delivered",
        }
    }
}

/// Companion service record created alongside a quote that bundles an
/// in-shop service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WorkshopTicket {
    pub id: String,
    pub seller_id: String,
    pub quote_id: Option<String>,
    pub client_name: String,
    pub client_phone: String,
    pub service_type: ServiceType,
    pub description: String,
    pub status: TicketStatus,
    /// Equal to the quote's service amount.
    pub estimated_price: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}
