//! # Repository Module
//!
//! Database repository implementations for Cotiza.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Command                                                               │
//! │       │                                                                 │
//! │       │  db.quotes().save(&plan)                                       │
//! │       ▼                                                                 │
//! │  QuoteRepository                                                       │
//! │  ├── save / create / replace   (one transaction)                       │
//! │  ├── get / lines / list_for_seller                                     │
//! │  └── update_status / delete                                            │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Seller-owned records (clients, quotes, workshop tickets) are always read
//! through a `seller_id` filter. Products and delivery zones are a shared
//! catalog.
//!
//! ## Available Repositories
//!
//! - [`quote::QuoteRepository`] - Quote headers, lines, save transaction
//! - [`client::ClientRepository`] - Seller's clients
//! - [`product::ProductRepository`] - Product catalog
//! - [`delivery_zone::DeliveryZoneRepository`] - Delivery zones and fees
//! - [`workshop::WorkshopRepository`] - Workshop tickets

pub mod client;
pub mod delivery_zone;
pub mod product;
pub mod quote;
pub mod workshop;

use std::str::FromStr;

use cotiza_core::Rate;

use crate::error::{DbError, DbResult};

/// Text stored in a percentage column: the plain decimal, no `%`.
pub(crate) fn rate_to_text(rate: Rate) -> String {
    rate.as_decimal().to_string()
}

/// Reads a percentage column back into a [`Rate`].
pub(crate) fn rate_from_text(column: &str, value: &str) -> DbResult<Rate> {
    Rate::from_str(value).map_err(|_| DbError::corrupt(column, value))
}
