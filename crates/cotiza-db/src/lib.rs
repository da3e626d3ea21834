//! # cotiza-db
//!
//! SQLite persistence for quotes, their lines, the catalog, delivery
//! zones and workshop tickets.
//!
//! ```text
//!   cotiza-app commands
//!          │
//!          ▼
//!   Database ── quotes()    QuoteRepository       quotes, quote_lines
//!      │     ── clients()   ClientRepository      clients
//!      │     ── products()  ProductRepository     products
//!      │     ── zones()     DeliveryZoneRepository delivery_zones
//!      │     ── workshop()  WorkshopRepository    workshop_tickets
//!      ▼
//!   SqlitePool ──► cotiza.db (schema from migrations/sqlite)
//! ```
//!
//! Every quote read and write is scoped by seller id; a quote belonging to
//! someone else looks exactly like a missing one.
//!
//! ```rust,ignore
//! use cotiza_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("cotiza.db")).await?;
//! let mine = db.quotes().list_for_seller("seller-1").await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, Location};
pub use repository::client::ClientRepository;
pub use repository::delivery_zone::DeliveryZoneRepository;
pub use repository::product::ProductRepository;
pub use repository::quote::{QuoteRepository, SaveOutcome};
pub use repository::workshop::WorkshopRepository;
