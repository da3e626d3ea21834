//! # Commands Module
//!
//! Every operation a front end can call.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (exports)
//! ├── quote.rs     ◄─── compute_totals, submit_quote, load_draft, get_quote,
//! │                     list_quotes, set_status, delete_quote
//! ├── catalog.rs   ◄─── search_products, search_zones, list_clients
//! └── document.rs  ◄─── render_document, whatsapp_link
//! ```
//!
//! ## Calling Convention
//! ```rust,ignore
//! let state = AppState::open(AppConfig::load(None)?).await?;
//! let session = Session { user_id, seller_id, display_name };
//!
//! let mut draft = commands::quote::new_draft(&state);
//! draft.add_product(&product);
//! draft.select_client(client);
//! let saved = commands::quote::submit_quote(&state, &session, &mut draft).await?;
//! ```

pub mod catalog;
pub mod document;
pub mod quote;
