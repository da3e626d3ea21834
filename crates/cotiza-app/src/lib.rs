//! # cotiza-app
//!
//! Orchestration layer: configuration, session context, and the commands a
//! front end calls.
//!
//! ## Module Organization
//! ```text
//! cotiza_app/
//! ├── lib.rs          ◄─── You are here (tracing setup, exports)
//! ├── config.rs       ◄─── AppConfig (TOML + COTIZA_* env)
//! ├── state.rs        ◄─── AppState { db, config }
//! ├── error.rs        ◄─── ApiError for commands
//! └── commands/
//!     ├── quote.rs    ◄─── Totals, submit, reload, status, delete
//!     ├── catalog.rs  ◄─── Product/zone search, clients
//!     └── document.rs ◄─── Document rendering, messaging link
//! ```
//!
//! ## Command Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  front end ──► command(&AppState, &Session, args) ──► ApiResult<T>      │
//! │                     │                                                   │
//! │                     ├── cotiza-core: draft, totals, numbering, text     │
//! │                     └── cotiza-db:   repositories, quote transaction    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The session is always an argument. Nothing reads a global "current
//! seller".

pub mod commands;
pub mod config;
pub mod error;
pub mod state;

use tracing_subscriber::EnvFilter;

pub use config::AppConfig;
pub use error::{ApiError, ApiResult, ConfigError, ErrorCode};
pub use state::AppState;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=cotiza=trace` - Show trace for cotiza crates only
/// - Default: `info,cotiza=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cotiza=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
