//! # Application State
//!
//! Everything a command needs besides its arguments.
//!
//! ## Thread Safety
//! `Database` wraps a `SqlitePool`, which is thread-safe and cheap to
//! clone. `AppConfig` is read-only after startup. Drafts are owned by the
//! caller and passed in explicitly, so no locking is needed here.

use tracing::info;

use cotiza_db::{Database, DbConfig};

use crate::config::AppConfig;
use crate::error::ApiResult;

#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(db: Database, config: AppConfig) -> Self {
        AppState { db, config }
    }

    /// Opens the configured database file and applies migrations.
    pub async fn open(config: AppConfig) -> ApiResult<Self> {
        let path = config.database_path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                crate::error::ApiError::internal(format!(
                    "Could not create data directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        info!(?path, "Opening database");
        let db = Database::new(DbConfig::new(path)).await?;
        Ok(AppState::new(db, config))
    }

    /// Fresh in-memory database, for tests and demos.
    pub async fn in_memory(config: AppConfig) -> ApiResult<Self> {
        let db = Database::new(DbConfig::in_memory()).await?;
        Ok(AppState::new(db, config))
    }
}
