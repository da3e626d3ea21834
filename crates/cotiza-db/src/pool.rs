//! # Connection Pool
//!
//! Opens the quote store and hands out repositories.
//!
//! ```text
//!   DbConfig ──► Database::new ──► SqlitePool ──► migrations
//!                                      │
//!             ┌──────────┬─────────────┼────────────┬────────────┐
//!             ▼          ▼             ▼            ▼            ▼
//!          quotes()   clients()   products()     zones()    workshop()
//! ```
//!
//! A file store runs in WAL mode so catalog reads proceed while a quote
//! save holds the write lock. Foreign keys are switched on for every
//! connection; deleting a quote relies on `ON DELETE CASCADE` to drop its
//! lines.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::client::ClientRepository;
use crate::repository::delivery_zone::DeliveryZoneRepository;
use crate::repository::product::ProductRepository;
use crate::repository::quote::QuoteRepository;
use crate::repository::workshop::WorkshopRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Where the quote store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// SQLite file, created on first open.
    File(PathBuf),
    /// Private in-memory store. Gone when the pool closes.
    Memory,
}

/// How to open the quote store.
///
/// ## Example
/// ```rust
/// use cotiza_db::DbConfig;
///
/// let config = DbConfig::new("/var/lib/cotiza/cotiza.db").max_connections(8);
/// assert_eq!(config.max_connections, 8);
/// assert!(DbConfig::in_memory().location_is_memory());
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub location: Location,
    /// Upper bound on pooled connections. Forced to 1 in memory.
    pub max_connections: u32,
    /// How long a caller waits for a free connection.
    pub acquire_timeout: Duration,
    /// Apply pending migrations while opening.
    pub migrate: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            location: Location::File(path.into()),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            migrate: true,
        }
    }

    /// In-memory store for tests and throwaway sessions.
    pub fn in_memory() -> Self {
        DbConfig {
            location: Location::Memory,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            migrate: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Opens without touching the schema.
    pub fn skip_migrations(mut self) -> Self {
        self.migrate = false;
        self
    }

    pub fn location_is_memory(&self) -> bool {
        self.location == Location::Memory
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = match &self.location {
            Location::File(path) => file_options(path),
            Location::Memory => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?,
        };
        Ok(options
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true))
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new().acquire_timeout(self.acquire_timeout);
        match self.location {
            // Each connection to `:memory:` is a separate database, so the
            // single connection must never be recycled.
            Location::Memory => options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None),
            Location::File(_) => options
                .max_connections(self.max_connections.max(1))
                .min_connections(1)
                .idle_timeout(Some(Duration::from_secs(600)))
                .max_lifetime(Some(Duration::from_secs(1800))),
        }
    }
}

fn file_options(path: &Path) -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .filename(path)
        .journal_mode(SqliteJournalMode::Wal)
        .create_if_missing(true)
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the quote store. Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, unless disabled, brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        match &config.location {
            Location::File(path) => info!(path = %path.display(), "Opening quote store"),
            Location::Memory => info!("Opening in-memory quote store"),
        }

        let pool = config
            .pool_options()
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(max_connections = config.max_connections, "Pool ready");

        let db = Database { pool };
        if config.migrate {
            migrations::run_migrations(&db.pool).await?;
        }
        Ok(db)
    }

    /// Raw pool, for queries no repository covers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn quotes(&self) -> QuoteRepository {
        QuoteRepository::new(self.pool.clone())
    }

    pub fn clients(&self) -> ClientRepository {
        ClientRepository::new(self.pool.clone())
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn zones(&self) -> DeliveryZoneRepository {
        DeliveryZoneRepository::new(self.pool.clone())
    }

    pub fn workshop(&self) -> WorkshopRepository {
        WorkshopRepository::new(self.pool.clone())
    }

    /// Waits for checked-out connections, then closes the pool.
    pub async fn close(&self) {
        info!("Closing quote store");
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_is_migrated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);

        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
    }

    #[tokio::test]
    async fn test_skip_migrations_leaves_schema_empty() {
        let db = Database::new(DbConfig::in_memory().skip_migrations()).await.unwrap();
        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert!(total > 0);
        assert_eq!(applied, 0);
    }

    #[test]
    fn test_file_location() {
        let config = DbConfig::new("/tmp/cotiza-test.db").max_connections(3);
        assert_eq!(config.location, Location::File(PathBuf::from("/tmp/cotiza-test.db")));
        assert_eq!(config.max_connections, 3);
        assert!(config.migrate);
        assert!(DbConfig::in_memory().location_is_memory());
    }
}
