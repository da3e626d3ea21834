//! # Storage Errors
//!
//! Everything that can go wrong between a repository call and SQLite.
//!
//! ```text
//!   sqlx::Error ──► DbError ──► ApiError (cotiza-app)
//!                      │
//!                      └── a failed quote save leaves the draft in
//!                          SaveFailed so the seller can retry
//! ```
//!
//! SQLite reports constraint failures only as message text, so
//! [`classify`] inspects the message to tell a duplicate key from a
//! dangling reference.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// No row matched, or the row belongs to a different seller.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the write (e.g. a repeated product reference).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A quote, line or ticket points at a client, product or zone that
    /// is not stored.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Any other statement error. CHECK constraint failures land here.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// BEGIN or COMMIT of a quote save did not go through.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A rate column held text that does not parse as a percentage.
    #[error("Corrupt {column} value: '{value}'")]
    Corrupt { column: String, value: String },

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn corrupt(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Corrupt {
            column: column.into(),
            value: value.into(),
        }
    }
}

const UNIQUE_PREFIX: &str = "UNIQUE constraint failed: ";
const FOREIGN_KEY_MARKER: &str = "FOREIGN KEY constraint failed";

/// Maps a SQLite error message onto the matching [`DbError`].
///
/// `UNIQUE constraint failed: products.reference` keeps the
/// `products.reference` part as the offending field.
pub(crate) fn classify(message: &str) -> DbError {
    if let Some(pos) = message.find(UNIQUE_PREFIX) {
        let field = message[pos + UNIQUE_PREFIX.len()..].trim();
        return DbError::duplicate(if field.is_empty() { "unknown" } else { field }, "unknown");
    }
    if message.contains(FOREIGN_KEY_MARKER) {
        return DbError::ForeignKeyViolation {
            message: message.to_string(),
        };
    }
    DbError::QueryFailed(message.to_string())
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => classify(db_err.message()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_failure_names_the_column() {
        let err = classify("UNIQUE constraint failed: products.reference");
        match err {
            DbError::UniqueViolation { field, .. } => assert_eq!(field, "products.reference"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_foreign_key_failure() {
        let err = classify("FOREIGN KEY constraint failed");
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[test]
    fn test_check_failure_is_a_query_error() {
        let err = classify("CHECK constraint failed: quantity > 0");
        assert!(matches!(err, DbError::QueryFailed(_)));
    }

    #[test]
    fn test_row_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.to_string(), "Record not found: unknown");
    }
}
