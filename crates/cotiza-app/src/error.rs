//! The error every command returns.
//!
//! ```text
//!   ValidationError  empty cart, missing client ...   ──► VALIDATION_ERROR
//!   CoreError        status change, phone, draft state ──► BUSINESS_LOGIC
//!                                                          INVALID_PHONE
//!   DbError          any failed read or write           ──► DATABASE_ERROR
//!                                                          NOT_FOUND
//!   document that cannot be produced at all             ──► RENDER_ERROR
//! ```
//!
//! Validation failures never reach the database. Backend messages are passed
//! through unchanged, and nothing is retried at this layer.

use serde::Serialize;
use thiserror::Error;

use cotiza_core::{CoreError, ValidationError};
use cotiza_db::DbError;

/// Serialized for the front end as
/// ```json
/// {
///   "code": "VALIDATION_ERROR",
///   "message": "Add at least one product to the quote"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: ErrorCode,
    /// Shown to the seller.
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    /// The draft is untouched.
    ValidationError,
    DatabaseError,
    BusinessLogic,
    /// No chat link can be built for the client's phone.
    InvalidPhone,
    RenderError,
    ConfigError,
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// `"Quote not found: <id>"`, same wording as the store uses.
    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("{entity} not found: {id}"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RenderError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

/// Backend failures reach the seller verbatim; internal ones are logged too.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        let message = err.to_string();
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { .. } => ApiError::new(ErrorCode::ValidationError, message),
            DbError::ForeignKeyViolation { message: detail } => {
                tracing::error!("Foreign key violation: {}", detail);
                ApiError::new(ErrorCode::ValidationError, message)
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, message)
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, message)
            }
            DbError::Corrupt { column, value } => {
                tracing::error!(column = %column, value = %value, "Corrupt stored value");
                ApiError::new(ErrorCode::DatabaseError, message)
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, message)
            }
            DbError::ConnectionFailed(_) | DbError::MigrationFailed(_) | DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, message)
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => ApiError::from(e),
            CoreError::InvalidPhone { .. } => ApiError::new(ErrorCode::InvalidPhone, err.to_string()),
            _ => ApiError::new(ErrorCode::BusinessLogic, err.to_string()),
        }
    }
}

/// Converts validation errors to API errors.
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for commands.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors raised while loading or saving [`crate::config::AppConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value is present but unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The file could not be read or parsed.
    #[error("Failed to load config: {0}")]
    LoadFailed(String),

    /// The file could not be written.
    #[error("Failed to save config: {0}")]
    SaveFailed(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::SaveFailed(err.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
