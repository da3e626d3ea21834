//! Errors raised by the pricing core.
//!
//! ```text
//!   ValidationError ──(#[from])──► CoreError ──► ApiError (cotiza-app)
//!   DbError (cotiza-db) ─────────────────────────► ApiError
//! ```
//!
//! A [`ValidationError`] is always raised before the backend is touched,
//! so the draft survives and the seller only has to fix the field.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Quantity change or removal for a product the cart does not hold.
    #[error("Product {0} is not in the cart")]
    ItemNotInCart(String),

    /// `mark_saved`/`mark_failed` with no submission in flight, or a
    /// second `begin_submit` while one is.
    #[error("Quote draft is {current}, cannot {operation}")]
    InvalidDraftState { current: String, operation: String },

    /// e.g. reopening a rejected quote as pending.
    #[error("Cannot change quote status from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    /// The client's phone has no usable digits for the chat link.
    #[error("Invalid phone number: {reason}")]
    InvalidPhone { reason: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Bad input from the seller. The message is shown as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Bounds are kept as text so decimals and integers share the variant.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Malformed id, or a percentage that does not parse.
    #[error("{field} is malformed: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Submit attempted with no line items.
    #[error("Add at least one product to the quote")]
    EmptyCart,

    /// Submit attempted without a client.
    #[error("Select a client for the quote")]
    MissingClient,

    /// Delivery is included but no zone was picked.
    #[error("Select a delivery zone")]
    MissingDeliveryZone,

    /// Workshop service is included without a positive price.
    #[error("Enter the workshop service price")]
    MissingServicePrice,
}

impl ValidationError {
    pub fn out_of_range(
        field: impl Into<String>,
        min: impl ToString,
        max: impl ToString,
    ) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
