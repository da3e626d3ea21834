//! Field checks for values arriving from a front end.
//!
//! These run before a draft is modified. The submit gate
//! (`QuoteDraft::validate`) covers whole-draft rules such as an empty cart,
//! and SQLite CHECK and foreign-key constraints are the last line.
//!
//! ## Usage
//! ```rust
//! use cotiza_core::validation::{validate_percent, validate_validity_days};
//!
//! let rate = validate_percent("ica", "0,966").unwrap();
//! assert_eq!(rate.to_string(), "0.966%");
//! assert!(validate_validity_days(0).is_err());
//! ```

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::money::Rate;

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest free-text note accepted on a quote.
pub const MAX_NOTES_LEN: usize = 2_000;

/// Longest accepted search query.
pub const MAX_QUERY_LEN: usize = 100;

/// Upper bound for quote validity, in days.
pub const MAX_VALIDITY_DAYS: i64 = 365;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a client name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_client_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "client name".to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "client name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates free-text notes and returns them trimmed.
pub fn validate_notes(notes: &str) -> ValidationResult<String> {
    let notes = notes.trim();

    if notes.chars().count() > MAX_NOTES_LEN {
        return Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LEN,
        });
    }

    Ok(notes.to_string())
}

/// Trims a catalog search query. Empty is fine and matches everything.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_QUERY_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_QUERY_LEN,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Parses a percentage typed by the seller.
///
/// Accepts `.` or `,` as decimal separator. An empty string reads as 0.
///
/// ## Example
/// ```rust
/// use cotiza_core::validation::validate_percent;
///
/// assert!(validate_percent("tax", "19").is_ok());
/// assert!(validate_percent("tax", "").unwrap().is_zero());
/// assert!(validate_percent("tax", "120").is_err());
/// assert!(validate_percent("tax", "abc").is_err());
/// ```
pub fn validate_percent(field: &str, input: &str) -> ValidationResult<Rate> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(Rate::zero());
    }

    let value = Decimal::from_str(&input.replace(',', ".")).map_err(|_| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("'{}' is not a number", input),
        }
    })?;

    Rate::from_decimal(value).map_err(|_| ValidationError::out_of_range(field, 0, 100))
}

/// Validates a catalog or service price in whole currency units.
///
/// Zero is allowed.
pub fn validate_price(field: &str, units: i64) -> ValidationResult<()> {
    if units < 0 {
        return Err(ValidationError::out_of_range(field, 0, i64::MAX));
    }

    Ok(())
}

/// Validates a line quantity.
///
/// Zero and negatives are handled by the cart (they remove the line), so
/// only values the cart would keep are checked here.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates quote validity in days.
pub fn validate_validity_days(days: i64) -> ValidationResult<()> {
    if !(1..=MAX_VALIDITY_DAYS).contains(&days) {
        return Err(ValidationError::out_of_range(
            "validity days",
            1,
            MAX_VALIDITY_DAYS,
        ));
    }

    Ok(())
}

/// Rejects ids that cannot be quote or ticket ids before any lookup.
///
/// ## Example
/// ```rust
/// use cotiza_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id.trim()).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "not a UUID".to_string(),
    })?;

    Ok(())
}
