//! # Quote Numbering
//!
//! Human-facing quote numbers like `JP-3001`, derived when quotes are read.
//!
//! The number is not stored. It is `start + (quotes of the same seller
//! created strictly earlier)`, so deleting an older quote renumbers every
//! later one, and two quotes created in the same instant share a number.

use crate::types::Quote;

/// Two-letter initials for a client name.
///
/// - empty name → `XX`
/// - one word → its first two letters
/// - two or more words → first letter of each of the first two words
///
/// ## Example
/// ```rust
/// use cotiza_core::numbering::initials;
///
/// assert_eq!(initials("juan pérez"), "JP");
/// assert_eq!(initials("Ferremax"), "FE");
/// assert_eq!(initials("   "), "XX");
/// ```
pub fn initials(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    match words.as_slice() {
        [] => "XX".to_string(),
        [only] => only.chars().take(2).flat_map(char::to_uppercase).collect(),
        [first, second, ..] => first
            .chars()
            .take(1)
            .chain(second.chars().take(1))
            .flat_map(char::to_uppercase)
            .collect(),
    }
}

/// Sequence number of `quote` among `all_for_seller`.
pub fn sequence(quote: &Quote, all_for_seller: &[Quote], start: u32) -> u32 {
    let earlier = all_for_seller
        .iter()
        .filter(|other| other.created_at < quote.created_at)
        .count();
    start.saturating_add(u32::try_from(earlier).unwrap_or(u32::MAX))
}

/// Display number `"<INITIALS>-<NNNN>"` for a quote.
///
/// `all_for_seller` is the seller's full quote list; order does not matter.
pub fn quote_number(quote: &Quote, all_for_seller: &[Quote], start: u32) -> String {
    format!(
        "{}-{:04}",
        initials(&quote.client_name),
        sequence(quote, all_for_seller, start)
    )
}
