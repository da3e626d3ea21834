//! # Catalog Search
//!
//! In-memory text search over products and delivery zones, used by the
//! quote editor's search boxes.
//!
//! Product search is accent- and case-insensitive on name or reference, so
//! "tuberia" finds "Tubería PVC". Zone search is a plain case-insensitive
//! substring match on the neighborhood.

use crate::types::{DeliveryZone, Product};
use crate::DEFAULT_SEARCH_LIMIT;

/// Lowercases, strips accents, drops everything but letters, digits and
/// whitespace, then trims.
///
/// ## Example
/// ```rust
/// use cotiza_core::catalog::normalize_text;
///
/// assert_eq!(normalize_text("  Tubería PVC ½\" "), "tuberia pvc");
/// assert_eq!(normalize_text("Niño-123"), "nino123");
/// ```
pub fn normalize_text(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(strip_accent)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}

fn strip_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

/// Products whose name or reference contains `query`, at most `limit`.
///
/// An empty query matches every product.
pub fn search_products<'a>(products: &'a [Product], query: &str, limit: usize) -> Vec<&'a Product> {
    let needle = normalize_text(query);
    products
        .iter()
        .filter(|p| {
            normalize_text(&p.name).contains(&needle)
                || normalize_text(&p.reference).contains(&needle)
        })
        .take(limit)
        .collect()
}

/// Zones whose neighborhood contains `query`, case-insensitively.
pub fn search_zones<'a>(zones: &'a [DeliveryZone], query: &str) -> Vec<&'a DeliveryZone> {
    let needle = query.trim().to_lowercase();
    zones
        .iter()
        .filter(|z| z.neighborhood.to_lowercase().contains(&needle))
        .take(DEFAULT_SEARCH_LIMIT)
        .collect()
}
