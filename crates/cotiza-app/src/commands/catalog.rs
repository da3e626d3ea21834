//! # Catalog Commands
//!
//! Product and delivery-zone lookups for the quote editor, and the seller's
//! client list.
//!
//! The catalog is small enough to search in memory: the full list is read
//! and matched with accent-insensitive text from `cotiza_core::catalog`.

use std::time::Instant;
use tracing::{debug, info};

use cotiza_core::catalog;
use cotiza_core::validation::validate_search_query;
use cotiza_core::{Client, DeliveryZone, Product, Session, DEFAULT_SEARCH_LIMIT};

use crate::error::ApiResult;
use crate::state::AppState;

/// Products whose name or reference contains `query`, at most `limit`
/// (default 10). An empty query lists the first products by name.
pub async fn search_products(
    state: &AppState,
    query: &str,
    limit: Option<usize>,
) -> ApiResult<Vec<Product>> {
    let start = Instant::now();
    let query = validate_search_query(query)?;
    let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT).min(100);

    debug!(query = %query, limit = limit, "search_products command");

    let products = state.db.products().list().await?;
    let matches: Vec<Product> = catalog::search_products(&products, &query, limit)
        .into_iter()
        .cloned()
        .collect();

    info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        count = matches.len(),
        query = %query,
        "search_products complete"
    );

    Ok(matches)
}

/// Delivery zones whose neighborhood contains `query`, ignoring case.
pub async fn search_zones(state: &AppState, query: &str) -> ApiResult<Vec<DeliveryZone>> {
    let query = validate_search_query(query)?;
    debug!(query = %query, "search_zones command");

    let zones = state.db.zones().list().await?;
    Ok(catalog::search_zones(&zones, &query)
        .into_iter()
        .cloned()
        .collect())
}

/// Every delivery zone, by name.
pub async fn list_zones(state: &AppState) -> ApiResult<Vec<DeliveryZone>> {
    Ok(state.db.zones().list().await?)
}

/// The seller's clients, by name.
pub async fn list_clients(state: &AppState, session: &Session) -> ApiResult<Vec<Client>> {
    debug!(seller_id = %session.seller_id, "list_clients command");
    Ok(state.db.clients().list_for_seller(&session.seller_id).await?)
}
