//! # Document Commands
//!
//! The printable quote and the messaging handoff.
//!
//! ## Rendering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stored quote + lines + zone                                            │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  QuoteDocument::from_quote   (breakdown recomputed from stored values)  │
//! │        │                                                                │
//! │        ├──► render_text(business)                                       │
//! │        │                                                                │
//! │        └──► product images, one bounded fetch each                      │
//! │               ok ──────► attached                                       │
//! │               error / timeout ──► skipped, product id reported          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An unreachable picture never fails the document.

use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use cotiza_core::document::QuoteDocument;
use cotiza_core::{messaging, Session};

use super::quote::get_quote;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// A product picture fetched for the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentImage {
    pub product_id: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedDocument {
    pub document: QuoteDocument,
    pub text: String,
    pub images: Vec<DocumentImage>,
    /// Products whose picture could not be fetched.
    pub skipped_images: Vec<String>,
}

/// Builds the document for a stored quote.
pub async fn render_document(
    state: &AppState,
    session: &Session,
    quote_id: &str,
) -> ApiResult<RenderedDocument> {
    debug!(quote_id = %quote_id, "render_document command");

    let detail = get_quote(state, session, quote_id).await?;
    let document = QuoteDocument::from_quote(
        &detail.quote,
        detail.number.as_str(),
        &detail.lines,
        detail.zone.as_ref(),
    );
    let text = document.render_text(&state.config.business.profile());

    let timeout = Duration::from_millis(state.config.documents.image_timeout_ms);
    let (images, skipped_images) = fetch_images(&document, timeout).await?;

    info!(
        quote_id = %quote_id,
        number = %document.number,
        images = images.len(),
        skipped = skipped_images.len(),
        "Document rendered"
    );

    Ok(RenderedDocument {
        document,
        text,
        images,
        skipped_images,
    })
}

/// Deep link that opens a chat with the client, message pre-filled.
pub async fn whatsapp_link(state: &AppState, session: &Session, quote_id: &str) -> ApiResult<String> {
    let detail = get_quote(state, session, quote_id).await?;
    let link = messaging::whatsapp_link(
        &detail.quote,
        &detail.number,
        &detail.lines,
        detail.zone.as_ref(),
        &state.config.business.profile(),
    )?;

    debug!(quote_id = %quote_id, number = %detail.number, "Messaging link built");
    Ok(link)
}

// =============================================================================
// Image Fetching
// =============================================================================

async fn fetch_images(
    document: &QuoteDocument,
    timeout: Duration,
) -> ApiResult<(Vec<DocumentImage>, Vec<String>)> {
    let mut images = Vec::new();
    let mut skipped = Vec::new();

    let urls: Vec<(&str, &str)> = document.image_urls().collect();
    if urls.is_empty() {
        return Ok((images, skipped));
    }

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ApiError::render(format!("HTTP client unavailable: {}", e)))?;

    for (product_id, url) in urls {
        match tokio::time::timeout(timeout, fetch_image(&client, url)).await {
            Ok(Ok((content_type, bytes))) => images.push(DocumentImage {
                product_id: product_id.to_string(),
                content_type,
                bytes,
            }),
            Ok(Err(e)) => {
                warn!(product_id = %product_id, url = %url, error = %e, "Skipping product image");
                skipped.push(product_id.to_string());
            }
            Err(_) => {
                warn!(product_id = %product_id, url = %url, ?timeout, "Product image timed out");
                skipped.push(product_id.to_string());
            }
        }
    }

    Ok((images, skipped))
}

async fn fetch_image(
    client: &reqwest::Client,
    url: &str,
) -> Result<(Option<String>, Vec<u8>), reqwest::Error> {
    let response = client.get(url).send().await?.error_for_status()?;
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response.bytes().await?;
    Ok((content_type, bytes.to_vec()))
}
