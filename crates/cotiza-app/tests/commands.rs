//! Command-level tests against an in-memory database.

use chrono::Utc;
use cotiza_app::commands::{catalog, document, quote};
use cotiza_app::{AppConfig, AppState, ErrorCode};
use cotiza_core::{
    Client, DeliveryZone, DraftState, Money, Product, QuoteStatus, Rate, Session,
    ValidationError,
};

const TALADRO: &str = "11111111-1111-4111-8111-111111111111";
const CODO: &str = "22222222-2222-4222-8222-222222222222";
const SIN_FOTO: &str = "33333333-3333-4333-8333-333333333333";
const ZONE: &str = "44444444-4444-4444-8444-444444444444";

fn session() -> Session {
    Session {
        user_id: "user-1".to_string(),
        seller_id: "seller-1".to_string(),
        display_name: "Juan Pérez".to_string(),
    }
}

fn product(id: &str, reference: &str, name: &str, price: i64, image_url: Option<&str>) -> Product {
    let now = Utc::now();
    Product {
        id: id.to_string(),
        reference: reference.to_string(),
        name: name.to_string(),
        brand: None,
        sale_price: price,
        stock: 10,
        image_url: image_url.map(str::to_string),
        created_at: now,
        updated_at: now,
    }
}

fn client(phone: Option<&str>) -> Client {
    Client {
        id: "client-1".to_string(),
        seller_id: "seller-1".to_string(),
        name: "Ferretería El Tornillo".to_string(),
        phone: phone.map(str::to_string),
        tax_id: Some("900123456-1".to_string()),
        email: None,
        address: None,
        city: Some("Santa Marta".to_string()),
        created_at: Utc::now(),
    }
}

async fn setup() -> AppState {
    let mut config = AppConfig::default();
    config.business.name = "Suministros del Caribe".to_string();
    config.documents.image_timeout_ms = 2_000;

    let state = AppState::in_memory(config).await.unwrap();
    let products = state.db.products();
    products
        .insert(&product(TALADRO, "TAL-10", "Taladro percutor", 100_000, None))
        .await
        .unwrap();
    products
        .insert(&product(CODO, "COD-90", "Codo galvanizado", 4_200, None))
        .await
        .unwrap();
    products
        .insert(&product(
            SIN_FOTO,
            "TUB-01",
            "Tubería PVC 1/2\"",
            18_500,
            Some("http://127.0.0.1:9/tuberia.png"),
        ))
        .await
        .unwrap();

    state
        .db
        .zones()
        .insert(&DeliveryZone {
            id: ZONE.to_string(),
            neighborhood: "El Rodadero".to_string(),
            price: 12_000,
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    state.db.clients().insert(&client(Some("300 123 4567"))).await.unwrap();
    state
}

async fn product_by_id(state: &AppState, id: &str) -> Product {
    state.db.products().get_by_id(id).await.unwrap().unwrap()
}

/// Two drills, 10% discount, 19% tax added on top.
async fn priced_draft(state: &AppState) -> cotiza_core::QuoteDraft {
    let mut draft = quote::new_draft(state);
    draft.add_product(&product_by_id(state, TALADRO).await);
    draft.set_quantity(TALADRO, 2).unwrap();
    draft.set_discount_percent(Rate::percent("10").unwrap());
    draft.set_tax_percent(Rate::percent("19").unwrap());
    draft.select_client(client(Some("300 123 4567")));
    draft
}

#[tokio::test]
async fn test_submit_without_items_never_reaches_database() {
    let state = setup().await;
    let mut draft = quote::new_draft(&state);
    draft.select_client(client(None));

    let err = quote::submit_quote(&state, &session(), &mut draft)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ValidationError);
    assert_eq!(err.message, ValidationError::EmptyCart.to_string());
    assert_eq!(draft.state(), &DraftState::Editing);
    assert!(quote::list_quotes(&state, &session()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_submit_missing_zone() {
    let state = setup().await;
    let mut draft = priced_draft(&state).await;
    draft.include_delivery(true);

    let err = quote::submit_quote(&state, &session(), &mut draft)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
    assert_eq!(err.message, ValidationError::MissingDeliveryZone.to_string());
}

#[tokio::test]
async fn test_compute_totals_matches_saved_total() {
    let state = setup().await;
    let mut draft = priced_draft(&state).await;

    let totals = quote::compute_totals(&state, &draft);
    assert_eq!(totals.subtotal, Money::from_units(200_000));
    assert_eq!(totals.discount_amount, Money::from_units(20_000));
    assert_eq!(totals.tax_amount, Money::from_units(34_200));
    assert_eq!(totals.total, Money::from_units(214_200));

    let saved = quote::submit_quote(&state, &session(), &mut draft).await.unwrap();
    assert_eq!(saved.total, totals.total);
    assert_eq!(saved.number.as_deref(), Some("FE-3001"));
    assert!(!saved.updated);
    assert_eq!(
        draft.state(),
        &DraftState::Saved {
            quote_id: saved.quote_id.clone()
        }
    );
}

#[tokio::test]
async fn test_committed_save_survives_unreadable_listing() {
    let state = setup().await;

    let mut first = priced_draft(&state).await;
    let first = quote::submit_quote(&state, &session(), &mut first).await.unwrap();
    sqlx::query("UPDATE quotes SET tax_percent = 'diecinueve' WHERE id = ?1")
        .bind(&first.quote_id)
        .execute(state.db.pool())
        .await
        .unwrap();

    let mut draft = priced_draft(&state).await;
    let saved = quote::submit_quote(&state, &session(), &mut draft).await.unwrap();

    assert_eq!(saved.number, None);
    assert_eq!(
        draft.state(),
        &DraftState::Saved {
            quote_id: saved.quote_id.clone()
        }
    );
    let stored = state
        .db
        .quotes()
        .get("seller-1", &saved.quote_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.total, 214_200);
}

#[tokio::test]
async fn test_numbering_follows_creation_order() {
    let state = setup().await;

    let mut first = priced_draft(&state).await;
    let first = quote::submit_quote(&state, &session(), &mut first).await.unwrap();
    let mut second = priced_draft(&state).await;
    let second = quote::submit_quote(&state, &session(), &mut second).await.unwrap();

    assert_eq!(first.number.as_deref(), Some("FE-3001"));
    assert_eq!(second.number.as_deref(), Some("FE-3002"));

    let listed = quote::list_quotes(&state, &session()).await.unwrap();
    assert_eq!(listed.len(), 2);
    // Newest first
    assert_eq!(listed[0].id, second.quote_id);
    assert_eq!(listed[0].number, "FE-3002");

    // Deleting the older quote renumbers the newer one
    quote::delete_quote(&state, &session(), &first.quote_id).await.unwrap();
    let detail = quote::get_quote(&state, &session(), &second.quote_id).await.unwrap();
    assert_eq!(detail.number, "FE-3001");
}

#[tokio::test]
async fn test_resubmit_updates_same_quote() {
    let state = setup().await;
    let mut draft = priced_draft(&state).await;

    let first = quote::submit_quote(&state, &session(), &mut draft).await.unwrap();
    draft.add_product(&product_by_id(&state, CODO).await);
    let second = quote::submit_quote(&state, &session(), &mut draft).await.unwrap();

    assert!(second.updated);
    assert_eq!(second.quote_id, first.quote_id);
    assert_eq!(quote::list_quotes(&state, &session()).await.unwrap().len(), 1);

    let detail = quote::get_quote(&state, &session(), &first.quote_id).await.unwrap();
    assert_eq!(detail.lines.len(), 2);
    assert_eq!(detail.quote.subtotal, 204_200);
}

#[tokio::test]
async fn test_backend_failure_marks_draft_failed() {
    let state = setup().await;
    let mut draft = priced_draft(&state).await;
    // A product that was never stored violates the line foreign key
    draft.add_product(&product(
        "55555555-5555-4555-8555-555555555555",
        "GHOST",
        "Producto fantasma",
        1_000,
        None,
    ));

    let err = quote::submit_quote(&state, &session(), &mut draft)
        .await
        .unwrap_err();

    assert_ne!(err.code, ErrorCode::NotFound);
    assert!(matches!(draft.state(), DraftState::SaveFailed { .. }));
    assert!(quote::list_quotes(&state, &session()).await.unwrap().is_empty());

    // The draft is kept; fixing it and retrying works
    draft
        .remove_item("55555555-5555-4555-8555-555555555555")
        .unwrap();
    let saved = quote::submit_quote(&state, &session(), &mut draft).await.unwrap();
    assert_eq!(saved.total, Money::from_units(214_200));
}

#[tokio::test]
async fn test_service_creates_one_ticket() {
    let state = setup().await;
    let mut draft = priced_draft(&state).await;
    draft.include_service(true);
    draft.set_service_price(Money::from_units(50_000));

    let saved = quote::submit_quote(&state, &session(), &mut draft).await.unwrap();
    assert!(saved.ticket_id.is_some());
    assert!(saved.ticket_error.is_none());

    let again = quote::submit_quote(&state, &session(), &mut draft).await.unwrap();
    assert!(again.ticket_id.is_none());

    let tickets = state
        .db
        .workshop()
        .list_for_quote("seller-1", &saved.quote_id)
        .await
        .unwrap();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].estimated_price, 50_000);
}

#[tokio::test]
async fn test_load_draft_restores_options() {
    let state = setup().await;
    let mut draft = priced_draft(&state).await;
    draft.select_zone(state.db.zones().get_by_id(ZONE).await.unwrap().unwrap());
    draft.set_withholding_enabled(cotiza_core::WithholdingKind::Retefuente, true);
    let saved = quote::submit_quote(&state, &session(), &mut draft).await.unwrap();

    let reloaded = quote::load_draft(&state, &session(), &saved.quote_id).await.unwrap();
    assert_eq!(reloaded.editing_quote_id(), Some(saved.quote_id.as_str()));
    assert_eq!(reloaded.cart().len(), 1);
    assert!(reloaded.fiscal().withholdings.retefuente.enabled);
    assert!(!reloaded.fiscal().withholdings.reteiva.enabled);
    assert_eq!(reloaded.delivery().zone().map(|z| z.id.as_str()), Some(ZONE));
    assert_eq!(
        quote::compute_totals(&state, &reloaded).total,
        quote::compute_totals(&state, &draft).total
    );
}

#[tokio::test]
async fn test_deleted_zone_blocks_resubmit() {
    let state = setup().await;
    let mut draft = priced_draft(&state).await;
    draft.select_zone(state.db.zones().get_by_id(ZONE).await.unwrap().unwrap());
    let saved = quote::submit_quote(&state, &session(), &mut draft).await.unwrap();

    assert!(state.db.zones().delete(ZONE).await.unwrap());

    let mut reloaded = quote::load_draft(&state, &session(), &saved.quote_id).await.unwrap();
    assert!(reloaded.delivery().is_included());
    assert!(reloaded.delivery().zone().is_none());

    let err = quote::submit_quote(&state, &session(), &mut reloaded)
        .await
        .unwrap_err();
    assert_eq!(err.message, ValidationError::MissingDeliveryZone.to_string());
}

#[tokio::test]
async fn test_status_transitions() {
    let state = setup().await;
    let mut draft = priced_draft(&state).await;
    let saved = quote::submit_quote(&state, &session(), &mut draft).await.unwrap();

    let status = quote::set_status(&state, &session(), &saved.quote_id, QuoteStatus::Accepted)
        .await
        .unwrap();
    assert_eq!(status, QuoteStatus::Accepted);

    let err = quote::set_status(&state, &session(), &saved.quote_id, QuoteStatus::Rejected)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::BusinessLogic);

    let detail = quote::get_quote(&state, &session(), &saved.quote_id).await.unwrap();
    assert_eq!(detail.quote.status, QuoteStatus::Accepted);
}

#[tokio::test]
async fn test_other_seller_cannot_see_quote() {
    let state = setup().await;
    let mut draft = priced_draft(&state).await;
    let saved = quote::submit_quote(&state, &session(), &mut draft).await.unwrap();

    let other = Session {
        user_id: "user-2".to_string(),
        seller_id: "seller-2".to_string(),
        display_name: "Ana Ruiz".to_string(),
    };
    let err = quote::get_quote(&state, &other, &saved.quote_id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
    assert!(quote::list_quotes(&state, &other).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_id_rejected() {
    let state = setup().await;
    let err = quote::get_quote(&state, &session(), "not-a-uuid").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
}

#[tokio::test]
async fn test_whatsapp_link() {
    let state = setup().await;
    let mut draft = priced_draft(&state).await;
    let saved = quote::submit_quote(&state, &session(), &mut draft).await.unwrap();

    let link = document::whatsapp_link(&state, &session(), &saved.quote_id)
        .await
        .unwrap();
    assert!(link.starts_with("https://wa.me/573001234567?text="));
    assert!(link.contains("FE-3001"));
}

#[tokio::test]
async fn test_whatsapp_link_without_phone() {
    let state = setup().await;
    let mut draft = priced_draft(&state).await;
    draft.select_client(client(None));
    let saved = quote::submit_quote(&state, &session(), &mut draft).await.unwrap();

    let err = document::whatsapp_link(&state, &session(), &saved.quote_id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidPhone);
}

#[tokio::test]
async fn test_render_skips_unreachable_image() {
    let state = setup().await;
    let mut draft = priced_draft(&state).await;
    draft.add_product(&product_by_id(&state, SIN_FOTO).await);
    let saved = quote::submit_quote(&state, &session(), &mut draft).await.unwrap();

    let rendered = document::render_document(&state, &session(), &saved.quote_id)
        .await
        .unwrap();

    assert!(rendered.images.is_empty());
    assert_eq!(rendered.skipped_images, vec![SIN_FOTO.to_string()]);
    assert_eq!(rendered.document.lines.len(), 2);
    assert!(rendered.text.contains("SUMINISTROS DEL CARIBE"));
    assert!(rendered.text.contains(&rendered.document.number));
}

#[tokio::test]
async fn test_search_products_ignores_accents() {
    let state = setup().await;

    let found = catalog::search_products(&state, "tuberia", None).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, SIN_FOTO);

    let by_reference = catalog::search_products(&state, "cod-90", None).await.unwrap();
    assert_eq!(by_reference.len(), 1);
    assert_eq!(by_reference[0].id, CODO);

    let limited = catalog::search_products(&state, "", Some(2)).await.unwrap();
    assert_eq!(limited.len(), 2);
}

#[tokio::test]
async fn test_search_zones_and_clients() {
    let state = setup().await;

    let zones = catalog::search_zones(&state, "rodad").await.unwrap();
    assert_eq!(zones.len(), 1);
    assert!(catalog::search_zones(&state, "bastidas").await.unwrap().is_empty());

    let clients = catalog::list_clients(&state, &session()).await.unwrap();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].name, "Ferretería El Tornillo");
}
