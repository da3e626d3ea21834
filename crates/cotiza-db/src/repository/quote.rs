//! # Quote Repository
//!
//! Quote headers, their line items, and the save transaction.
//!
//! ## Save Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   ├── INSERT quotes              (create)                              │
//! │   │   or UPDATE quotes           (replace)                             │
//! │   │      DELETE quote_items WHERE quote_id = ?                         │
//! │   ├── INSERT quote_items × N                                           │
//! │   │                                                                     │
//! │   ├── SAVEPOINT ── INSERT workshop_tickets ──┬── ok   → RELEASE        │
//! │   │                                           └── fail → ROLLBACK TO   │
//! │   │                                                      warn!, keep   │
//! │   │                                                      ticket_error  │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failure anywhere in the header or lines rolls everything back, so a
//! replaced quote never ends up with zero lines. The companion ticket is
//! best-effort: its failure is reported in [`SaveOutcome::ticket_error`]
//! and the quote still commits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Connection, FromRow, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::workshop::insert_ticket;
use crate::repository::{rate_from_text, rate_to_text};
use cotiza_core::{Quote, QuoteLineRecord, QuoteLineView, QuoteStatus, SubmitPlan, WorkshopTicket};

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, FromRow)]
struct QuoteRow {
    id: String,
    seller_id: String,
    client_id: Option<String>,
    client_name: String,
    client_tax_id: String,
    client_phone: String,
    client_email: String,
    client_address: String,
    client_city: String,
    status: QuoteStatus,
    validity_days: i64,
    seller_name: String,
    notes: String,
    discount_percent: String,
    tax_percent: String,
    breakdown_shown: bool,
    retefuente_percent: String,
    reteiva_percent: String,
    ica_percent: String,
    reteica_percent: String,
    delivery_zone_id: Option<String>,
    subtotal: i64,
    tax_base: i64,
    tax_amount: i64,
    discount_amount: i64,
    delivery_amount: i64,
    service_amount: i64,
    retefuente_amount: i64,
    reteiva_amount: i64,
    ica_amount: i64,
    reteica_amount: i64,
    total: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<QuoteRow> for Quote {
    type Error = DbError;

    fn try_from(row: QuoteRow) -> DbResult<Self> {
        Ok(Quote {
            discount_percent: rate_from_text("discount_percent", &row.discount_percent)?,
            tax_percent: rate_from_text("tax_percent", &row.tax_percent)?,
            retefuente_percent: rate_from_text("retefuente_percent", &row.retefuente_percent)?,
            reteiva_percent: rate_from_text("reteiva_percent", &row.reteiva_percent)?,
            ica_percent: rate_from_text("ica_percent", &row.ica_percent)?,
            reteica_percent: rate_from_text("reteica_percent", &row.reteica_percent)?,
            id: row.id,
            seller_id: row.seller_id,
            client_id: row.client_id,
            client_name: row.client_name,
            client_tax_id: row.client_tax_id,
            client_phone: row.client_phone,
            client_email: row.client_email,
            client_address: row.client_address,
            client_city: row.client_city,
            status: row.status,
            validity_days: row.validity_days,
            seller_name: row.seller_name,
            notes: row.notes,
            breakdown_shown: row.breakdown_shown,
            delivery_zone_id: row.delivery_zone_id,
            subtotal: row.subtotal,
            tax_base: row.tax_base,
            tax_amount: row.tax_amount,
            discount_amount: row.discount_amount,
            delivery_amount: row.delivery_amount,
            service_amount: row.service_amount,
            retefuente_amount: row.retefuente_amount,
            reteiva_amount: row.reteiva_amount,
            ica_amount: row.ica_amount,
            reteica_amount: row.reteica_amount,
            total: row.total,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct LineRow {
    product_id: String,
    product_name: String,
    product_reference: String,
    image_url: Option<String>,
    quantity: i64,
    unit_price: i64,
    line_subtotal: i64,
}

impl From<LineRow> for QuoteLineView {
    fn from(row: LineRow) -> Self {
        QuoteLineView {
            product_id: row.product_id,
            product_name: row.product_name,
            product_reference: row.product_reference,
            image_url: row.image_url,
            quantity: row.quantity,
            unit_price: row.unit_price,
            line_subtotal: row.line_subtotal,
        }
    }
}

const SELECT_QUOTE: &str = r#"
    SELECT
        id, seller_id, client_id,
        client_name, client_tax_id, client_phone, client_email, client_address, client_city,
        status, validity_days, seller_name, notes,
        discount_percent, tax_percent, breakdown_shown,
        retefuente_percent, reteiva_percent, ica_percent, reteica_percent,
        delivery_zone_id,
        subtotal, tax_base, tax_amount, discount_amount, delivery_amount, service_amount,
        retefuente_amount, reteiva_amount, ica_amount, reteica_amount, total,
        created_at, updated_at
    FROM quotes
"#;

// =============================================================================
// Save Outcome
// =============================================================================

/// Result of a committed quote save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub quote_id: String,
    /// Id of the companion workshop ticket, when one was written.
    pub ticket_id: Option<String>,
    /// Why the companion ticket was not written. The quote is saved anyway.
    pub ticket_error: Option<String>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for quote database operations.
///
/// ## Usage
/// ```rust,ignore
/// let plan = draft.begin_submit(&session, policy, Utc::now())?;
/// let outcome = db.quotes().save(&plan).await?;
/// draft.mark_saved(&outcome.quote_id)?;
/// ```
#[derive(Debug, Clone)]
pub struct QuoteRepository {
    pool: SqlitePool,
}

impl QuoteRepository {
    /// Creates a new QuoteRepository.
    pub fn new(pool: SqlitePool) -> Self {
        QuoteRepository { pool }
    }

    /// Persists a submit plan: creates or replaces depending on the plan.
    pub async fn save(&self, plan: &SubmitPlan) -> DbResult<SaveOutcome> {
        if plan.is_update {
            self.replace(&plan.quote, &plan.lines, plan.ticket.as_ref()).await
        } else {
            self.create(&plan.quote, &plan.lines, plan.ticket.as_ref()).await
        }
    }

    /// Inserts a new quote with its lines and optional companion ticket.
    pub async fn create(
        &self,
        quote: &Quote,
        lines: &[QuoteLineRecord],
        ticket: Option<&WorkshopTicket>,
    ) -> DbResult<SaveOutcome> {
        debug!(id = %quote.id, lines = lines.len(), "Creating quote");

        let mut tx = self.pool.begin().await?;

        insert_header(&mut *tx, quote).await?;
        insert_lines(&mut *tx, lines).await?;
        let (ticket_id, ticket_error) = write_ticket(&mut *tx, ticket).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id = %quote.id, total = quote.total, "Quote created");

        Ok(SaveOutcome {
            quote_id: quote.id.clone(),
            ticket_id,
            ticket_error,
        })
    }

    /// Overwrites an existing quote: header update plus delete-all/insert-all
    /// of its lines, in one transaction.
    ///
    /// Fails with `NotFound` when the quote does not exist for the seller.
    pub async fn replace(
        &self,
        quote: &Quote,
        lines: &[QuoteLineRecord],
        ticket: Option<&WorkshopTicket>,
    ) -> DbResult<SaveOutcome> {
        debug!(id = %quote.id, lines = lines.len(), "Replacing quote");

        let mut tx = self.pool.begin().await?;

        if !update_header(&mut *tx, quote).await? {
            return Err(DbError::not_found("Quote", &quote.id));
        }

        sqlx::query("DELETE FROM quote_items WHERE quote_id = ?1")
            .bind(&quote.id)
            .execute(&mut *tx)
            .await?;

        insert_lines(&mut *tx, lines).await?;
        let (ticket_id, ticket_error) = write_ticket(&mut *tx, ticket).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id = %quote.id, total = quote.total, "Quote replaced");

        Ok(SaveOutcome {
            quote_id: quote.id.clone(),
            ticket_id,
            ticket_error,
        })
    }

    /// Gets one of the seller's quotes.
    pub async fn get(&self, seller_id: &str, id: &str) -> DbResult<Option<Quote>> {
        let row: Option<QuoteRow> =
            sqlx::query_as(&format!("{} WHERE seller_id = ?1 AND id = ?2", SELECT_QUOTE))
                .bind(seller_id)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Quote::try_from).transpose()
    }

    /// Lines of one of the seller's quotes, joined with current product
    /// name, reference and image.
    pub async fn lines(&self, seller_id: &str, quote_id: &str) -> DbResult<Vec<QuoteLineView>> {
        let rows: Vec<LineRow> = sqlx::query_as(
            r#"
            SELECT
                qi.product_id,
                p.name AS product_name,
                p.reference AS product_reference,
                p.image_url,
                qi.quantity,
                qi.unit_price,
                qi.line_subtotal
            FROM quote_items qi
            JOIN quotes q ON q.id = qi.quote_id
            JOIN products p ON p.id = qi.product_id
            WHERE q.seller_id = ?1 AND qi.quote_id = ?2
            ORDER BY qi.id
            "#,
        )
        .bind(seller_id)
        .bind(quote_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(QuoteLineView::from).collect())
    }

    /// The seller's quotes in creation order (oldest first), as numbering
    /// expects.
    pub async fn list_for_seller(&self, seller_id: &str) -> DbResult<Vec<Quote>> {
        let rows: Vec<QuoteRow> = sqlx::query_as(&format!(
            "{} WHERE seller_id = ?1 ORDER BY created_at, id",
            SELECT_QUOTE
        ))
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Quote::try_from).collect()
    }

    /// Writes a new status. Transition rules are checked by the caller.
    pub async fn update_status(
        &self,
        seller_id: &str,
        id: &str,
        status: QuoteStatus,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE quotes SET status = ?1, updated_at = ?2 WHERE seller_id = ?3 AND id = ?4",
        )
        .bind(status)
        .bind(now)
        .bind(seller_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Quote", id));
        }

        info!(id = %id, status = %status, "Quote status updated");
        Ok(())
    }

    /// Deletes a quote; its lines go with it.
    pub async fn delete(&self, seller_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM quotes WHERE seller_id = ?1 AND id = ?2")
            .bind(seller_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Quote", id));
        }

        info!(id = %id, "Quote deleted");
        Ok(())
    }
}

// =============================================================================
// Transaction Steps
// =============================================================================

async fn insert_header(conn: &mut SqliteConnection, quote: &Quote) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO quotes (
            id, seller_id, client_id,
            client_name, client_tax_id, client_phone, client_email, client_address, client_city,
            status, validity_days, seller_name, notes,
            discount_percent, tax_percent, breakdown_shown,
            retefuente_percent, reteiva_percent, ica_percent, reteica_percent,
            delivery_zone_id,
            subtotal, tax_base, tax_amount, discount_amount, delivery_amount, service_amount,
            retefuente_amount, reteiva_amount, ica_amount, reteica_amount, total,
            created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3,
            ?4, ?5, ?6, ?7, ?8, ?9,
            ?10, ?11, ?12, ?13,
            ?14, ?15, ?16,
            ?17, ?18, ?19, ?20,
            ?21,
            ?22, ?23, ?24, ?25, ?26, ?27,
            ?28, ?29, ?30, ?31, ?32,
            ?33, ?34
        )
        "#,
    )
    .bind(&quote.id)
    .bind(&quote.seller_id)
    .bind(&quote.client_id)
    .bind(&quote.client_name)
    .bind(&quote.client_tax_id)
    .bind(&quote.client_phone)
    .bind(&quote.client_email)
    .bind(&quote.client_address)
    .bind(&quote.client_city)
    .bind(quote.status)
    .bind(quote.validity_days)
    .bind(&quote.seller_name)
    .bind(&quote.notes)
    .bind(rate_to_text(quote.discount_percent))
    .bind(rate_to_text(quote.tax_percent))
    .bind(quote.breakdown_shown)
    .bind(rate_to_text(quote.retefuente_percent))
    .bind(rate_to_text(quote.reteiva_percent))
    .bind(rate_to_text(quote.ica_percent))
    .bind(rate_to_text(quote.reteica_percent))
    .bind(&quote.delivery_zone_id)
    .bind(quote.subtotal)
    .bind(quote.tax_base)
    .bind(quote.tax_amount)
    .bind(quote.discount_amount)
    .bind(quote.delivery_amount)
    .bind(quote.service_amount)
    .bind(quote.retefuente_amount)
    .bind(quote.reteiva_amount)
    .bind(quote.ica_amount)
    .bind(quote.reteica_amount)
    .bind(quote.total)
    .bind(quote.created_at)
    .bind(quote.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Returns false when no row matched (unknown id or another seller's quote).
async fn update_header(conn: &mut SqliteConnection, quote: &Quote) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE quotes SET
            client_id = ?1,
            client_name = ?2, client_tax_id = ?3, client_phone = ?4,
            client_email = ?5, client_address = ?6, client_city = ?7,
            status = ?8, validity_days = ?9, seller_name = ?10, notes = ?11,
            discount_percent = ?12, tax_percent = ?13, breakdown_shown = ?14,
            retefuente_percent = ?15, reteiva_percent = ?16,
            ica_percent = ?17, reteica_percent = ?18,
            delivery_zone_id = ?19,
            subtotal = ?20, tax_base = ?21, tax_amount = ?22, discount_amount = ?23,
            delivery_amount = ?24, service_amount = ?25,
            retefuente_amount = ?26, reteiva_amount = ?27, ica_amount = ?28,
            reteica_amount = ?29, total = ?30,
            updated_at = ?31
        WHERE id = ?32 AND seller_id = ?33
        "#,
    )
    .bind(&quote.client_id)
    .bind(&quote.client_name)
    .bind(&quote.client_tax_id)
    .bind(&quote.client_phone)
    .bind(&quote.client_email)
    .bind(&quote.client_address)
    .bind(&quote.client_city)
    .bind(quote.status)
    .bind(quote.validity_days)
    .bind(&quote.seller_name)
    .bind(&quote.notes)
    .bind(rate_to_text(quote.discount_percent))
    .bind(rate_to_text(quote.tax_percent))
    .bind(quote.breakdown_shown)
    .bind(rate_to_text(quote.retefuente_percent))
    .bind(rate_to_text(quote.reteiva_percent))
    .bind(rate_to_text(quote.ica_percent))
    .bind(rate_to_text(quote.reteica_percent))
    .bind(&quote.delivery_zone_id)
    .bind(quote.subtotal)
    .bind(quote.tax_base)
    .bind(quote.tax_amount)
    .bind(quote.discount_amount)
    .bind(quote.delivery_amount)
    .bind(quote.service_amount)
    .bind(quote.retefuente_amount)
    .bind(quote.reteiva_amount)
    .bind(quote.ica_amount)
    .bind(quote.reteica_amount)
    .bind(quote.total)
    .bind(quote.updated_at)
    .bind(&quote.id)
    .bind(&quote.seller_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

async fn insert_lines(conn: &mut SqliteConnection, lines: &[QuoteLineRecord]) -> DbResult<()> {
    for line in lines {
        sqlx::query(
            r#"
            INSERT INTO quote_items (quote_id, product_id, quantity, unit_price, line_subtotal)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&line.quote_id)
        .bind(&line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line.line_subtotal)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Writes the companion ticket inside a savepoint.
///
/// Returns `(ticket_id, ticket_error)`. Only a failure to roll back the
/// savepoint itself aborts the surrounding transaction.
async fn write_ticket(
    conn: &mut SqliteConnection,
    ticket: Option<&WorkshopTicket>,
) -> DbResult<(Option<String>, Option<String>)> {
    let Some(ticket) = ticket else {
        return Ok((None, None));
    };

    let mut savepoint = conn.begin().await?;

    match insert_ticket(&mut *savepoint, ticket).await {
        Ok(()) => {
            savepoint.commit().await?;
            info!(id = %ticket.id, quote_id = ?ticket.quote_id, "Workshop ticket created");
            Ok((Some(ticket.id.clone()), None))
        }
        Err(err) => {
            savepoint.rollback().await?;
            warn!(
                quote_id = ?ticket.quote_id,
                error = %err,
                "Workshop ticket not created; quote saved without it"
            );
            Ok((None, Some(err.to_string())))
        }
    }
}
