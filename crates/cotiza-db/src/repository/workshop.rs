//! # Workshop Repository
//!
//! Workshop (repair shop) tickets. A quote that includes the workshop
//! service creates one ticket the first time it is saved; see
//! [`super::quote::QuoteRepository::save`].

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use cotiza_core::{ServiceType, TicketStatus, WorkshopTicket};

#[derive(Debug, FromRow)]
struct TicketRow {
    id: String,
    seller_id: String,
    quote_id: Option<String>,
    client_name: String,
    client_phone: String,
    service_type: ServiceType,
    description: String,
    status: TicketStatus,
    estimated_price: i64,
    created_at: DateTime<Utc>,
}

impl From<TicketRow> for WorkshopTicket {
    fn from(row: TicketRow) -> Self {
        WorkshopTicket {
            id: row.id,
            seller_id: row.seller_id,
            quote_id: row.quote_id,
            client_name: row.client_name,
            client_phone: row.client_phone,
            service_type: row.service_type,
            description: row.description,
            status: row.status,
            estimated_price: row.estimated_price,
            created_at: row.created_at,
        }
    }
}

const SELECT_TICKET: &str = r#"
    SELECT id, seller_id, quote_id, client_name, client_phone, service_type,
           description, status, estimated_price, created_at
    FROM workshop_tickets
"#;

/// Inserts a ticket on an existing connection or transaction.
pub(crate) async fn insert_ticket(conn: &mut SqliteConnection, ticket: &WorkshopTicket) -> DbResult<()> {
    debug!(id = %ticket.id, quote_id = ?ticket.quote_id, "Inserting workshop ticket");

    sqlx::query(
        r#"
        INSERT INTO workshop_tickets (
            id, seller_id, quote_id, client_name, client_phone, service_type,
            description, status, estimated_price, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&ticket.id)
    .bind(&ticket.seller_id)
    .bind(&ticket.quote_id)
    .bind(&ticket.client_name)
    .bind(&ticket.client_phone)
    .bind(ticket.service_type)
    .bind(&ticket.description)
    .bind(ticket.status)
    .bind(ticket.estimated_price)
    .bind(ticket.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Repository for workshop ticket operations.
#[derive(Debug, Clone)]
pub struct WorkshopRepository {
    pool: SqlitePool,
}

impl WorkshopRepository {
    /// Creates a new WorkshopRepository.
    pub fn new(pool: SqlitePool) -> Self {
        WorkshopRepository { pool }
    }

    /// Inserts a standalone ticket.
    pub async fn insert(&self, ticket: &WorkshopTicket) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert_ticket(&mut *conn, ticket).await
    }

    /// The seller's tickets, newest first.
    pub async fn list_for_seller(&self, seller_id: &str) -> DbResult<Vec<WorkshopTicket>> {
        let rows: Vec<TicketRow> = sqlx::query_as(&format!(
            "{} WHERE seller_id = ?1 ORDER BY created_at DESC",
            SELECT_TICKET
        ))
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(WorkshopTicket::from).collect())
    }

    /// Tickets created from a given quote.
    pub async fn list_for_quote(&self, seller_id: &str, quote_id: &str) -> DbResult<Vec<WorkshopTicket>> {
        let rows: Vec<TicketRow> = sqlx::query_as(&format!(
            "{} WHERE seller_id = ?1 AND quote_id = ?2 ORDER BY created_at",
            SELECT_TICKET
        ))
        .bind(seller_id)
        .bind(quote_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(WorkshopTicket::from).collect())
    }
}
