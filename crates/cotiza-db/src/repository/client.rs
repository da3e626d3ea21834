//! # Client Repository
//!
//! A seller's clients. The quote editor picks one, and its fields are
//! snapshotted onto the quote at save time.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use cotiza_core::Client;

#[derive(Debug, FromRow)]
struct ClientRow {
    id: String,
    seller_id: String,
    name: String,
    phone: Option<String>,
    tax_id: Option<String>,
    email: Option<String>,
    address: Option<String>,
    city: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: row.id,
            seller_id: row.seller_id,
            name: row.name,
            phone: row.phone,
            tax_id: row.tax_id,
            email: row.email,
            address: row.address,
            city: row.city,
            created_at: row.created_at,
        }
    }
}

const SELECT_CLIENT: &str = r#"
    SELECT id, seller_id, name, phone, tax_id, email, address, city, created_at
    FROM clients
"#;

/// Repository for client database operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Inserts a client.
    pub async fn insert(&self, client: &Client) -> DbResult<()> {
        debug!(id = %client.id, seller_id = %client.seller_id, "Inserting client");

        sqlx::query(
            r#"
            INSERT INTO clients (
                id, seller_id, name, phone, tax_id, email, address, city, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&client.id)
        .bind(&client.seller_id)
        .bind(&client.name)
        .bind(&client.phone)
        .bind(&client.tax_id)
        .bind(&client.email)
        .bind(&client.address)
        .bind(&client.city)
        .bind(client.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets one of the seller's clients.
    pub async fn get(&self, seller_id: &str, id: &str) -> DbResult<Option<Client>> {
        let row: Option<ClientRow> =
            sqlx::query_as(&format!("{} WHERE seller_id = ?1 AND id = ?2", SELECT_CLIENT))
                .bind(seller_id)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Client::from))
    }

    /// Lists the seller's clients by name.
    pub async fn list_for_seller(&self, seller_id: &str) -> DbResult<Vec<Client>> {
        let rows: Vec<ClientRow> = sqlx::query_as(&format!(
            "{} WHERE seller_id = ?1 ORDER BY name COLLATE NOCASE",
            SELECT_CLIENT
        ))
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Client::from).collect())
    }
}
