//! # Delivery Zone Repository
//!
//! Neighborhoods and their flat delivery fees.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use cotiza_core::DeliveryZone;

#[derive(Debug, FromRow)]
struct DeliveryZoneRow {
    id: String,
    neighborhood: String,
    price: i64,
    created_at: DateTime<Utc>,
}

impl From<DeliveryZoneRow> for DeliveryZone {
    fn from(row: DeliveryZoneRow) -> Self {
        DeliveryZone {
            id: row.id,
            neighborhood: row.neighborhood,
            price: row.price,
            created_at: row.created_at,
        }
    }
}

/// Repository for delivery zone database operations.
#[derive(Debug, Clone)]
pub struct DeliveryZoneRepository {
    pool: SqlitePool,
}

impl DeliveryZoneRepository {
    /// Creates a new DeliveryZoneRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DeliveryZoneRepository { pool }
    }

    /// Inserts a zone.
    pub async fn insert(&self, zone: &DeliveryZone) -> DbResult<()> {
        debug!(id = %zone.id, neighborhood = %zone.neighborhood, "Inserting delivery zone");

        sqlx::query(
            "INSERT INTO delivery_zones (id, neighborhood, price, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&zone.id)
        .bind(&zone.neighborhood)
        .bind(zone.price)
        .bind(zone.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a zone by ID. `None` once the zone has been deleted.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<DeliveryZone>> {
        let row: Option<DeliveryZoneRow> = sqlx::query_as(
            "SELECT id, neighborhood, price, created_at FROM delivery_zones WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DeliveryZone::from))
    }

    /// All zones by neighborhood name.
    pub async fn list(&self) -> DbResult<Vec<DeliveryZone>> {
        let rows: Vec<DeliveryZoneRow> = sqlx::query_as(
            "SELECT id, neighborhood, price, created_at FROM delivery_zones ORDER BY neighborhood COLLATE NOCASE",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DeliveryZone::from).collect())
    }

    /// Removes a zone. Quotes pointing at it keep their stored delivery
    /// amount and a zone id that no longer resolves.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM delivery_zones WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
