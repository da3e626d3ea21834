//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! Search runs in memory through `cotiza_core::catalog`, which folds accents
//! the way sellers type ("tuberia" for "Tubería"). SQLite's `LIKE` only
//! folds ASCII case, so this repository hands out the catalog in name order
//! and leaves matching to the core.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use cotiza_core::Product;

#[derive(Debug, FromRow)]
struct ProductRow {
    id: String,
    reference: String,
    name: String,
    brand: Option<String>,
    sale_price: i64,
    stock: i64,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            reference: row.reference,
            name: row.name,
            brand: row.brand,
            sale_price: row.sale_price,
            stock: row.stock,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_PRODUCT: &str = r#"
    SELECT id, reference, name, brand, sale_price, stock, image_url, created_at, updated_at
    FROM products
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let catalog = db.products().list().await?;
/// let hits = cotiza_core::catalog::search_products(&catalog, "codo", 10);
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a product. The reference must be unique.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, reference = %product.reference, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, reference, name, brand, sale_price, stock, image_url,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.reference)
        .bind(&product.name)
        .bind(&product.brand)
        .bind(product.sale_price)
        .bind(product.stock)
        .bind(&product.image_url)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!("{} WHERE id = ?1", SELECT_PRODUCT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// The whole catalog, ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let rows: Vec<ProductRow> =
            sqlx::query_as(&format!("{} ORDER BY name COLLATE NOCASE", SELECT_PRODUCT))
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Number of products in the catalog.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
