//! Product catalog store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{instrument, warn};
use uuid::Uuid;

use shopworks_catalog::{NewProduct, Product, import};
use shopworks_core::{DomainError, ProductId};
use shopworks_events::{CatalogEvent, EventBus};

use super::{StoreError, map_sqlx_error, non_negative};

/// Catalog write/read service: products, discounts, reviews.
///
/// Stateless handle over the pool; catalog mutations that can affect pending
/// order totals publish a [`CatalogEvent`] after their transaction commits,
/// and the recompute dispatcher takes it from there.
#[derive(Debug, Clone)]
pub struct CatalogService<B> {
    pool: PgPool,
    bus: Arc<B>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRecord {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub inventory: i32,
    pub description: String,
    pub rating: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl ProductRecord {
    pub(crate) fn into_domain(self) -> Result<Product, StoreError> {
        Ok(Product {
            id: ProductId::from_uuid(self.id),
            name: self.name,
            price: self.price,
            inventory: non_negative(self.inventory, "inventory")?,
            description: self.description,
            rating: self.rating,
            created_at: self.created_at,
        })
    }
}

pub(crate) const PRODUCT_COLUMNS: &str =
    "id, name, price, inventory, description, rating, created_at";

impl<B> CatalogService<B>
where
    B: EventBus<CatalogEvent>,
{
    pub fn new(pool: PgPool, bus: Arc<B>) -> Self {
        Self { pool, bus }
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Publish a catalog change notification. The rows are already
    /// committed; a failed publish is logged and the next event for the
    /// same product heals any staleness.
    pub(crate) fn publish(&self, event: CatalogEvent) {
        if let Err(e) = self.bus.publish(event) {
            warn!(error = ?e, "failed to publish catalog event");
        }
    }

    #[instrument(skip(self, new), fields(name = %new.name), err)]
    pub async fn create_product(&self, new: NewProduct) -> Result<Product, StoreError> {
        new.validate()?;
        let id = ProductId::new();
        let record = sqlx::query_as::<_, ProductRecord>(&format!(
            "INSERT INTO products (id, name, price, inventory, description)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(&new.name)
        .bind(new.price)
        .bind(new.inventory as i32)
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_product", e))?;
        record.into_domain()
    }

    /// Bulk import: the header contract is enforced and every row parsed
    /// before the first insert, and all rows go in one transaction: a file
    /// is imported completely or not at all.
    #[instrument(skip_all, fields(rows = rows.len()), err)]
    pub async fn import_products(
        &self,
        header: &[String],
        rows: &[import::ProductRow],
    ) -> Result<Vec<Product>, StoreError> {
        import::validate_header(header)?;
        let candidates = import::parse_rows(rows)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("import_products", e))?;

        let mut products = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let record = sqlx::query_as::<_, ProductRecord>(&format!(
                "INSERT INTO products (id, name, price, inventory, description)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING {PRODUCT_COLUMNS}"
            ))
            .bind(ProductId::new().as_uuid())
            .bind(&candidate.name)
            .bind(candidate.price)
            .bind(candidate.inventory as i32)
            .bind(&candidate.description)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("import_products", e))?;
            products.push(record.into_domain()?);
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("import_products", e))?;
        Ok(products)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, StoreError> {
        let record = sqlx::query_as::<_, ProductRecord>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_product", e))?;
        record.into_domain()
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let records = sqlx::query_as::<_, ProductRecord>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;
        records.into_iter().map(ProductRecord::into_domain).collect()
    }

    /// Update a product's unit price and notify the recompute dispatcher so
    /// every pending order holding the product follows.
    #[instrument(skip(self), fields(product_id = %id, %price), err)]
    pub async fn update_price(
        &self,
        id: ProductId,
        price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Product, StoreError> {
        if price < Decimal::ZERO {
            return Err(DomainError::validation("price cannot be negative").into());
        }

        let record = sqlx::query_as::<_, ProductRecord>(&format!(
            "UPDATE products SET price = $2, updated_at = now()
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(price)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_price", e))?;
        let product = record.into_domain()?;

        self.publish(CatalogEvent::ProductPriceChanged {
            product_id: id,
            occurred_at: now,
        });
        Ok(product)
    }

    /// Top-rated products (rating present), best first.
    pub async fn top_rated(&self, limit: i64) -> Result<Vec<Product>, StoreError> {
        let records = sqlx::query_as::<_, ProductRecord>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE rating IS NOT NULL
             ORDER BY rating DESC, name
             LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("top_rated", e))?;
        records.into_iter().map(ProductRecord::into_domain).collect()
    }
}
