//! Discount store.
//!
//! Every mutation here can change "the active discount now" for a product,
//! so create/update/delete all publish a catalog event; the dispatcher then
//! refreshes the snapshots of pending orders holding that product.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::instrument;
use uuid::Uuid;

use shopworks_catalog::{Discount, validate_discount, validate_no_overlap};
use shopworks_core::{DiscountId, ProductId};
use shopworks_events::{CatalogEvent, EventBus};

use super::{StoreError, map_sqlx_error, products::CatalogService};

/// Discount creation/update payload. The owning product is fixed at
/// creation and cannot be moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDiscount {
    pub percentage: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct DiscountRecord {
    id: Uuid,
    product_id: Uuid,
    percentage: Decimal,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    is_active: bool,
}

impl DiscountRecord {
    pub(crate) fn into_domain(self) -> Discount {
        Discount {
            id: DiscountId::from_uuid(self.id),
            product_id: ProductId::from_uuid(self.product_id),
            percentage: self.percentage,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            is_active: self.is_active,
        }
    }
}

const DISCOUNT_COLUMNS: &str = "id, product_id, percentage, starts_at, ends_at, is_active";

impl<B> CatalogService<B>
where
    B: EventBus<CatalogEvent>,
{
    #[instrument(skip(self, new), fields(product_id = %product_id), err)]
    pub async fn create_discount(
        &self,
        product_id: ProductId,
        new: NewDiscount,
        now: DateTime<Utc>,
    ) -> Result<Discount, StoreError> {
        let candidate = Discount {
            id: DiscountId::new(),
            product_id,
            percentage: new.percentage,
            starts_at: new.starts_at,
            ends_at: new.ends_at,
            is_active: new.is_active,
        };
        validate_discount(&candidate)?;
        let existing = self.list_discounts(product_id).await?;
        validate_no_overlap(&candidate, &existing)?;

        let record = sqlx::query_as::<_, DiscountRecord>(&format!(
            "INSERT INTO discounts (id, product_id, percentage, starts_at, ends_at, is_active)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {DISCOUNT_COLUMNS}"
        ))
        .bind(candidate.id.as_uuid())
        .bind(candidate.product_id.as_uuid())
        .bind(candidate.percentage)
        .bind(candidate.starts_at)
        .bind(candidate.ends_at)
        .bind(candidate.is_active)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_sqlx_error("create_discount", e))?;

        self.publish(CatalogEvent::DiscountChanged {
            product_id,
            occurred_at: now,
        });
        Ok(record.into_domain())
    }

    #[instrument(skip(self, new), fields(discount_id = %id), err)]
    pub async fn update_discount(
        &self,
        id: DiscountId,
        new: NewDiscount,
        now: DateTime<Utc>,
    ) -> Result<Discount, StoreError> {
        let current = self.get_discount(id).await?;
        let candidate = Discount {
            id,
            product_id: current.product_id,
            percentage: new.percentage,
            starts_at: new.starts_at,
            ends_at: new.ends_at,
            is_active: new.is_active,
        };
        validate_discount(&candidate)?;
        let existing = self.list_discounts(current.product_id).await?;
        validate_no_overlap(&candidate, &existing)?;

        let record = sqlx::query_as::<_, DiscountRecord>(&format!(
            "UPDATE discounts
             SET percentage = $2, starts_at = $3, ends_at = $4, is_active = $5
             WHERE id = $1
             RETURNING {DISCOUNT_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(candidate.percentage)
        .bind(candidate.starts_at)
        .bind(candidate.ends_at)
        .bind(candidate.is_active)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_sqlx_error("update_discount", e))?;

        self.publish(CatalogEvent::DiscountChanged {
            product_id: current.product_id,
            occurred_at: now,
        });
        Ok(record.into_domain())
    }

    #[instrument(skip(self), fields(discount_id = %id), err)]
    pub async fn delete_discount(
        &self,
        id: DiscountId,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let record = sqlx::query_as::<_, DiscountRecord>(&format!(
            "DELETE FROM discounts WHERE id = $1 RETURNING {DISCOUNT_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_sqlx_error("delete_discount", e))?;

        self.publish(CatalogEvent::DiscountRemoved {
            product_id: ProductId::from_uuid(record.product_id),
            occurred_at: now,
        });
        Ok(())
    }

    pub async fn get_discount(&self, id: DiscountId) -> Result<Discount, StoreError> {
        let record = sqlx::query_as::<_, DiscountRecord>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_sqlx_error("get_discount", e))?;
        Ok(record.into_domain())
    }

    /// All discount rows of one product (any window, any flag).
    pub async fn list_discounts(&self, product_id: ProductId) -> Result<Vec<Discount>, StoreError> {
        let records = sqlx::query_as::<_, DiscountRecord>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE product_id = $1 ORDER BY starts_at"
        ))
        .bind(product_id.as_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("list_discounts", e))?;
        Ok(records.into_iter().map(DiscountRecord::into_domain).collect())
    }
}
