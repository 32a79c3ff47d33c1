//! Review store.
//!
//! Every review write re-derives the owning product's rating inside the same
//! transaction: the arithmetic mean of all its reviews rounded to two
//! decimals, or NULL once the last review is gone. Postgres `ROUND(numeric)`
//! rounds half away from zero, the same policy as the domain's
//! `average_rating`.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use shopworks_catalog::Review;
use shopworks_core::{ProductId, ReviewId, UserId};
use shopworks_events::{CatalogEvent, EventBus};

use super::{StoreError, map_sqlx_error, non_negative, products::CatalogService};

/// Review creation payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub product_id: ProductId,
    pub author: UserId,
    pub rating: u8,
    pub comment: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ReviewRecord {
    id: Uuid,
    product_id: Uuid,
    author_id: Uuid,
    rating: i32,
    comment: String,
    created_at: DateTime<Utc>,
}

impl ReviewRecord {
    fn into_domain(self) -> Result<Review, StoreError> {
        let rating = non_negative(self.rating, "rating")?;
        Ok(Review {
            id: ReviewId::from_uuid(self.id),
            product_id: ProductId::from_uuid(self.product_id),
            author: UserId::from_uuid(self.author_id),
            rating: rating as u8,
            comment: self.comment,
            created_at: self.created_at,
        })
    }
}

const REVIEW_COLUMNS: &str = "id, product_id, author_id, rating, comment, created_at";

async fn refresh_product_rating(
    conn: &mut PgConnection,
    product_id: Uuid,
) -> Result<(), StoreError> {
    sqlx::query(
        "UPDATE products
         SET rating = (SELECT ROUND(AVG(rating), 2) FROM reviews WHERE product_id = $1),
             updated_at = now()
         WHERE id = $1",
    )
    .bind(product_id)
    .execute(conn)
    .await
    .map_err(|e| map_sqlx_error("refresh_product_rating", e))?;
    Ok(())
}

impl<B> CatalogService<B>
where
    B: EventBus<CatalogEvent>,
{
    #[instrument(skip(self, new), fields(product_id = %new.product_id), err)]
    pub async fn create_review(&self, new: NewReview) -> Result<Review, StoreError> {
        let review = Review {
            id: ReviewId::new(),
            product_id: new.product_id,
            author: new.author,
            rating: new.rating,
            comment: new.comment,
            created_at: Utc::now(),
        };
        review.validate()?;

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("create_review", e))?;

        let record = sqlx::query_as::<_, ReviewRecord>(&format!(
            "INSERT INTO reviews (id, product_id, author_id, rating, comment)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(review.id.as_uuid())
        .bind(review.product_id.as_uuid())
        .bind(review.author.as_uuid())
        .bind(i32::from(review.rating))
        .bind(&review.comment)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_review", e))?;

        refresh_product_rating(&mut *tx, *review.product_id.as_uuid()).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("create_review", e))?;
        record.into_domain()
    }

    #[instrument(skip(self, comment), fields(review_id = %id), err)]
    pub async fn update_review(
        &self,
        id: ReviewId,
        rating: u8,
        comment: String,
    ) -> Result<Review, StoreError> {
        if !(1..=5).contains(&rating) {
            return Err(shopworks_core::DomainError::validation(
                "rating must be between 1 and 5",
            )
            .into());
        }

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("update_review", e))?;

        let record = sqlx::query_as::<_, ReviewRecord>(&format!(
            "UPDATE reviews SET rating = $2, comment = $3
             WHERE id = $1
             RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(i32::from(rating))
        .bind(&comment)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_review", e))?;

        refresh_product_rating(&mut *tx, record.product_id).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("update_review", e))?;
        record.into_domain()
    }

    #[instrument(skip(self), fields(review_id = %id), err)]
    pub async fn delete_review(&self, id: ReviewId) -> Result<(), StoreError> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("delete_review", e))?;

        let record = sqlx::query_as::<_, ReviewRecord>(&format!(
            "DELETE FROM reviews WHERE id = $1 RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("delete_review", e))?;

        refresh_product_rating(&mut *tx, record.product_id).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("delete_review", e))?;
        Ok(())
    }

    pub async fn list_reviews(&self, product_id: ProductId) -> Result<Vec<Review>, StoreError> {
        let records = sqlx::query_as::<_, ReviewRecord>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE product_id = $1 ORDER BY created_at DESC"
        ))
        .bind(product_id.as_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("list_reviews", e))?;
        records.into_iter().map(ReviewRecord::into_domain).collect()
    }
}
