//! Reactive recompute dispatcher.
//!
//! Keeps every pending order's line-item snapshots and total price
//! consistent with the latest catalog state. One transaction per event:
//! push the fresh snapshot value onto every pending line item of the
//! affected product, then batch-recompute the totals of every affected
//! order in a single set-based statement.
//!
//! The dispatcher never trusts event payloads for state: it re-reads the
//! product price and resolves "active discount now" inside its own
//! transaction. Handling the same event twice therefore lands in the same
//! state as handling it once, and a failed run can simply be re-run.
//!
//! The batch total statement is the performance variant of
//! `shopworks_orders::pricing::order_total` and must stay equivalent to it:
//! per line `ROUND(price * (1 - COALESCE(pct, 0) / 100) * quantity, 2)`,
//! summed per order, rounded again. Postgres `ROUND` on `numeric` rounds
//! half away from zero, the same policy as the engine.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};

use shopworks_core::ProductId;
use shopworks_events::{CatalogEvent, Event};

use crate::store::{StoreError, map_sqlx_error};

/// Stateless dispatcher handle over the pool.
#[derive(Debug, Clone)]
pub struct RecomputeDispatcher {
    pool: PgPool,
}

/// What one event application touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecomputeOutcome {
    /// Pending line items whose snapshot was refreshed.
    pub items_refreshed: u64,
    /// Pending orders whose total was recomputed.
    pub orders_recomputed: u64,
}

impl RecomputeDispatcher {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply one catalog event. Idempotent; safe to re-run on failure.
    #[instrument(skip(self), fields(event_type = %event.event_type()), err)]
    pub async fn handle(&self, event: &CatalogEvent) -> Result<RecomputeOutcome, StoreError> {
        let outcome = match event {
            CatalogEvent::ProductPriceChanged { product_id, .. } => {
                self.refresh_price(*product_id).await?
            }
            CatalogEvent::DiscountChanged { product_id, .. }
            | CatalogEvent::DiscountRemoved { product_id, .. } => {
                // "Active now" is resolved at handling time, not event time:
                // a stale or replayed event still converges on current state.
                self.refresh_discount(*product_id, Utc::now()).await?
            }
        };
        info!(
            items = outcome.items_refreshed,
            orders = outcome.orders_recomputed,
            "recompute applied"
        );
        Ok(outcome)
    }

    /// Product price changed: copy the current price onto every pending line
    /// item of the product, then recompute affected totals.
    async fn refresh_price(&self, product_id: ProductId) -> Result<RecomputeOutcome, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("refresh_price", e))?;

        let refreshed = sqlx::query(
            "UPDATE order_items oi
             SET price = p.price
             FROM products p, orders o
             WHERE oi.product_id = $1
               AND p.id = oi.product_id
               AND o.id = oi.order_id
               AND o.status = 'PENDING'",
        )
        .bind(product_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("refresh_price", e))?;

        let recomputed = batch_recompute_totals(&mut *tx, product_id).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("refresh_price", e))?;

        Ok(RecomputeOutcome {
            items_refreshed: refreshed.rows_affected(),
            orders_recomputed: recomputed,
        })
    }

    /// Discount created/changed/deleted: resolve the product's active
    /// percentage as of `now` (NULL when none), push it onto every pending
    /// line item, then recompute affected totals.
    async fn refresh_discount(
        &self,
        product_id: ProductId,
        now: DateTime<Utc>,
    ) -> Result<RecomputeOutcome, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("refresh_discount", e))?;

        // Same tie-break as the domain resolver: highest percentage, then
        // latest start, then id.
        let refreshed = sqlx::query(
            "UPDATE order_items oi
             SET discount_percentage = (
                 SELECT d.percentage
                 FROM discounts d
                 WHERE d.product_id = $1
                   AND d.is_active
                   AND d.starts_at <= $2
                   AND d.ends_at >= $2
                 ORDER BY d.percentage DESC, d.starts_at DESC, d.id DESC
                 LIMIT 1
             )
             FROM orders o
             WHERE oi.product_id = $1
               AND o.id = oi.order_id
               AND o.status = 'PENDING'",
        )
        .bind(product_id.as_uuid())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("refresh_discount", e))?;

        let recomputed = batch_recompute_totals(&mut *tx, product_id).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("refresh_discount", e))?;

        Ok(RecomputeOutcome {
            items_refreshed: refreshed.rows_affected(),
            orders_recomputed: recomputed,
        })
    }
}

/// Set-based total recompute for every pending order holding the product.
///
/// The inner aggregate covers **all** lines of an affected order, not just
/// the changed product's, so the persisted total is always the full
/// engine-defined sum.
async fn batch_recompute_totals(
    conn: &mut PgConnection,
    product_id: ProductId,
) -> Result<u64, StoreError> {
    let result = sqlx::query(
        "UPDATE orders o
         SET total_price = t.total, updated_at = now()
         FROM (
             SELECT oi.order_id,
                    ROUND(SUM(ROUND(
                        oi.price * (1 - COALESCE(oi.discount_percentage, 0) / 100) * oi.quantity,
                        2
                    )), 2) AS total
             FROM order_items oi
             WHERE oi.order_id IN (
                 SELECT o2.id
                 FROM orders o2
                 JOIN order_items touched ON touched.order_id = o2.id
                 WHERE touched.product_id = $1
                   AND o2.status = 'PENDING'
             )
             GROUP BY oi.order_id
         ) t
         WHERE o.id = t.order_id",
    )
    .bind(product_id.as_uuid())
    .execute(conn)
    .await
    .map_err(|e| map_sqlx_error("batch_recompute_totals", e))?;
    Ok(result.rows_affected())
}
