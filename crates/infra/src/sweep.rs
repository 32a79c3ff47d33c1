//! Stale-pending sweep.
//!
//! Cancels orders still pending after the age threshold, applying the same
//! cancel transition (inventory release included) as a manual cancel. The
//! target set is re-derived fresh on every run, and each order is
//! re-checked under its row lock at execution time, so an order that a
//! concurrent request already moved out of pending is skipped, never
//! double-released.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::{instrument, warn};
use uuid::Uuid;

use shopworks_core::OrderId;

use crate::store::{StoreError, map_sqlx_error};

/// Orders pending longer than this are swept.
pub const STALE_PENDING_MAX_AGE_HOURS: i64 = 5;

/// Outcome of one sweep run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepReport {
    /// Stale candidates found at the start of the run.
    pub examined: usize,
    /// Orders actually canceled by this run.
    pub canceled: usize,
}

/// Cancel every order still pending since before `now - 5h`.
///
/// Fire-and-forget per run: failures on individual orders are logged and
/// left for the next run (the transition is idempotent at this layer: a
/// skipped order is either picked up again or no longer pending).
#[instrument(skip(pool), err)]
pub async fn sweep_stale_pending(
    pool: &PgPool,
    now: DateTime<Utc>,
) -> Result<SweepReport, StoreError> {
    let cutoff = now - Duration::hours(STALE_PENDING_MAX_AGE_HOURS);

    let stale: Vec<Uuid> = sqlx::query_scalar(
        "SELECT id FROM orders WHERE status = 'PENDING' AND created_at <= $1 ORDER BY created_at",
    )
    .bind(cutoff)
    .fetch_all(pool)
    .await
    .map_err(|e| map_sqlx_error("sweep_stale_pending", e))?;

    let mut report = SweepReport {
        examined: stale.len(),
        ..SweepReport::default()
    };

    for id in stale {
        let order_id = OrderId::from_uuid(id);
        match cancel_if_still_pending(pool, order_id).await {
            Ok(true) => report.canceled += 1,
            Ok(false) => {}
            Err(err) => {
                warn!(order_id = %order_id, error = ?err, "sweep could not cancel order");
            }
        }
    }

    Ok(report)
}

/// One order, one transaction: re-check the status under the row lock, then
/// run the shared cancel path. Returns false when the order already left
/// pending between candidate selection and execution.
async fn cancel_if_still_pending(pool: &PgPool, order_id: OrderId) -> Result<bool, StoreError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| map_sqlx_error("cancel_if_still_pending", e))?;

    let status: Option<String> =
        sqlx::query_scalar("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("cancel_if_still_pending", e))?;

    if status.as_deref() != Some("PENDING") {
        return Ok(false);
    }

    let order = crate::store::fetch_order(&mut *tx, order_id).await?;
    crate::store::cancel_locked(&mut *tx, &order).await?;

    tx.commit()
        .await
        .map_err(|e| map_sqlx_error("cancel_if_still_pending", e))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_is_five_hours() {
        let now = Utc::now();
        let cutoff = now - Duration::hours(STALE_PENDING_MAX_AGE_HOURS);
        assert_eq!(now - cutoff, Duration::hours(5));
    }
}
