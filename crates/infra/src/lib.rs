//! Infrastructure layer: Postgres persistence, recompute dispatch, sweep.
//!
//! Services here are stateless: each is a thin handle over the shared
//! connection pool, constructed wherever it is needed (no process-global
//! singletons). Every multi-row effect — confirm decrements, cancel
//! releases, batch total recompute, regenerate — runs in a single
//! transaction, and product rows are locked in stable id order before any
//! stock check so concurrent confirms serialize instead of racing.

pub mod recompute;
pub mod store;
pub mod sweep;
pub mod worker;

pub use recompute::{RecomputeDispatcher, RecomputeOutcome};
pub use store::{
    CatalogService, NewDiscount, NewReview, OrderService, OrderView, Page, Paginated, StoreError,
    connect, run_migrations,
};
pub use sweep::{STALE_PENDING_MAX_AGE_HOURS, SweepReport, sweep_stale_pending};
pub use worker::{RecomputeWorker, WorkerHandle};
