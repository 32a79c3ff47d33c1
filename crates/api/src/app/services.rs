//! Infrastructure wiring for the HTTP app.

use std::sync::Arc;

use sqlx::PgPool;

use shopworks_events::{CatalogEvent, InMemoryEventBus};
use shopworks_infra::{
    CatalogService, OrderService, RecomputeDispatcher, RecomputeWorker, WorkerHandle, connect,
    run_migrations,
};

pub type CatalogBus = InMemoryEventBus<CatalogEvent>;

/// Shared application services.
///
/// Holds the pool and the bus; the per-request service handles are built
/// from them on demand (no process-global service state). The recompute
/// worker subscribes to the bus before any request can publish, so catalog
/// changes made over HTTP are always picked up.
pub struct AppServices {
    pool: PgPool,
    bus: Arc<CatalogBus>,
    worker: Option<WorkerHandle>,
}

impl AppServices {
    pub fn catalog(&self) -> CatalogService<CatalogBus> {
        CatalogService::new(self.pool.clone(), self.bus.clone())
    }

    pub fn orders(&self) -> OrderService {
        OrderService::new(self.pool.clone())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Drop for AppServices {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.shutdown();
        }
    }
}

/// Connect, migrate, and start the recompute worker.
pub async fn build_services(database_url: &str) -> anyhow::Result<AppServices> {
    let pool = connect(database_url).await?;
    run_migrations(&pool).await?;

    let bus: Arc<CatalogBus> = Arc::new(CatalogBus::new());
    let dispatcher = RecomputeDispatcher::new(pool.clone());
    let worker = RecomputeWorker::spawn(bus.clone(), dispatcher);

    Ok(AppServices {
        pool,
        bus,
        worker: Some(worker),
    })
}
