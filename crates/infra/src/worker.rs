//! Background recompute worker.
//!
//! Bridges the synchronous event bus to the async dispatcher: a dedicated
//! thread drains a bus subscription and applies each event on a small
//! single-threaded runtime. Handler failures are logged and dropped; the
//! dispatcher is idempotent, so the next event for the same product (or a
//! manual re-run) repairs anything a failed application left stale.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{error, warn};

use shopworks_events::{CatalogEvent, EventBus, Subscription};

use crate::recompute::RecomputeDispatcher;

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Catalog-event worker loop.
#[derive(Debug)]
pub struct RecomputeWorker;

impl RecomputeWorker {
    /// Spawn a worker thread that applies catalog events from the bus.
    pub fn spawn<B>(bus: B, dispatcher: RecomputeDispatcher) -> WorkerHandle
    where
        B: EventBus<CatalogEvent> + Send + Sync + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let sub: Subscription<CatalogEvent> = bus.subscribe();

        let join = thread::Builder::new()
            .name("recompute-worker".to_string())
            .spawn(move || worker_loop(sub, shutdown_rx, dispatcher))
            .expect("failed to spawn recompute worker thread");

        WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        }
    }
}

fn worker_loop(
    sub: Subscription<CatalogEvent>,
    shutdown_rx: mpsc::Receiver<()>,
    dispatcher: RecomputeDispatcher,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "recompute worker could not build a runtime");
            return;
        }
    };

    let tick = Duration::from_millis(250);

    loop {
        // Shutdown check (non-blocking)
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match sub.recv_timeout(tick) {
            Ok(event) => {
                if let Err(err) = runtime.block_on(dispatcher.handle(&event)) {
                    warn!(error = ?err, "recompute worker handler failed");
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}
