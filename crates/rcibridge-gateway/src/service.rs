//! Gateway service wiring.
//!
//! Connects a frozen [`SyncEngine`] to the host: registers the poll cycle
//! with the periodic scheduler and forwards item change events into the
//! engine's write path. Stopping is a best-effort flag flip; an in-flight
//! poll or write completes on its own, which is safe because the engine
//! holds no persisted state.

use crate::config::GatewayConfig;
use crate::engine::{EngineStats, SyncEngine, SOURCE_NAME};
use rcibridge_core::{ItemRegistry, JobFn, JobSpec, PeriodicScheduler};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

/// Running gateway: poll job plus item event loop.
pub struct GatewayService {
    engine: Arc<SyncEngine>,
    running: Arc<RwLock<bool>>,
}

impl GatewayService {
    /// Start the service: schedule the poll cycle and spawn the item event
    /// loop.
    ///
    /// The engine must be fully registered before this point; bindings are
    /// immutable from here on.
    pub async fn start(
        engine: Arc<SyncEngine>,
        registry: Arc<ItemRegistry>,
        scheduler: &dyn PeriodicScheduler,
        config: &GatewayConfig,
    ) -> Self {
        let running = Arc::new(RwLock::new(true));

        let poll_engine = engine.clone();
        let poll_running = running.clone();
        let poll_job: JobFn = Arc::new(move || {
            let engine = poll_engine.clone();
            let running = poll_running.clone();
            Box::pin(async move {
                if *running.read().await {
                    engine.poll_channels().await;
                }
            })
        });
        scheduler
            .schedule(
                JobSpec {
                    name: "rci-gateway poll channels".to_string(),
                    period: config.poll_period(),
                    offset: config.poll_offset(),
                    priority: config.poll_priority,
                },
                poll_job,
            )
            .await;

        let mut events = registry.subscribe();
        let loop_engine = engine.clone();
        let loop_running = running.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if !*loop_running.read().await {
                    break;
                }
                // The engine's own pushes come back through this feed; they
                // are filtered again inside update_item, but skipping here
                // avoids the log line too.
                if event.source == SOURCE_NAME || !loop_engine.is_bound(&event.item) {
                    continue;
                }
                info!(item = %event.item, source = %event.source, "update item");
                if let Err(e) = loop_engine.update_item(&event.item, &event.source).await {
                    error!(item = %event.item, error = %e, "item update failed");
                }
            }
        });

        info!(items = engine.bound_items(), "gateway service started");
        Self { engine, running }
    }

    /// Stop scheduling work. In-flight commands complete normally.
    pub async fn stop(&self) {
        *self.running.write().await = false;
        info!("gateway service stopped");
    }

    /// Whether the service is accepting work.
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Snapshot of the engine's lifetime counters.
    pub fn stats(&self) -> EngineStats {
        self.engine.stats()
    }
}
