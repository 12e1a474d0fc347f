//! Periodic job scheduling.
//!
//! Jobs run single-flight: a tick that takes longer than the period delays
//! the next tick instead of overlapping it. Shutdown is a best-effort flag
//! flip; an in-flight invocation finishes on its own.

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Boxed future returned by a job closure.
pub type JobFuture = BoxFuture<'static, ()>;

/// Factory producing one invocation of a periodic job.
pub type JobFn = Arc<dyn Fn() -> JobFuture + Send + Sync>;

/// Description of a periodic job.
#[derive(Debug, Clone)]
pub struct JobSpec {
    /// Job name, for logs.
    pub name: String,
    /// Cycle period between invocations.
    pub period: Duration,
    /// Delay before the first invocation.
    pub offset: Duration,
    /// Relative priority. Recorded for hosts with prioritized schedulers;
    /// the tokio implementation only logs it.
    pub priority: u8,
}

/// Capability to register periodic callbacks.
#[async_trait]
pub trait PeriodicScheduler: Send + Sync {
    /// Register a job. Invocations are single-flight per job.
    async fn schedule(&self, spec: JobSpec, job: JobFn);
}

/// Tokio-based scheduler: one spawned task per job.
pub struct TokioScheduler {
    running: Arc<RwLock<bool>>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self {
            running: Arc::new(RwLock::new(true)),
        }
    }

    /// Stop scheduling further invocations. Jobs already running complete
    /// normally.
    pub async fn shutdown(&self) {
        *self.running.write().await = false;
        info!("scheduler shut down");
    }
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PeriodicScheduler for TokioScheduler {
    async fn schedule(&self, spec: JobSpec, job: JobFn) {
        info!(
            job = %spec.name,
            period_secs = spec.period.as_secs(),
            offset_secs = spec.offset.as_secs(),
            priority = spec.priority,
            "scheduling periodic job"
        );
        let running = self.running.clone();
        tokio::spawn(async move {
            tokio::time::sleep(spec.offset).await;
            while *running.read().await {
                debug!(job = %spec.name, "job tick");
                job().await;
                tokio::time::sleep(spec.period).await;
            }
            debug!(job = %spec.name, "job loop exited");
        });
    }
}
