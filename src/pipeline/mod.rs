//! Rate-limited batching pipeline between the ingestion surface and the
//! upstream client.
//!
//! The pipeline absorbs bursts into a bounded in-memory queue and emits
//! updates of at most `update_size` alerts, bounded by a token bucket that
//! models the upstream ingestion quota. A single worker task owns the
//! queue consumer, the token counter and the in-flight batch; both
//! periodic timers (drain and refill) are folded into its event loop.
//!
//! The queue is best-effort: overflow and post-shutdown submissions are
//! dropped and accounted in `discards`, never surfaced to the producer.

mod stats;
mod worker;

pub use stats::{PipelineStats, PipelineStatsSnapshot};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::PipelineConfig;
use crate::models::Alert;
use crate::xdr::AlertForwarder;
use worker::DrainWorker;

/// Handle to a running batching pipeline.
pub struct AlertPipeline {
    tx: mpsc::Sender<Alert>,
    stats: Arc<PipelineStats>,
    closed: AtomicBool,
    cancel: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AlertPipeline {
    /// Spawns the drain worker and returns the pipeline handle.
    pub fn spawn(forwarder: Arc<dyn AlertForwarder>, config: PipelineConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.buffer_size);
        let stats = Arc::new(PipelineStats::default());
        let cancel = CancellationToken::new();
        let worker =
            DrainWorker::new(rx, forwarder, config, Arc::clone(&stats), cancel.clone());
        let handle = tokio::spawn(worker.run());
        Self {
            tx,
            stats,
            closed: AtomicBool::new(false),
            cancel,
            worker: Mutex::new(Some(handle)),
        }
    }

    /// Enqueues an alert without blocking.
    ///
    /// A closed pipeline or a full queue drops the alert and increments
    /// `discards`. The call never fails and never waits on the upstream.
    pub fn ingest(&self, alert: Alert) {
        if self.closed.load(Ordering::Acquire) {
            self.stats.discards.fetch_add(1, Ordering::Relaxed);
            return;
        }
        if self.tx.try_send(alert).is_err() {
            self.stats.discards.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Captures a point-in-time snapshot of the pipeline counters.
    pub fn stats(&self) -> PipelineStatsSnapshot {
        self.stats.snapshot()
    }

    /// Access to the live counters for the aggregated stats surface.
    pub fn counters(&self) -> Arc<PipelineStats> {
        Arc::clone(&self.stats)
    }

    /// Shuts the pipeline down and returns the final counter snapshot.
    ///
    /// Subsequent `ingest` calls discard. The worker finishes any in-flight
    /// POST, counts every residual queued item as a discard and exits;
    /// `close` waits for it. Calling `close` again just returns the
    /// snapshot.
    pub async fn close(&self) -> PipelineStatsSnapshot {
        self.closed.store(true, Ordering::Release);
        self.cancel.cancel();
        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                tracing::error!(error = %err, "drain worker terminated abnormally");
            }
        }
        self.stats.snapshot()
    }
}
