//! Runtime counters for the batching pipeline.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for the batching pipeline. One writer per counter; readers
/// take point-in-time snapshots.
#[derive(Debug, Default)]
pub struct PipelineStats {
    pub(super) alerts_sent: AtomicU64,
    pub(super) updates_sent: AtomicU64,
    pub(super) send_failures: AtomicU64,
    pub(super) discards: AtomicU64,
}

impl PipelineStats {
    /// Captures a point-in-time snapshot of the counters.
    pub fn snapshot(&self) -> PipelineStatsSnapshot {
        PipelineStatsSnapshot {
            alerts_sent: self.alerts_sent.load(Ordering::Relaxed),
            updates_sent: self.updates_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            discards: self.discards.load(Ordering::Relaxed),
        }
    }
}

/// Plain data representation of [`PipelineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStatsSnapshot {
    /// Alerts handed to the upstream client, counted when an update is
    /// serialized (attempted sends; POST outcomes live in the client
    /// counters).
    pub alerts_sent: u64,
    /// Updates emitted toward the upstream client.
    pub updates_sent: u64,
    /// Alerts lost to update serialization failures.
    pub send_failures: u64,
    /// Alerts dropped on overflow, after shutdown, or while draining
    /// residuals at shutdown.
    pub discards: u64,
}
