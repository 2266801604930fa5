//! Aggregated runtime statistics for the gateway.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::pipeline::{PipelineStats, PipelineStatsSnapshot};
use crate::xdr::{ClientStats, ClientStatsSnapshot};

/// Counters for the device-facing ingestion surface. One writer per
/// counter; readers take point-in-time snapshots.
#[derive(Debug, Default)]
pub struct IngestStats {
    pub(crate) events_received: AtomicU64,
    pub(crate) parse_errors: AtomicU64,
    pub(crate) psk_errors: AtomicU64,
}

impl IngestStats {
    /// Captures a point-in-time snapshot of the counters.
    pub fn snapshot(&self) -> IngestStatsSnapshot {
        IngestStatsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            psk_errors: self.psk_errors.load(Ordering::Relaxed),
        }
    }
}

/// Plain data representation of [`IngestStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStatsSnapshot {
    /// Invocations of the ingestion endpoint.
    pub events_received: u64,
    /// Events rejected because of an unparseable payload or a non-POST
    /// request.
    pub parse_errors: u64,
    /// Events rejected because of a PSK mismatch.
    pub psk_errors: u64,
}

/// Aggregate view over the ingestion-surface, pipeline and upstream-client
/// counters.
pub struct GatewayStats {
    /// Ingestion surface counters.
    pub ingest: Arc<IngestStats>,
    /// Batching pipeline counters.
    pub pipeline: Arc<PipelineStats>,
    /// Upstream client counters.
    pub client: Arc<ClientStats>,
}

impl GatewayStats {
    /// Captures a point-in-time snapshot.
    ///
    /// The three blocks are read independently; readers may observe skew
    /// between them, which is acceptable for operational telemetry.
    pub fn snapshot(&self) -> GatewayStatsSnapshot {
        GatewayStatsSnapshot {
            ingest: self.ingest.snapshot(),
            pipeline: self.pipeline.snapshot(),
            client: self.client.snapshot(),
        }
    }
}

/// Serializable aggregate snapshot, flattened into a single JSON object.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GatewayStatsSnapshot {
    /// Ingestion surface counters.
    #[serde(flatten)]
    pub ingest: IngestStatsSnapshot,
    /// Batching pipeline counters.
    #[serde(flatten)]
    pub pipeline: PipelineStatsSnapshot,
    /// Upstream client counters.
    #[serde(flatten)]
    pub client: ClientStatsSnapshot,
}
