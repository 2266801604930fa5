//! Tuning knobs for the batching pipeline.

use std::time::Duration;

/// Default maximum number of alerts per emitted update.
const DEFAULT_UPDATE_SIZE: usize = 60;
/// Default token budget granted per refill period.
const DEFAULT_QUOTA_SIZE: usize = 600;
/// Default refill period for the token bucket.
const DEFAULT_QUOTA_SECONDS: u64 = 60;
/// Default capacity of the in-memory alert queue.
const DEFAULT_BUFFER_SIZE: usize = 6000;
/// Default period of the drain tick.
const DEFAULT_DRAIN_SECONDS: u64 = 2;

/// Tuning for the batching pipeline. Immutable after construction.
///
/// All values must be positive. `update_size <= quota_size` is not
/// enforced, but a sensible deployment keeps it that way.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum number of alerts per emitted update.
    pub update_size: usize,
    /// Token budget granted per refill period. The refill replaces the
    /// budget rather than adding to it.
    pub quota_size: usize,
    /// Refill period for the token bucket.
    pub quota_period: Duration,
    /// Capacity of the in-memory alert queue.
    pub buffer_size: usize,
    /// Period of the drain tick.
    pub drain_period: Duration,
    /// Verbose emission logging.
    pub debug: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            update_size: DEFAULT_UPDATE_SIZE,
            quota_size: DEFAULT_QUOTA_SIZE,
            quota_period: Duration::from_secs(DEFAULT_QUOTA_SECONDS),
            buffer_size: DEFAULT_BUFFER_SIZE,
            drain_period: Duration::from_secs(DEFAULT_DRAIN_SECONDS),
            debug: false,
        }
    }
}
