//! The drain worker: the single task owning the queue consumer, the token
//! bucket and the in-flight batch.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::stats::PipelineStats;
use crate::config::PipelineConfig;
use crate::models::{Alert, InsertPayload, WireAlert};
use crate::xdr::AlertForwarder;

pub(super) struct DrainWorker {
    rx: mpsc::Receiver<Alert>,
    forwarder: Arc<dyn AlertForwarder>,
    config: PipelineConfig,
    stats: Arc<PipelineStats>,
    cancel: CancellationToken,
    /// Remaining token budget for the current refill window.
    tokens: usize,
    batch: Vec<WireAlert>,
}

impl DrainWorker {
    pub(super) fn new(
        rx: mpsc::Receiver<Alert>,
        forwarder: Arc<dyn AlertForwarder>,
        config: PipelineConfig,
        stats: Arc<PipelineStats>,
        cancel: CancellationToken,
    ) -> Self {
        let tokens = config.quota_size;
        let batch = Vec::with_capacity(config.update_size);
        Self { rx, forwarder, config, stats, cancel, tokens, batch }
    }

    /// Runs the event loop until cancellation.
    ///
    /// Both periodic timers live here so the token counter has a single
    /// writer. Refill replaces the budget rather than adding to it, and
    /// missed refill ticks do not accumulate.
    pub(super) async fn run(mut self) {
        tracing::debug!("drain worker started");
        let start = tokio::time::Instant::now();
        let mut drain =
            tokio::time::interval_at(start + self.config.drain_period, self.config.drain_period);
        let mut refill =
            tokio::time::interval_at(start + self.config.quota_period, self.config.quota_period);
        refill.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    self.drain_residuals();
                    break;
                }

                _ = refill.tick() => {
                    self.tokens = self.config.quota_size;
                }

                _ = drain.tick() => {
                    if let Err(panic) = AssertUnwindSafe(self.drain_once()).catch_unwind().await {
                        tracing::error!(?panic, "drain tick panicked");
                    }
                }
            }
        }
        tracing::debug!("drain worker stopped");
    }

    /// Pulls alerts while the token budget lasts, emitting a full update as
    /// soon as it reaches `update_size` and any partial remainder at the
    /// end of the tick.
    async fn drain_once(&mut self) {
        while self.tokens > 0 {
            match self.rx.try_recv() {
                Ok(alert) => {
                    self.batch.push(WireAlert::from(&alert));
                    self.tokens -= 1;
                    if self.batch.len() >= self.config.update_size {
                        self.emit().await;
                    }
                }
                Err(_) => break,
            }
        }
        self.emit().await;
    }

    /// Serializes and posts the in-flight batch.
    ///
    /// `alerts_sent` counts attempted sends: a rejected or failed POST does
    /// not rewind it. Serialization failures charge `send_failures` instead.
    async fn emit(&mut self) {
        if self.batch.is_empty() {
            return;
        }
        let count = self.batch.len() as u64;
        let batch = std::mem::replace(&mut self.batch, Vec::with_capacity(self.config.update_size));
        match serde_json::to_vec(&InsertPayload::new(batch)) {
            Ok(body) => {
                self.stats.alerts_sent.fetch_add(count, Ordering::Relaxed);
                self.stats.updates_sent.fetch_add(1, Ordering::Relaxed);
                if self.config.debug {
                    tracing::debug!(alerts = count, "posting update");
                }
                if let Err(err) = self.forwarder.forward(body).await {
                    tracing::warn!(error = %err, alerts = count, "update post failed");
                }
            }
            Err(err) => {
                tracing::error!(error = %err, alerts = count, "update serialization failed");
                self.stats.send_failures.fetch_add(count, Ordering::Relaxed);
            }
        }
    }

    /// Counts every alert still queued at shutdown as a discard.
    fn drain_residuals(&mut self) {
        while self.rx.try_recv().is_ok() {
            self.stats.discards.fetch_add(1, Ordering::Relaxed);
        }
    }
}
