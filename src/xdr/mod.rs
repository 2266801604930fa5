//! Client for the Cortex XDR `insert_parsed_alerts` ingestion API.
//!
//! Each request is authenticated with the advanced API key scheme: a
//! per-process random nonce plus a per-request SHA-256 digest over
//! `api_key || nonce || timestamp`. Rejected updates are not retried.

mod auth;
mod client;
mod error;

pub use client::{ClientStats, ClientStatsSnapshot, XdrClient, XdrClientConfig};
pub use error::ClientError;

use async_trait::async_trait;

/// Posting seam between the batching pipeline and the upstream API.
///
/// The pipeline depends on this trait rather than on [`XdrClient`] directly
/// so emission can be exercised without a network.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertForwarder: Send + Sync {
    /// Posts one serialized batch payload to the ingestion endpoint.
    async fn forward(&self, payload: Vec<u8>) -> Result<(), ClientError>;
}
