//! Parsing of device payloads into normalized alerts.

mod panos;

pub use panos::PanOsParser;

use thiserror::Error;

use crate::models::{Alert, NetDataError};

/// Errors raised while turning a device payload into an [`Alert`].
#[derive(Debug, Error)]
pub enum ParseError {
    /// The payload body was not valid JSON.
    #[error("invalid alert payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The generation timestamp did not match the expected layout.
    #[error("invalid generation timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),

    /// The network tuple failed validation.
    #[error(transparent)]
    Net(#[from] NetDataError),
}

/// Converts device-pushed payloads into normalized alerts.
///
/// Exercised only by the ingestion surface; the batching pipeline never
/// calls the parser.
pub trait AlertParser: Send + Sync {
    /// Attempts to build an [`Alert`] from the payload pushed by the device.
    fn parse(&self, data: &[u8]) -> Result<Alert, ParseError>;

    /// Returns a human-readable template of the payload this parser
    /// understands, to assist the device administrator preparing the
    /// forwarding profile.
    fn payload_layout(&self) -> &[u8];
}
