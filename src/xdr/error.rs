//! Error types for the XDR API client.

use thiserror::Error;

/// Errors returned by the XDR API client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A mandatory identity property was empty at construction time.
    #[error("missing mandatory {0} property")]
    MissingField(&'static str),

    /// The batch payload could not be serialized.
    #[error("failed to serialize alert payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// The HTTP request could not be completed (connect, read or timeout).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}
