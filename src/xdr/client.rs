//! HTTP client for the `insert_parsed_alerts` ingestion endpoint.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Serialize;
use url::Url;

use super::auth;
use super::error::ClientError;
use super::AlertForwarder;
use crate::models::{Alert, InsertPayload, WireAlert};

/// Total request timeout for calls to the ingestion endpoint.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity and endpoint settings for [`XdrClient`].
#[derive(Debug, Clone, Default)]
pub struct XdrClientConfig {
    /// XDR API key (only the Advanced kind is supported).
    pub api_key: String,
    /// XDR API key ID.
    pub api_key_id: String,
    /// XDR instance to target, e.g. `acme.xdr.us.paloaltonetworks.com`.
    pub fqdn: String,
    /// Full endpoint URL overriding the FQDN-derived one. Primarily for
    /// integration tests.
    pub endpoint: Option<Url>,
    /// Verbose client logging.
    pub debug: bool,
}

/// Counters for the XDR API client. One writer per counter; readers take
/// point-in-time snapshots.
#[derive(Debug, Default)]
pub struct ClientStats {
    post_ok: AtomicU64,
    post_failures: AtomicU64,
}

impl ClientStats {
    /// Captures a point-in-time snapshot of the counters.
    pub fn snapshot(&self) -> ClientStatsSnapshot {
        ClientStatsSnapshot {
            post_ok: self.post_ok.load(Ordering::Relaxed),
            post_failures: self.post_failures.load(Ordering::Relaxed),
        }
    }
}

/// Plain data representation of [`ClientStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClientStatsSnapshot {
    /// Successful POSTs to the ingestion endpoint (status 200).
    pub post_ok: u64,
    /// Rejected or failed POSTs to the ingestion endpoint.
    pub post_failures: u64,
}

/// Client for the XDR alert ingestion API.
///
/// The nonce is generated once at construction and reused for every
/// request of the process lifetime.
#[derive(Debug)]
pub struct XdrClient {
    api_key_id: String,
    url: String,
    nonce: String,
    hash_prefix: String,
    http: reqwest::Client,
    stats: Arc<ClientStats>,
    debug: bool,
}

impl XdrClient {
    /// Validates the identity properties and builds a ready client.
    ///
    /// All three of `api_key`, `api_key_id` and `fqdn` must be non-empty.
    pub fn new(config: XdrClientConfig) -> Result<Self, ClientError> {
        if config.api_key.is_empty() {
            return Err(ClientError::MissingField("api_key"));
        }
        if config.api_key_id.is_empty() {
            return Err(ClientError::MissingField("api_key_id"));
        }
        if config.fqdn.is_empty() {
            return Err(ClientError::MissingField("fqdn"));
        }
        let url = match &config.endpoint {
            Some(endpoint) => endpoint.to_string(),
            None => format!(
                "https://api-{}/public_api/v1/alerts/insert_parsed_alerts/",
                config.fqdn
            ),
        };
        let nonce = auth::generate_nonce();
        let hash_prefix = format!("{}{}", config.api_key, nonce);
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        tracing::info!(endpoint = %url, "XDR client ready");
        Ok(Self {
            api_key_id: config.api_key_id,
            url,
            nonce,
            hash_prefix,
            http,
            stats: Arc::new(ClientStats::default()),
            debug: config.debug,
        })
    }

    /// Access to the live counters for the aggregated stats surface.
    pub fn counters(&self) -> Arc<ClientStats> {
        Arc::clone(&self.stats)
    }

    /// Captures a point-in-time snapshot of the client counters.
    pub fn stats(&self) -> ClientStatsSnapshot {
        self.stats.snapshot()
    }

    /// Sends a single alert in its own update.
    pub async fn send(&self, alert: &Alert) -> Result<(), ClientError> {
        self.send_multi(std::slice::from_ref(alert)).await
    }

    /// Sends multiple alerts in a single update.
    ///
    /// The upstream maximum update size is not enforced on this path; it
    /// only applies to pipeline-driven emission.
    pub async fn send_multi(&self, alerts: &[Alert]) -> Result<(), ClientError> {
        let payload = InsertPayload::new(alerts.iter().map(WireAlert::from).collect());
        let body = serde_json::to_vec(&payload)?;
        self.post(body).await
    }

    /// Signs and POSTs one serialized payload.
    ///
    /// A non-200 response is absorbed: it is logged with the response body
    /// and counted in `post_failures`, and the batch is considered consumed.
    /// Transport errors surface to the caller.
    async fn post(&self, payload: Vec<u8>) -> Result<(), ClientError> {
        let ts = auth::timestamp_millis();
        let result = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header("x-xdr-auth-id", &self.api_key_id)
            .header("x-xdr-nonce", &self.nonce)
            .header("x-xdr-timestamp", &ts)
            .header(AUTHORIZATION, auth::api_key_hash(&self.hash_prefix, &ts))
            .body(payload)
            .send()
            .await;
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                self.stats.post_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(error = %err, "failed to reach the ingestion endpoint");
                return Err(err.into());
            }
        };
        let status = response.status();
        if status == StatusCode::OK {
            if self.debug {
                tracing::debug!("successful call to insert_parsed_alerts");
            }
            self.stats.post_ok.fetch_add(1, Ordering::Relaxed);
        } else {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %body, "ingestion endpoint rejected the update");
            self.stats.post_failures.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }
}

#[async_trait]
impl AlertForwarder for XdrClient {
    async fn forward(&self, payload: Vec<u8>) -> Result<(), ClientError> {
        self.post(payload).await
    }
}
