//! Shared helpers for the integration suite.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use xdr_gateway::config::PipelineConfig;
use xdr_gateway::http_server::{self, ApiState};
use xdr_gateway::parser::PanOsParser;
use xdr_gateway::pipeline::AlertPipeline;
use xdr_gateway::stats::{GatewayStats, IngestStats};
use xdr_gateway::xdr::{AlertForwarder, ClientError, ClientStats};

/// Forwarder that records the size of every batch it receives instead of
/// posting it anywhere.
#[derive(Default)]
pub struct RecordingForwarder {
    batches: Mutex<Vec<usize>>,
    /// When set, the next `forward` call panics once.
    panic_once: AtomicBool,
}

impl RecordingForwarder {
    pub fn arm_panic(&self) {
        self.panic_once.store(true, Ordering::SeqCst);
    }

    pub fn batches(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertForwarder for RecordingForwarder {
    async fn forward(&self, payload: Vec<u8>) -> Result<(), ClientError> {
        if self.panic_once.swap(false, Ordering::SeqCst) {
            panic!("injected forwarder panic");
        }
        let value: serde_json::Value =
            serde_json::from_slice(&payload).expect("payload is valid JSON");
        let count = value["request_data"]["alerts"]
            .as_array()
            .expect("payload carries an alerts array")
            .len();
        self.batches.lock().unwrap().push(count);
        Ok(())
    }
}

/// Forwarder that sleeps before acknowledging, to model an in-flight POST.
pub struct SlowForwarder {
    pub delay: Duration,
    pub completed: Arc<AtomicBool>,
}

#[async_trait]
impl AlertForwarder for SlowForwarder {
    async fn forward(&self, _payload: Vec<u8>) -> Result<(), ClientError> {
        tokio::time::sleep(self.delay).await;
        self.completed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Pipeline tuning used by the scenario tests unless a test overrides it.
pub fn scenario_config() -> PipelineConfig {
    PipelineConfig {
        update_size: 3,
        quota_size: 5,
        quota_period: Duration::from_secs(60),
        buffer_size: 10,
        drain_period: Duration::from_secs(1),
        debug: false,
    }
}

/// A gateway ingestion surface bound to an ephemeral port.
pub struct TestServer {
    pub address: SocketAddr,
    pub pipeline: Arc<AlertPipeline>,
    pub forwarder: Arc<RecordingForwarder>,
    pub client: reqwest::Client,
    shutdown: CancellationToken,
    server_handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    /// Spawns the real router with a recording forwarder behind the
    /// pipeline.
    pub async fn spawn(psk: &str) -> Self {
        let forwarder = Arc::new(RecordingForwarder::default());
        let pipeline = Arc::new(AlertPipeline::spawn(
            Arc::clone(&forwarder) as Arc<dyn AlertForwarder>,
            PipelineConfig { drain_period: Duration::from_secs(3600), ..scenario_config() },
        ));
        let ingest_stats = Arc::new(IngestStats::default());
        let stats = Arc::new(GatewayStats {
            ingest: Arc::clone(&ingest_stats),
            pipeline: pipeline.counters(),
            client: Arc::new(ClientStats::default()),
        });
        let state = ApiState::new(
            Arc::clone(&pipeline),
            Arc::new(PanOsParser::new(0, false)),
            psk.to_string(),
            ingest_stats,
            stats,
            false,
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind");
        let address = listener.local_addr().expect("failed to get address");
        drop(listener);

        let shutdown = CancellationToken::new();
        let server_token = shutdown.clone();
        let server_handle =
            tokio::spawn(
                async move { http_server::run_server(address, state, server_token).await },
            );
        tokio::time::sleep(Duration::from_millis(200)).await;

        Self {
            address,
            pipeline,
            forwarder,
            client: reqwest::Client::new(),
            shutdown,
            server_handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.address, path)
    }

    pub async fn cleanup(self) {
        self.shutdown.cancel();
        let _ = self.server_handle.await;
    }
}

/// A payload the PAN-OS parser accepts.
pub fn valid_payload() -> &'static str {
    r#"{
        "src": "10.0.0.1",
        "sport": 1234,
        "dst": "192.168.1.20",
        "dport": 443,
        "time_generated": "2021/02/08 11:57:03",
        "rule": "outbound-block",
        "serial": "007200002517",
        "sender_sw_version": "10.0.4",
        "subtype": "spyware",
        "threat_name": "ZeroAccess",
        "severity": "critical",
        "action": "drop"
    }
---annex---
"botnet C2 traffic"
"#
}
