//! Device-facing HTTP ingestion surface.

mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{any, get};
use axum::Router;
use tokio_util::sync::CancellationToken;

use crate::parser::AlertParser;
use crate::pipeline::AlertPipeline;
use crate::stats::{GatewayStats, IngestStats};

/// Shared application state for the ingestion surface.
#[derive(Clone)]
pub struct ApiState {
    /// The batching pipeline parsed alerts are handed to.
    pipeline: Arc<AlertPipeline>,
    /// The device payload parser.
    parser: Arc<dyn AlertParser>,
    /// Pre-shared key expected in the `Authorization` header.
    psk: String,
    /// Ingestion surface counters.
    ingest_stats: Arc<IngestStats>,
    /// Aggregated counters for the `/stats` endpoint.
    stats: Arc<GatewayStats>,
    /// Verbose handler logging.
    debug: bool,
}

impl ApiState {
    /// Assembles the shared handler state.
    pub fn new(
        pipeline: Arc<AlertPipeline>,
        parser: Arc<dyn AlertParser>,
        psk: String,
        ingest_stats: Arc<IngestStats>,
        stats: Arc<GatewayStats>,
        debug: bool,
    ) -> Self {
        Self { pipeline, parser, psk, ingest_stats, stats, debug }
    }
}

/// Builds the ingestion router.
///
/// `/in`, `/dump` and `/stats` accept any method and always answer 200;
/// validity is reflected only in the counters so the sender learns
/// nothing from the response.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/in", any(handlers::ingest))
        .route("/dump", any(handlers::payload_hint))
        .route("/stats", any(handlers::stats))
        .with_state(state)
}

/// Runs the ingestion surface until `shutdown` fires.
pub async fn run_server(
    addr: SocketAddr,
    state: ApiState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "ingestion surface listening");
    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}
