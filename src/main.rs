use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use xdr_gateway::{
    config::GatewayConfig,
    http_server::{self, ApiState},
    parser::{AlertParser, PanOsParser},
    pipeline::AlertPipeline,
    stats::{GatewayStats, IngestStats},
    xdr::{AlertForwarder, XdrClient},
};

/// PAN-OS to Cortex XDR alert ingestion gateway.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Listening port, overrides the PORT environment variable.
    #[arg(short, long)]
    port: Option<u16>,
    /// Device timestamp offset in hours, overrides OFFSET.
    #[arg(long)]
    offset: Option<i32>,
    /// Verbose logging, overrides DEBUG.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = GatewayConfig::from_env()?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(offset) = cli.offset {
        config.tz_offset_hours = offset;
    }
    if cli.debug {
        config.debug = true;
        config.pipeline.debug = true;
        config.client.debug = true;
    }

    let default_filter = if config.debug { "debug" } else { "info" };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let parser = Arc::new(PanOsParser::new(config.tz_offset_hours, config.debug));
    println!("PAN-OS to Cortex XDR alert ingestion gateway");
    println!("--------------------------------------------");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("  - Send PAN-OS alerts to /in using HTTP POST");
    println!("  - The endpoint /stats provides runtime statistics");
    println!("  - Use the following payload in the HTTP Log Forwarding feature");
    println!("{}", String::from_utf8_lossy(parser.payload_layout()));

    let client = Arc::new(XdrClient::new(config.client.clone())?);
    let pipeline = Arc::new(AlertPipeline::spawn(
        Arc::clone(&client) as Arc<dyn AlertForwarder>,
        config.pipeline.clone(),
    ));
    let ingest_stats = Arc::new(IngestStats::default());
    let stats = Arc::new(GatewayStats {
        ingest: Arc::clone(&ingest_stats),
        pipeline: pipeline.counters(),
        client: client.counters(),
    });
    let state = ApiState::new(
        Arc::clone(&pipeline),
        parser,
        config.psk.clone(),
        ingest_stats,
        stats,
        config.debug,
    );

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        let ctrl_c = signal::ctrl_c();
        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("failed to register SIGTERM handler")
                .recv()
                .await;
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => tracing::info!("SIGINT received, initiating graceful shutdown"),
            _ = terminate => tracing::info!("SIGTERM received, initiating graceful shutdown"),
        }
        signal_token.cancel();
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    http_server::run_server(addr, state, shutdown).await?;

    let final_stats = pipeline.close().await;
    tracing::info!(?final_stats, "pipeline drained, exiting");
    Ok(())
}
