//! Process configuration assembled from environment variables.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use super::pipeline::PipelineConfig;
use crate::xdr::XdrClientConfig;

/// Default listening port for the ingestion surface.
const DEFAULT_PORT: u16 = 8080;

/// Errors raised while assembling the gateway configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A mandatory environment variable was not provided.
    #[error("{0} env variable not provided")]
    MissingVar(&'static str),

    /// The endpoint override was not a valid URL.
    #[error("invalid XDR_ENDPOINT value: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

/// Top-level runtime configuration for the gateway process.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Identity and endpoint settings for the upstream client.
    pub client: XdrClientConfig,
    /// Tuning for the batching pipeline.
    pub pipeline: PipelineConfig,
    /// Pre-shared key expected byte-exact in the `Authorization` header of
    /// the ingestion surface. An empty PSK accepts requests that carry no
    /// `Authorization` header.
    pub psk: String,
    /// Listening port for the HTTP server.
    pub port: u16,
    /// Device timestamp offset from UTC in whole hours.
    pub tz_offset_hours: i32,
    /// Verbose logging.
    pub debug: bool,
}

/// Reads an optional environment variable, ignoring unparseable values.
fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|value| value.parse().ok())
}

/// Reads a mandatory environment variable; empty counts as absent.
fn required_var(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

impl GatewayConfig {
    /// Assembles the configuration from the process environment.
    ///
    /// `API_KEY`, `API_KEY_ID` and `FQDN` are mandatory. Everything else
    /// falls back to its default when absent or unparseable: `PSK`,
    /// `PORT`, `OFFSET`, the pipeline knobs `QUOTA_SIZE`,
    /// `QUOTA_SECONDS`, `UPDATE_SIZE`, `BUFFER_SIZE` and `T1` (drain
    /// period in seconds), and `DEBUG` (presence alone enables verbose
    /// logging). `XDR_ENDPOINT` overrides the FQDN-derived endpoint URL,
    /// primarily for integration tests.
    pub fn from_env() -> Result<Self, ConfigError> {
        let debug = std::env::var("DEBUG").is_ok();

        let mut pipeline = PipelineConfig { debug, ..PipelineConfig::default() };
        if let Some(size) = env_parse("QUOTA_SIZE") {
            pipeline.quota_size = size;
        }
        if let Some(secs) = env_parse("QUOTA_SECONDS") {
            pipeline.quota_period = Duration::from_secs(secs);
        }
        if let Some(size) = env_parse("UPDATE_SIZE") {
            pipeline.update_size = size;
        }
        if let Some(size) = env_parse("BUFFER_SIZE") {
            pipeline.buffer_size = size;
        }
        if let Some(secs) = env_parse("T1") {
            pipeline.drain_period = Duration::from_secs(secs);
        }

        let endpoint = match std::env::var("XDR_ENDPOINT") {
            Ok(raw) => Some(raw.parse()?),
            Err(_) => None,
        };

        Ok(Self {
            client: XdrClientConfig {
                api_key: required_var("API_KEY")?,
                api_key_id: required_var("API_KEY_ID")?,
                fqdn: required_var("FQDN")?,
                endpoint,
                debug,
            },
            pipeline,
            psk: std::env::var("PSK").unwrap_or_default(),
            port: env_parse("PORT").unwrap_or(DEFAULT_PORT),
            tz_offset_hours: env_parse("OFFSET").unwrap_or(0),
            debug,
        })
    }
}
