//! Normalized alert record forwarded to the XDR ingestion API.

use std::net::IpAddr;

use thiserror::Error;

/// Alert severity levels understood by the XDR ingestion API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    /// Informational event.
    Info,
    /// Low severity.
    Low,
    /// Medium severity.
    Medium,
    /// High severity.
    High,
    /// Severity could not be determined.
    #[default]
    Unknown,
}

impl Severity {
    /// Returns the string the XDR ingestion API expects for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "Informational",
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Unknown => "Unknown",
        }
    }
}

/// What the reporting device did with the offending traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    /// The device reported the event without intervening.
    #[default]
    Reported,
    /// The device blocked the traffic.
    Blocked,
}

impl Action {
    /// Returns the string the XDR ingestion API expects for this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Reported => "Reported",
            Action::Blocked => "Blocked",
        }
    }
}

/// Errors raised while populating the network fields of an [`Alert`].
#[derive(Debug, Error)]
pub enum NetDataError {
    /// The source address could not be parsed as an IP address.
    #[error("unable to parse source IP '{0}'")]
    InvalidSourceIp(String),

    /// The destination address could not be parsed as an IP address.
    #[error("unable to parse destination IP '{0}'")]
    InvalidDestinationIp(String),
}

/// A normalized security event record forwarded upstream.
///
/// Constructed by a parser, handed to the pipeline, consumed by an update.
#[derive(Debug, Clone, Default)]
pub struct Alert {
    /// Canonical textual form of the local (source) address.
    pub local_ip: String,
    /// Local (source) port.
    pub local_port: u16,
    /// Canonical textual form of the remote (destination) address.
    pub remote_ip: String,
    /// Remote (destination) port.
    pub remote_port: u16,
    /// Event time in milliseconds since the epoch.
    pub timestamp: i64,
    /// Severity reported by the device.
    pub severity: Severity,
    /// Short name of the triggering threat or rule.
    pub alert_name: String,
    /// Free-form description, may be empty.
    pub alert_description: String,
    /// What the device did with the traffic.
    pub action: Action,
    /// Product identifier of the reporting device.
    pub product: String,
    /// Vendor identifier of the reporting device.
    pub vendor: String,
}

impl Alert {
    /// Creates an alert with the given severity and event timestamp.
    pub fn new(severity: Severity, timestamp: i64) -> Self {
        Self { severity, timestamp, ..Default::default() }
    }

    /// Creates an alert with severity [`Severity::High`].
    pub fn high(timestamp: i64) -> Self {
        Self::new(Severity::High, timestamp)
    }

    /// Creates an alert with severity [`Severity::Low`].
    pub fn low(timestamp: i64) -> Self {
        Self::new(Severity::Low, timestamp)
    }

    /// Populates the network tuple, canonicalizing both addresses.
    ///
    /// Both IP fields and ports are reset first. On failure the error names
    /// the offending field and both IP fields stay cleared; on success both
    /// hold the canonical textual form (`::1`, not `0:0:0:0:0:0:0:1`).
    pub fn set_net_data(
        &mut self,
        src_ip: &str,
        dst_ip: &str,
        src_port: u16,
        dst_port: u16,
    ) -> Result<(), NetDataError> {
        self.local_ip.clear();
        self.remote_ip.clear();
        self.local_port = 0;
        self.remote_port = 0;
        let src: IpAddr = src_ip
            .parse()
            .map_err(|_| NetDataError::InvalidSourceIp(src_ip.to_string()))?;
        let dst: IpAddr = dst_ip
            .parse()
            .map_err(|_| NetDataError::InvalidDestinationIp(dst_ip.to_string()))?;
        self.local_ip = src.to_string();
        self.remote_ip = dst.to_string();
        self.local_port = src_port;
        self.remote_port = dst_port;
        Ok(())
    }

    /// Assigns name, description and action. No validation is performed.
    pub fn set_meta(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        action: Action,
    ) {
        self.alert_name = name.into();
        self.alert_description = description.into();
        self.action = action;
    }
}
