//! Parser for alerts pushed by PAN-OS devices via HTTP Log Forwarding.

use chrono::{FixedOffset, NaiveDateTime};
use serde::Deserialize;

use super::{AlertParser, ParseError};
use crate::models::{Action, Alert, Severity};

/// Layout of the `time_generated` field.
const TS_LAYOUT: &str = "%Y/%m/%d %H:%M:%S";

/// Separator between the JSON part of the payload and the free-form annex.
const ANNEX_SEPARATOR: &str = "---annex---";

const PAYLOAD_LAYOUT: &[u8] = br#"{
	"src": "$src",
	"sport": $sport,
	"dst": "$dst",
	"dport": $dport,
	"time_generated": "$time_generated",
	"rule": "$rule",
	"serial": "$serial",
	"sender_sw_version": "$sender_sw_version",
	"subtype": "$subtype",
	"threat_name": "$threat_name",
	"severity": "$severity",
	"action": "$action"
}
---annex---
$misc
"#;

/// JSON part of the PAN-OS payload. Absent fields default to empty.
#[derive(Debug, Default, Deserialize)]
struct PanOsEvent {
    #[serde(default)]
    src: String,
    #[serde(default)]
    sport: u16,
    #[serde(default)]
    dst: String,
    #[serde(default)]
    dport: u16,
    #[serde(default)]
    time_generated: String,
    #[serde(default)]
    rule: String,
    #[serde(default)]
    serial: String,
    #[serde(default)]
    sender_sw_version: String,
    #[serde(default)]
    subtype: String,
    #[serde(default)]
    threat_name: String,
    #[serde(default)]
    severity: String,
    #[serde(default)]
    action: String,
}

/// Parser for the PAN-OS HTTP Log Forwarding payload format.
pub struct PanOsParser {
    tz: FixedOffset,
    product: &'static str,
    vendor: &'static str,
    debug: bool,
}

impl PanOsParser {
    /// Creates a parser interpreting device timestamps in a zone
    /// `offset_hours` ahead of UTC (negative values supported). Offsets
    /// outside the valid range fall back to UTC.
    pub fn new(offset_hours: i32, debug: bool) -> Self {
        let tz = FixedOffset::east_opt(offset_hours.saturating_mul(3600))
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is a valid zone"));
        Self {
            tz,
            product: "PAN-OS",
            vendor: "Palo Alto Networks",
            debug,
        }
    }

    fn map_severity(raw: &str) -> Severity {
        match raw {
            "critical" | "high" => Severity::High,
            "medium" => Severity::Medium,
            "informational" => Severity::Info,
            "low" => Severity::Low,
            _ => Severity::Unknown,
        }
    }

    fn map_action(raw: &str) -> Action {
        match raw {
            "alert" | "allow" => Action::Reported,
            _ => Action::Blocked,
        }
    }
}

impl AlertParser for PanOsParser {
    fn parse(&self, data: &[u8]) -> Result<Alert, ParseError> {
        let text = String::from_utf8_lossy(data);
        if self.debug {
            let glimpse: String = text.chars().take(100).collect();
            tracing::debug!(payload = %glimpse, "parsing device payload");
        }
        let (json_part, annex) = match text.split_once(ANNEX_SEPARATOR) {
            Some((head, tail)) => (head, Some(tail)),
            None => (text.as_ref(), None),
        };
        let event: PanOsEvent = serde_json::from_str(json_part)?;
        let misc = annex
            .map(|raw| raw.trim_matches(&['\n', '"'][..]).to_string())
            .unwrap_or_default();

        let generated = NaiveDateTime::parse_from_str(&event.time_generated, TS_LAYOUT)?;
        let timestamp = (generated - self.tz).and_utc().timestamp_millis();

        let mut alert = Alert::new(Self::map_severity(&event.severity), timestamp);
        alert.product = self.product.to_string();
        alert.vendor = self.vendor.to_string();
        alert.set_net_data(&event.src, &event.dst, event.sport, event.dport)?;

        // Description folds the annex and the remaining device context into
        // a single `;`-joined field; the annex slot is always present.
        let mut description = vec![misc];
        if !event.serial.is_empty() {
            description.push(format!("serial={}", event.serial));
        }
        if !event.sender_sw_version.is_empty() {
            description.push(format!("version={}", event.sender_sw_version));
        }
        if !event.action.is_empty() {
            description.push(format!("action={}", event.action));
        }
        if !event.rule.is_empty() {
            description.push(format!("rule={}", event.rule));
        }
        if !event.subtype.is_empty() {
            description.push(format!("type={}", event.subtype));
        }
        alert.set_meta(
            event.threat_name,
            description.join(";"),
            Self::map_action(&event.action),
        );
        Ok(alert)
    }

    fn payload_layout(&self) -> &[u8] {
        PAYLOAD_LAYOUT
    }
}
