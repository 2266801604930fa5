//! Wire-format projection of alerts for the `insert_parsed_alerts` endpoint.

use serde::Serialize;

use super::alert::Alert;

/// JSON projection of an [`Alert`] with the field names fixed by the
/// ingestion API. Empty severity, description and action strings are
/// omitted from the serialized record.
#[derive(Debug, Clone, Serialize)]
pub struct WireAlert {
    product: String,
    vendor: String,
    local_ip: String,
    local_port: u16,
    remote_ip: String,
    remote_port: u16,
    event_timestamp: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    severity: String,
    alert_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    alert_description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    action_status: String,
}

impl From<&Alert> for WireAlert {
    fn from(alert: &Alert) -> Self {
        Self {
            product: alert.product.clone(),
            vendor: alert.vendor.clone(),
            local_ip: alert.local_ip.clone(),
            local_port: alert.local_port,
            remote_ip: alert.remote_ip.clone(),
            remote_port: alert.remote_port,
            event_timestamp: alert.timestamp,
            severity: alert.severity.as_str().to_string(),
            alert_name: alert.alert_name.clone(),
            alert_description: alert.alert_description.clone(),
            action_status: alert.action.as_str().to_string(),
        }
    }
}

/// Envelope POSTed to the ingestion endpoint:
/// `{ "request_data": { "alerts": [ ... ] } }`.
#[derive(Debug, Serialize)]
pub struct InsertPayload {
    request_data: RequestData,
}

#[derive(Debug, Serialize)]
struct RequestData {
    alerts: Vec<WireAlert>,
}

impl InsertPayload {
    /// Wraps a batch of wire alerts in the request envelope.
    pub fn new(alerts: Vec<WireAlert>) -> Self {
        Self { request_data: RequestData { alerts } }
    }
}
