//! Request handlers for the ingestion surface.

use std::sync::atomic::Ordering;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Json};
use serde_json::json;

use super::ApiState;

/// Compares the `Authorization` header byte-exact against the PSK.
///
/// An absent header counts as an empty value, so an empty PSK accepts
/// requests that carry no header at all.
fn psk_ok(state: &ApiState, headers: &HeaderMap) -> bool {
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if provided == state.psk {
        true
    } else {
        state.ingest_stats.psk_errors.fetch_add(1, Ordering::Relaxed);
        false
    }
}

/// Liveness probe.
pub(super) async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Device alert ingestion.
///
/// Always answers 200 with an empty body, so the sender never learns
/// whether a payload was accepted; outcomes are visible only in the
/// counters.
pub(super) async fn ingest(
    State(state): State<ApiState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    state.ingest_stats.events_received.fetch_add(1, Ordering::Relaxed);
    if !psk_ok(&state, &headers) {
        tracing::warn!("ingestion request rejected: invalid PSK");
        return StatusCode::OK;
    }
    if method != Method::POST {
        state.ingest_stats.parse_errors.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(%method, "ingestion request rejected: non-POST request");
        return StatusCode::OK;
    }
    match state.parser.parse(&body) {
        Ok(alert) => {
            if state.debug {
                tracing::debug!(name = %alert.alert_name, "alert parsed");
            }
            state.pipeline.ingest(alert);
        }
        Err(err) => {
            state.ingest_stats.parse_errors.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(error = %err, "unparseable alert payload");
        }
    }
    StatusCode::OK
}

/// Dumps the parser payload layout hint. Empty response on PSK mismatch.
pub(super) async fn payload_hint(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Vec<u8> {
    if psk_ok(&state, &headers) {
        state.parser.payload_layout().to_vec()
    } else {
        Vec::new()
    }
}

/// Dumps the aggregated runtime statistics. Empty response on PSK
/// mismatch.
pub(super) async fn stats(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> axum::response::Response {
    if psk_ok(&state, &headers) {
        Json(state.stats.snapshot()).into_response()
    } else {
        StatusCode::OK.into_response()
    }
}
