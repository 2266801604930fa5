//! Integration tests for the device-facing ingestion surface.

mod common;

use common::{valid_payload, TestServer};
use reqwest::header::AUTHORIZATION;

#[tokio::test]
async fn ingest_accepts_a_valid_alert() {
    let server = TestServer::spawn("secret").await;

    let response = server
        .client
        .post(server.url("/in"))
        .header(AUTHORIZATION, "secret")
        .body(valid_payload())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(response.bytes().await.unwrap().is_empty());

    let stats = server
        .client
        .get(server.url("/stats"))
        .header(AUTHORIZATION, "secret")
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    assert_eq!(stats["events_received"], 1);
    assert_eq!(stats["parse_errors"], 0);
    assert_eq!(stats["psk_errors"], 0);

    // The alert reached the pipeline queue: nothing was emitted yet, so
    // closing accounts it as a residual discard.
    assert!(server.forwarder.batches().is_empty());
    let drained = server.pipeline.close().await;
    assert_eq!(drained.discards, 1);

    server.cleanup().await;
}

#[tokio::test]
async fn ingest_rejects_a_bad_psk_with_200() {
    let server = TestServer::spawn("secret").await;

    let response = server
        .client
        .post(server.url("/in"))
        .header(AUTHORIZATION, "wrong")
        .body(valid_payload())
        .send()
        .await
        .unwrap();

    // The sender never learns the payload was rejected.
    assert_eq!(response.status(), 200);
    assert!(response.bytes().await.unwrap().is_empty());

    let stats = server
        .client
        .get(server.url("/stats"))
        .header(AUTHORIZATION, "secret")
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    assert_eq!(stats["events_received"], 1);
    assert_eq!(stats["psk_errors"], 1);
    assert_eq!(stats["parse_errors"], 0);

    server.cleanup().await;
}

#[tokio::test]
async fn ingest_counts_non_post_requests_as_parse_errors() {
    let server = TestServer::spawn("secret").await;

    let response = server
        .client
        .get(server.url("/in"))
        .header(AUTHORIZATION, "secret")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);

    let stats = server
        .client
        .get(server.url("/stats"))
        .header(AUTHORIZATION, "secret")
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    assert_eq!(stats["parse_errors"], 1);

    server.cleanup().await;
}

#[tokio::test]
async fn ingest_counts_unparseable_payloads() {
    let server = TestServer::spawn("secret").await;

    let response = server
        .client
        .post(server.url("/in"))
        .header(AUTHORIZATION, "secret")
        .body("definitely not a PAN-OS payload")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);

    let stats = server
        .client
        .get(server.url("/stats"))
        .header(AUTHORIZATION, "secret")
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    assert_eq!(stats["events_received"], 1);
    assert_eq!(stats["parse_errors"], 1);

    server.cleanup().await;
}

#[tokio::test]
async fn empty_psk_accepts_requests_without_authorization() {
    let server = TestServer::spawn("").await;

    let response = server
        .client
        .post(server.url("/in"))
        .body(valid_payload())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);

    let stats = server
        .client
        .get(server.url("/stats"))
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    assert_eq!(stats["events_received"], 1);
    assert_eq!(stats["psk_errors"], 0);
    assert_eq!(stats["parse_errors"], 0);

    server.cleanup().await;
}

#[tokio::test]
async fn dump_returns_the_payload_layout_only_with_the_psk() {
    let server = TestServer::spawn("secret").await;

    let hint = server
        .client
        .get(server.url("/dump"))
        .header(AUTHORIZATION, "secret")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(hint.contains("$time_generated"));

    let denied = server
        .client
        .get(server.url("/dump"))
        .header(AUTHORIZATION, "wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(denied.status(), 200);
    assert!(denied.bytes().await.unwrap().is_empty());

    server.cleanup().await;
}

#[tokio::test]
async fn stats_body_is_empty_on_psk_mismatch() {
    let server = TestServer::spawn("secret").await;

    let denied = server.client.get(server.url("/stats")).send().await.unwrap();

    assert_eq!(denied.status(), 200);
    assert!(denied.bytes().await.unwrap().is_empty());

    server.cleanup().await;
}

#[tokio::test]
async fn health_needs_no_psk() {
    let server = TestServer::spawn("secret").await;

    let response = server.client.get(server.url("/health")).send().await.unwrap();

    assert_eq!(response.status(), 200);
    let body = response.json::<serde_json::Value>().await.unwrap();
    assert_eq!(body["status"], "ok");

    server.cleanup().await;
}
