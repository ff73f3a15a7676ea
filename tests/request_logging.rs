//! End-to-end tests: real server, real client, in-memory sink.

use request_logger::config::AppConfig;
use request_logger::http::{BodyValue, Outcome};
use serde_json::json;

mod common;

#[tokio::test]
async fn test_get_item_is_logged() {
    let server = common::start_server().await;

    let res = common::client()
        .get(server.url("/items?id=5"))
        .send()
        .await
        .expect("server unreachable");
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({"ok": true, "id": 5}));

    let entries = server.sink.wait_for_entries(1).await;
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.request.method, "GET");
    assert_eq!(entry.request.path, "/items?id=5");
    assert_eq!(entry.request.ip, "127.0.0.1");
    assert_eq!(entry.response.status, Outcome::Successful);
    assert_eq!(entry.response.status_code, 200);
    assert_eq!(
        entry.response.body,
        Some(BodyValue::Json(json!({"ok": true, "id": 5})))
    );

    let elapsed = entry.response.elapsed.strip_suffix('s').unwrap();
    assert_eq!(elapsed.split('.').nth(1).unwrap().len(), 4);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_client_error_is_failed_outcome() {
    let server = common::start_server().await;

    let res = common::client().get(server.url("/items")).send().await.unwrap();
    assert_eq!(res.status(), 400);
    res.bytes().await.unwrap();

    let entries = server.sink.wait_for_entries(1).await;
    assert_eq!(entries[0].response.status, Outcome::Failed);
    assert_eq!(entries[0].response.status_code, 400);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_echo_logs_request_and_response_bodies() {
    let server = common::start_server().await;
    let payload = json!({"name": "widget", "tags": ["a", "b"]});

    let res = common::client()
        .post(server.url("/echo"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let echoed: serde_json::Value = res.json().await.unwrap();
    assert_eq!(echoed, payload);

    let entries = server.sink.wait_for_entries(1).await;
    assert_eq!(entries[0].request.method, "POST");
    assert_eq!(entries[0].request.body, Some(payload.clone()));
    assert_eq!(entries[0].response.body, Some(BodyValue::Json(payload)));

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_text_response_delivered_unchanged() {
    let server = common::start_server().await;

    let res = common::client().get(server.url("/text")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "plain text response");

    let entries = server.sink.wait_for_entries(1).await;
    assert_eq!(
        entries[0].response.body,
        Some(BodyValue::Text("plain text response".into()))
    );

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_head_request_logged_once() {
    let server = common::start_server().await;

    let res = common::client().head(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    let entries = server.sink.wait_for_entries(1).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].request.method, "HEAD");

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_handler_panic_logged_and_propagated() {
    let server = common::start_server().await;

    let res = common::client().get(server.url("/fail")).send().await.unwrap();
    assert_eq!(res.status(), 500);

    let failures = server.sink.failures.lock().unwrap().clone();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, "handler_error");
    assert_eq!(failures[0].method, "GET");
    assert_eq!(failures[0].path, "/fail");
    assert_eq!(failures[0].reason, "simulated handler failure");
    assert!(server.sink.entries.lock().unwrap().is_empty());

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_fail_route_absent_outside_debug() {
    let mut config = AppConfig::default();
    config.app.debug = false;
    let server = common::start_server_with(config).await;

    let res = common::client().get(server.url("/fail")).send().await.unwrap();
    assert_eq!(res.status(), 404);
    res.bytes().await.unwrap();

    let entries = server.sink.wait_for_entries(1).await;
    assert_eq!(entries[0].response.status_code, 404);
    assert_eq!(entries[0].response.status, Outcome::Failed);
    assert!(server.sink.failures.lock().unwrap().is_empty());

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_one_entry_per_concurrent_request() {
    let server = common::start_server().await;
    let client = common::client();

    let mut handles = Vec::new();
    for i in 0..20 {
        let client = client.clone();
        let url = server.url(&format!("/items?id={}", i));
        handles.push(tokio::spawn(async move {
            client.get(url).send().await.unwrap().bytes().await.unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let entries = server.sink.wait_for_entries(20).await;
    assert_eq!(entries.len(), 20);
    for entry in &entries {
        let id: u64 = entry.request.path.trim_start_matches("/items?id=").parse().unwrap();
        assert_eq!(
            entry.response.body,
            Some(BodyValue::Json(json!({"ok": true, "id": id})))
        );
    }

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_request_body_logged_when_extractor_rejects() {
    let server = common::start_server().await;

    let res = common::client()
        .post(server.url("/echo"))
        .body(r#"{"name":"widget"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 415);
    res.bytes().await.unwrap();

    let entries = server.sink.wait_for_entries(1).await;
    assert_eq!(entries[0].request.body, Some(json!({"name": "widget"})));
    assert_eq!(entries[0].response.status, Outcome::Failed);
    assert_eq!(entries[0].response.status_code, 415);

    server.shutdown.trigger();
}
