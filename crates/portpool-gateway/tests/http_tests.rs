// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway routes driven through the router against a temp registry.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use portpool_config::model::PortpoolConfig;
use portpool_gateway::{build_router, GatewayState};
use portpool_template::TemplateGenerator;
use portpool_test_utils::TestHarness;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app(harness: &TestHarness) -> Router {
    let generator =
        TemplateGenerator::with_provider(harness.mock_provider.clone(), &harness.config.generator);
    build_router(GatewayState::new(
        harness.storage.clone(),
        harness.parser,
        Arc::new(generator),
    ))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_text(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "text/plain")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

// --- Webhooks ---

#[tokio::test]
async fn structured_webhook_stores_canonical_message() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness);

    let (status, body) = send(
        &app,
        post_json(
            "/v1/sms/structured",
            json!({
                "sender": "+91 99887 76655",
                "recipient": "+91-98765-43210",
                "message": "Your OTP is 4521",
                "receivedAt": 1710505800000i64,
                "slotInfo": {"phoneNumber": "919876543210"}
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let stored = harness.storage.list_messages(10).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].receiver, "9876543210");
    assert_eq!(stored[0].sender, "9988776655");
    assert_eq!(stored[0].port, "9876543210");
    assert_eq!(stored[0].received_at.timestamp_millis(), 1710505800000);
}

#[tokio::test]
async fn structured_webhook_ignores_unrepresentable_time() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness
        .seed_service("acme", &["{otp} is your ACME code"])
        .await
        .unwrap();
    let app = app(&harness);

    // 10000-01-01T00:00:00Z in epoch milliseconds.
    let (status, _) = send(
        &app,
        post_json(
            "/v1/sms/structured",
            json!({
                "recipient": "919876543210",
                "message": "Your OTP is 1111",
                "receivedAt": 253402300800000i64
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        post_json(
            "/v1/sms/structured",
            json!({
                "recipient": "919876543210",
                "message": "4521 is your ACME code",
                "receivedAt": 1710505800000i64
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let stored = harness.storage.list_messages(10).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|m| m.received_at.timestamp_millis() < 253402300800000));

    let (status, body) = send(&app, get("/v1/numbers/9876543210/otp?service=acme")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["otp"], "4521");
}

#[tokio::test]
async fn structured_webhook_rejects_malformed_json() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness);

    let (status, body) = send(&app, post_text("/v1/sms/structured", "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("invalid JSON"));
    assert!(harness.storage.list_messages(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn raw_webhook_parses_labeled_lines() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness);

    let (status, body) = send(
        &app,
        post_text(
            "/v1/sms/raw",
            "Sender: VM-HDFC\nReceiver: \"8\" 919876543210\nSCTS: 240315123000\nYour OTP is 4521",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let stored = harness.storage.list_messages(10).await.unwrap();
    assert_eq!(stored[0].sender, "VM-HDFC");
    assert_eq!(stored[0].port, "8");
    assert_eq!(stored[0].receiver, "9876543210");
    assert_eq!(stored[0].text, "Your OTP is 4521");
    assert_eq!(stored[0].received_at.to_rfc3339(), "2024-03-15T12:30:00+00:00");
}

#[tokio::test]
async fn raw_webhook_empty_body_is_parse_error() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness);

    let (status, body) = send(&app, post_text("/v1/sms/raw", "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Parse error"}));
}

// --- Locks ---

#[tokio::test]
async fn unlock_one_number() {
    let harness = TestHarness::builder().build().await.unwrap();
    let record = harness.seed_numbers(&[9876543210]).await.unwrap().remove(0);
    let service = harness.seed_service("acme", &[]).await.unwrap();
    harness.lock(record.id, service.id).await.unwrap();
    let app = app(&harness);

    let (status, body) = send(&app, post_json("/v1/locks/unlock", json!({"id": record.id}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unlockedCount"], 1);
    assert!(!harness.storage.get_number(record.id).await.unwrap().unwrap().locked);

    // Already unlocked is still a success.
    let (status, body) = send(&app, post_json("/v1/locks/unlock", json!({"id": record.id}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unlockedCount"], 0);
}

#[tokio::test]
async fn unlock_one_errors() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness);

    let (status, body) = send(&app, post_json("/v1/locks/unlock", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Number id is required");

    let (status, _) = send(&app, post_json("/v1/locks/unlock", json!({"id": 4242}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, post_text("/v1/locks/unlock", "id=1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn unlock_all_for_service() {
    let harness = TestHarness::builder().build().await.unwrap();
    let records = harness
        .seed_numbers(&[9876543210, 9000000001, 9000000002])
        .await
        .unwrap();
    let acme = harness.seed_service("acme", &[]).await.unwrap();
    let other = harness.seed_service("other", &[]).await.unwrap();
    harness.lock(records[0].id, acme.id).await.unwrap();
    harness.lock(records[1].id, acme.id).await.unwrap();
    harness.lock(records[2].id, other.id).await.unwrap();
    let app = app(&harness);

    let (status, body) =
        send(&app, post_json("/v1/locks/unlock-all", json!({"service": "acme"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unlockedCount"], 2);
    assert_eq!(
        body["message"],
        "Successfully unlocked 2 locks for service: acme"
    );
    assert!(harness.storage.get_number(records[2].id).await.unwrap().unwrap().locked);

    // Nothing left to release.
    let (status, _) =
        send(&app, post_json("/v1/locks/unlock-all", json!({"service": "acme"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unlock_all_errors() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness);

    let (status, body) = send(&app, post_json("/v1/locks/unlock-all", json!({"service": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Service name is required");

    let (status, body) =
        send(&app, post_json("/v1/locks/unlock-all", json!({"service": "ghost"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "service not found: ghost");
}

// --- Template generation ---

#[tokio::test]
async fn generate_accepts_after_feedback() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![
            "Your code is 4521".to_string(),
            "\"Your code is {otp}\"".to_string(),
        ])
        .build()
        .await
        .unwrap();
    let app = app(&harness);

    let (status, body) = send(
        &app,
        post_json("/v1/templates/generate", json!({"smsText": "Your code is 4521"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["template"], "Your code is {otp}");
    assert_eq!(body["extractedOtp"], "4521");
    assert_eq!(body["attempts"], 2);
    assert_eq!(body["success"], true);
    assert_eq!(harness.mock_provider.requests().await.len(), 2);
}

#[tokio::test]
async fn generate_exhaustion_returns_remediation() {
    let mut config = PortpoolConfig::default();
    config.generator.max_attempts = 2;
    let harness = TestHarness::builder()
        .with_config(config)
        .with_mock_responses(vec!["{otp} is OTP #{otp}".to_string(); 2])
        .build()
        .await
        .unwrap();
    let app = app(&harness);

    let (status, body) = send(
        &app,
        post_json(
            "/v1/templates/generate",
            json!({"smsText": "5672 is OTP #5672"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Failed to generate valid template after 2 attempts");
    assert!(body["details"].as_str().unwrap().contains("multiple {otp}"));
    assert_eq!(body["category"], "duplicate_placeholder");
    assert!(body["assistantExplanation"].is_string());
    assert!(body["supportContact"].is_string());
}

#[tokio::test]
async fn generate_requires_sms_text() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness);

    let (status, body) = send(&app, post_json("/v1/templates/generate", json!({"smsText": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "SMS text is required");
    assert!(harness.mock_provider.requests().await.is_empty());
}

#[tokio::test]
async fn generate_provider_failure_is_internal_error() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness
        .mock_provider
        .add_failure("upstream unavailable".to_string())
        .await;
    let app = app(&harness);

    let (status, body) = send(
        &app,
        post_json("/v1/templates/generate", json!({"smsText": "Your OTP is 4521"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
}

// --- OTP lookup ---

async fn post_raw(app: &Router, receiver: &str, scts: &str, text: &str) {
    let body = format!("Sender: VM-ACME\nReceiver: \"1\" {receiver}\nSCTS: {scts}\n{text}");
    let (status, _) = send(app, post_text("/v1/sms/raw", &body)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn otp_lookup_returns_newest_match() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness
        .seed_service("acme", &["Your ACME code is {otp}", "{otp} is your ACME code"])
        .await
        .unwrap();
    let app = app(&harness);

    post_raw(&app, "919876543210", "240315120000", "Your ACME code is 1111").await;
    post_raw(&app, "919876543210", "240315121500", "2222 is your ACME code").await;
    post_raw(&app, "919876543210", "240315123000", "Unrelated promo 3333").await;
    post_raw(&app, "919000000001", "240315124500", "Your ACME code is 9999").await;

    let (status, body) = send(&app, get("/v1/numbers/+91%209876543210/otp?service=acme")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["number"], "9876543210");
    assert_eq!(body["otp"], "2222");
    assert_eq!(body["service"], "acme");
    assert_eq!(body["sender"], "VM-ACME");

    // A lower bound past the match leaves nothing to extract.
    let (status, _) = send(
        &app,
        get("/v1/numbers/9876543210/otp?service=acme&since=2024-03-15T12:20:00Z"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn otp_lookup_errors() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness);

    let (status, body) = send(&app, get("/v1/numbers/9876543210/otp")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Service name is required");

    let (status, _) = send(&app, get("/v1/numbers/not-a-number/otp?service=acme")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, get("/v1/numbers/9876543210/otp?service=ghost")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "service not found: ghost");

    let (status, _) = send(
        &app,
        get("/v1/numbers/9876543210/otp?service=acme&since=yesterday"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// --- Health ---

#[tokio::test]
async fn health_reports_version() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness);

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["uptime_secs"].is_u64());
}
