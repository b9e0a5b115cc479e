//! End-to-end tests for the gateway HTTP surface
//!
//! Each test spins up a stub model service and a gateway on ephemeral
//! ports and drives them over real sockets.

use axum::{http::StatusCode, routing::get, Json, Router};
use pathos_core::{GatewayConfig, GatewayServer};
use serde_json::{json, Value};
use std::time::Duration;

/// Bind a router on an ephemeral port and return its base URL
async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn spawn_gateway(model_url: &str) -> String {
    let config = GatewayConfig {
        model_url: model_url.to_string(),
        model_timeout: Duration::from_millis(500),
        version_tag: "test".to_string(),
        ..GatewayConfig::default()
    };
    let server = GatewayServer::new(config).unwrap();
    spawn(server.router()).await
}

/// Stub model service that classifies everything as confidently positive
fn happy_model() -> Router {
    Router::new()
        .route(
            "/predict",
            get(|| async { Json(json!({"sentiment": 1, "confidence": 0.9})) }),
        )
        .route(
            "/version",
            get(|| async { Json(json!({"service_version": "1.0.0"})) }),
        )
}

/// Base URL of a port with nothing listening on it
fn dead_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn test_predict_then_feedback_roundtrip() {
    let model = spawn(happy_model()).await;
    let gateway = spawn_gateway(&model).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/sentiment", gateway))
        .form(&[("text", "I love this")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["sentiment"], 1);
    assert_eq!(body["confidence"], 0.9);
    let prediction_id = body["prediction_id"].as_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&prediction_id).is_ok());

    let response = client
        .post(format!("{}/feedback", gateway))
        .form(&[
            ("prediction_id", prediction_id.as_str()),
            ("feedback", "correct"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_prediction_ids_are_unique() {
    let model = spawn(happy_model()).await;
    let gateway = spawn_gateway(&model).await;
    let client = reqwest::Client::new();

    let mut seen = std::collections::HashSet::new();
    for _ in 0..5 {
        let body: Value = client
            .post(format!("{}/sentiment", gateway))
            .form(&[("text", "again")])
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(seen.insert(body["prediction_id"].as_str().unwrap().to_string()));
    }
}

#[tokio::test]
async fn test_missing_confidence_defaults() {
    let model = spawn(Router::new().route(
        "/predict",
        get(|| async { Json(json!({"sentiment": 0})) }),
    ))
    .await;
    let gateway = spawn_gateway(&model).await;

    let body: Value = reqwest::Client::new()
        .post(format!("{}/sentiment", gateway))
        .form(&[("text", "no idea")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["sentiment"], 0);
    assert_eq!(body["confidence"], 0.5);
}

#[tokio::test]
async fn test_warning_and_debug_info_passthrough() {
    let model = spawn(Router::new().route(
        "/predict",
        get(|| async {
            Json(json!({
                "sentiment": 1,
                "confidence": 0.6,
                "warning": "2 tokens out of vocabulary",
                "debug_info": {"tokens": 7}
            }))
        }),
    ))
    .await;
    let gateway = spawn_gateway(&model).await;

    let body: Value = reqwest::Client::new()
        .post(format!("{}/sentiment", gateway))
        .form(&[("text", "zxqv frobnicate")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["warning"], "2 tokens out of vocabulary");
    assert_eq!(body["debug_info"]["tokens"], 7);
}

#[tokio::test]
async fn test_upstream_error_maps_to_500() {
    let model = spawn(Router::new().route(
        "/predict",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    ))
    .await;
    let gateway = spawn_gateway(&model).await;

    let response = reqwest::Client::new()
        .post(format!("{}/sentiment", gateway))
        .form(&[("text", "hello")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 500);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Model service error");
}

#[tokio::test]
async fn test_unreachable_model_maps_to_503() {
    let gateway = spawn_gateway(&dead_url()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/sentiment", gateway))
        .form(&[("text", "hello")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 503);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Model service unavailable");
    assert_eq!(body["retryable"], true);
}

#[tokio::test]
async fn test_embedded_error_maps_to_500() {
    let model = spawn(Router::new().route(
        "/predict",
        get(|| async { Json(json!({"error": "vectorizer not fitted"})) }),
    ))
    .await;
    let gateway = spawn_gateway(&model).await;

    let response = reqwest::Client::new()
        .post(format!("{}/sentiment", gateway))
        .form(&[("text", "hello")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 500);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Prediction failed");
}

#[tokio::test]
async fn test_empty_text_rejected() {
    let model = spawn(happy_model()).await;
    let gateway = spawn_gateway(&model).await;

    let response = reqwest::Client::new()
        .post(format!("{}/sentiment", gateway))
        .form(&[("text", "   ")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn test_flag_unknown_id_maps_to_400() {
    let model = spawn(happy_model()).await;
    let gateway = spawn_gateway(&model).await;

    let response = reqwest::Client::new()
        .post(format!("{}/flag", gateway))
        .form(&[
            ("prediction_id", uuid::Uuid::new_v4().to_string().as_str()),
            ("reason", "other"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid prediction ID");
}

#[tokio::test]
async fn test_feedback_unknown_id_maps_to_400() {
    let model = spawn(happy_model()).await;
    let gateway = spawn_gateway(&model).await;

    let response = reqwest::Client::new()
        .post(format!("{}/feedback", gateway))
        .form(&[
            ("prediction_id", uuid::Uuid::new_v4().to_string().as_str()),
            ("feedback", "incorrect"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid prediction ID");
}

#[tokio::test]
async fn test_unknown_flag_reason_degrades_to_other() {
    let model = spawn(happy_model()).await;
    let gateway = spawn_gateway(&model).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{}/sentiment", gateway))
        .form(&[("text", "meh")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let prediction_id = body["prediction_id"].as_str().unwrap().to_string();

    let response = client
        .post(format!("{}/flag", gateway))
        .form(&[("prediction_id", prediction_id.as_str()), ("reason", "spam")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let metrics = client
        .get(format!("{}/metrics", gateway))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains("flags_total{reason=\"other\",version=\"test\"} 1"));
}

#[tokio::test]
async fn test_correction_metrics_only_on_differing_label() {
    let model = spawn(happy_model()).await;
    let gateway = spawn_gateway(&model).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{}/sentiment", gateway))
        .form(&[("text", "I love this")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let prediction_id = body["prediction_id"].as_str().unwrap().to_string();

    // Correction equal to the original label must not count.
    client
        .post(format!("{}/feedback", gateway))
        .form(&[
            ("prediction_id", prediction_id.as_str()),
            ("feedback", "correct"),
            ("correction", "1"),
        ])
        .send()
        .await
        .unwrap();

    let metrics = client
        .get(format!("{}/metrics", gateway))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!metrics.contains("corrections_total{"));

    // A differing correction counts.
    client
        .post(format!("{}/feedback", gateway))
        .form(&[
            ("prediction_id", prediction_id.as_str()),
            ("feedback", "incorrect"),
            ("correction", "0"),
        ])
        .send()
        .await
        .unwrap();

    let metrics = client
        .get(format!("{}/metrics", gateway))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains(
        "corrections_total{corrected=\"negative\",original=\"positive\",version=\"test\"} 1"
    ));
}

#[tokio::test]
async fn test_version_endpoints() {
    let model = spawn(happy_model()).await;
    let gateway = spawn_gateway(&model).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(format!("{}/version", gateway))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["app_version"], env!("CARGO_PKG_VERSION"));

    let body: Value = client
        .get(format!("{}/version/modelversion", gateway))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["model_service_version"], "1.0.0");
}

#[tokio::test]
async fn test_model_version_unreachable_maps_to_503() {
    let gateway = spawn_gateway(&dead_url()).await;

    let response = reqwest::Client::new()
        .get(format!("{}/version/modelversion", gateway))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 503);
}

#[tokio::test]
async fn test_check_health() {
    let model = spawn(happy_model()).await;
    let gateway = spawn_gateway(&model).await;

    let response = reqwest::Client::new()
        .get(format!("{}/check_health", gateway))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_request_metrics_recorded() {
    let model = spawn(happy_model()).await;
    let gateway = spawn_gateway(&model).await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/sentiment", gateway))
        .form(&[("text", "great")])
        .send()
        .await
        .unwrap();

    let metrics = client
        .get(format!("{}/metrics", gateway))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(metrics.contains("# TYPE http_requests_total counter"));
    assert!(metrics.contains(
        "http_requests_total{endpoint=\"/sentiment\",method=\"POST\",status=\"200\"} 1"
    ));
    assert!(metrics.contains("# TYPE in_flight_requests gauge"));
    // The scrape request itself is the only one in flight.
    assert!(metrics.contains("in_flight_requests 1"));
    assert!(metrics.contains("# TYPE http_request_duration_seconds histogram"));
    assert!(metrics
        .contains("predictions_total{outcome=\"success\",version=\"test\"} 1"));
    assert!(metrics.contains("prediction_confidence_bucket"));
}
