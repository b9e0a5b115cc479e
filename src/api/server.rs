//! HTTP surface of the sentiment gateway
//!
//! Routes form-encoded submissions to the gateway and ledger, proxies
//! version lookups, and exposes the metrics registry as text exposition.
//! A timing middleware maintains the in-flight gauge and per-request
//! counter/latency families for every route.

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::gateway::{Gateway, PredictionResponse};
use crate::ledger::PredictionLedger;
use crate::metrics::{self, labels, names, MetricsRegistry};
use crate::services::model::ModelClient;
use crate::types::{FlagReason, PredictionId, Sentiment, UserFeedback};
use axum::{
    extract::{Form, Request, State},
    http::header,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub metrics: Arc<MetricsRegistry>,
}

/// Gateway HTTP server
pub struct GatewayServer {
    config: GatewayConfig,
    state: AppState,
}

impl GatewayServer {
    /// Wire up the model client, ledger, and metrics registry
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let metrics = Arc::new(metrics::gateway_registry());
        let ledger = Arc::new(PredictionLedger::new(
            metrics.clone(),
            config.version_tag.clone(),
        ));
        let model = ModelClient::new(&config)?;
        let gateway = Arc::new(Gateway::new(
            model,
            ledger,
            metrics.clone(),
            config.version_tag.clone(),
        ));

        Ok(Self {
            config,
            state: AppState { gateway, metrics },
        })
    }

    /// Shared state, for driving handlers without a socket
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the service router
    pub fn router(&self) -> Router {
        let state = self.state.clone();
        Router::new()
            .route("/sentiment", post(sentiment_handler))
            .route("/feedback", post(feedback_handler))
            .route("/flag", post(flag_handler))
            .route("/version", get(version_handler))
            .route("/version/modelversion", get(model_version_handler))
            .route("/check_health", get(check_health_handler))
            .route("/metrics", get(metrics_handler))
            .with_state(state.clone())
            .layer(middleware::from_fn_with_state(state, track_metrics))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Bind and serve until the process is stopped
    pub async fn serve(self) -> anyhow::Result<()> {
        let router = self.router();
        let listener = tokio::net::TcpListener::bind(self.config.addr).await?;
        info!("sentiment gateway listening on http://{}", self.config.addr);
        info!("model service at {}", self.config.model_url);
        axum::serve(listener, router).await?;
        Ok(())
    }
}

/// Track in-flight requests, counts, and latency for every route
async fn track_metrics(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    state.metrics.inc_gauge(names::IN_FLIGHT_REQUESTS);
    let response = next.run(request).await;
    state.metrics.dec_gauge(names::IN_FLIGHT_REQUESTS);

    let status = response.status().as_u16().to_string();
    let request_labels = labels(&[
        ("method", &method),
        ("endpoint", &path),
        ("status", &status),
    ]);
    state
        .metrics
        .inc_counter(names::HTTP_REQUESTS_TOTAL, request_labels.clone());
    state.metrics.observe(
        names::HTTP_REQUEST_DURATION_SECONDS,
        request_labels,
        start.elapsed().as_secs_f64(),
    );

    response
}

#[derive(Debug, Deserialize)]
struct SentimentRequest {
    #[serde(default)]
    text: String,
}

async fn sentiment_handler(
    State(state): State<AppState>,
    Form(request): Form<SentimentRequest>,
) -> Result<Json<PredictionResponse>> {
    let response = state.gateway.predict(&request.text).await?;
    Ok(Json(response))
}

/// Acknowledgement for feedback and flag submissions
#[derive(Debug, Serialize)]
struct AckResponse {
    success: bool,
    message: String,
}

impl AckResponse {
    fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeedbackRequest {
    prediction_id: String,
    feedback: Option<UserFeedback>,
    correction: Option<Sentiment>,
}

async fn feedback_handler(
    State(state): State<AppState>,
    Form(request): Form<FeedbackRequest>,
) -> Result<Json<AckResponse>> {
    let id = PredictionId::from_string(&request.prediction_id)
        .map_err(|_| GatewayError::UnknownPrediction(request.prediction_id.clone()))?;

    state
        .gateway
        .submit_feedback(id, request.feedback, request.correction)
        .await?;

    Ok(Json(AckResponse::ok("Feedback recorded")))
}

#[derive(Debug, Deserialize)]
struct FlagRequest {
    prediction_id: String,
    #[serde(default)]
    reason: FlagReason,
}

async fn flag_handler(
    State(state): State<AppState>,
    Form(request): Form<FlagRequest>,
) -> Result<Json<AckResponse>> {
    let id = PredictionId::from_string(&request.prediction_id)
        .map_err(|_| GatewayError::UnknownPrediction(request.prediction_id.clone()))?;

    state.gateway.submit_flag(id, request.reason).await?;

    Ok(Json(AckResponse::ok("Prediction flagged")))
}

#[derive(Debug, Serialize)]
struct VersionResponse {
    app_version: String,
}

async fn version_handler() -> Json<VersionResponse> {
    Json(VersionResponse {
        app_version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Serialize)]
struct ModelVersionResponse {
    model_service_version: String,
}

/// Proxy the model service version string
async fn model_version_handler(
    State(state): State<AppState>,
) -> Result<Json<ModelVersionResponse>> {
    let version = state.gateway.model_version().await?;
    Ok(Json(ModelVersionResponse {
        model_service_version: version,
    }))
}

async fn check_health_handler() -> &'static str {
    "OK"
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.metrics.render(),
    )
        .into_response()
}
