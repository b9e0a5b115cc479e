//! Error types for the sentiment gateway
//!
//! This module provides structured error definitions using thiserror, with
//! each variant carrying its client-facing HTTP mapping so handlers stay
//! thin. Upstream-related variants also name the outcome label recorded in
//! the predictions counter.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Main error type for gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Model service could not be reached at the transport level
    #[error("Model service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Model service answered with a non-success HTTP status
    #[error("Model service error: upstream returned status {0}")]
    UpstreamError(u16),

    /// Model service answered successfully but embedded an error payload
    #[error("Prediction failed: {0}")]
    PredictionFailed(String),

    /// Feedback or flag referenced an identifier the ledger has never seen
    #[error("Invalid prediction ID: {0}")]
    UnknownPrediction(String),

    /// Request was malformed before any upstream call was made
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Unexpected local fault
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
    /// HTTP status this error surfaces as
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::UnknownPrediction(_) | GatewayError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short client-facing message; keeps upstream internals out of responses
    pub fn client_message(&self) -> String {
        match self {
            GatewayError::ServiceUnavailable(_) => "Model service unavailable".to_string(),
            GatewayError::UpstreamError(_) => "Model service error".to_string(),
            GatewayError::PredictionFailed(_) => "Prediction failed".to_string(),
            GatewayError::UnknownPrediction(_) => "Invalid prediction ID".to_string(),
            GatewayError::InvalidInput(message) => message.clone(),
            _ => "Internal server error".to_string(),
        }
    }

    /// Outcome label recorded in the predictions counter
    pub fn outcome(&self) -> &'static str {
        match self {
            GatewayError::ServiceUnavailable(_) => "service_unavailable",
            GatewayError::UpstreamError(_) => "upstream_error",
            GatewayError::PredictionFailed(_) => "prediction_failed",
            _ => "internal_error",
        }
    }

    /// Whether the caller may retry the same request later
    pub fn retryable(&self) -> bool {
        matches!(self, GatewayError::ServiceUnavailable(_))
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, status = status.as_u16(), "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        let body = if self.retryable() {
            json!({ "error": self.client_message(), "retryable": true })
        } else {
            json!({ "error": self.client_message() })
        };

        (status, Json(body)).into_response()
    }
}

/// Convert anyhow::Error to GatewayError
impl From<anyhow::Error> for GatewayError {
    fn from(err: anyhow::Error) -> Self {
        GatewayError::Internal(err.to_string())
    }
}
