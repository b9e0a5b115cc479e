//! HTTP client for the sentiment model service
//!
//! Wraps reqwest with a bounded timeout and classifies every failure mode
//! of the upstream call into a discriminated outcome instead of a stringly
//! error, so the gateway can map each one to its own client contract.

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::types::Sentiment;
use serde::Deserialize;
use tracing::debug;

/// Successful prediction payload from the model service
#[derive(Debug, Clone)]
pub struct ModelPrediction {
    pub sentiment: Sentiment,
    pub confidence: Option<f64>,
    pub warning: Option<String>,
    pub debug_info: Option<serde_json::Value>,
}

/// Every way a model call can land
#[derive(Debug)]
pub enum PredictionOutcome {
    /// Success status with a usable payload
    Success(ModelPrediction),
    /// The service could not be reached at all
    TransportFailure(reqwest::Error),
    /// The service answered with a non-success HTTP status
    UpstreamStatus(u16),
    /// The service answered successfully but reported an error in the payload
    EmbeddedError(String),
}

/// Raw wire payload; `sentiment` is absent when `error` is set
#[derive(Debug, Deserialize)]
struct RawPrediction {
    sentiment: Option<Sentiment>,
    confidence: Option<f64>,
    warning: Option<String>,
    debug_info: Option<serde_json::Value>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelVersion {
    service_version: String,
}

/// Client for the sentiment model service
pub struct ModelClient {
    base_url: String,
    client: reqwest::Client,
}

impl ModelClient {
    /// Create a client bounded by the configured timeout
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.model_timeout)
            .build()
            .map_err(|e| GatewayError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.model_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Ask the model service to classify `text`
    ///
    /// Transport and upstream failures come back as outcomes; only local
    /// faults (an undecodable success payload) surface as `Err`.
    pub async fn predict(&self, text: &str) -> Result<PredictionOutcome> {
        let url = format!("{}/predict", self.base_url);

        let response = match self.client.get(&url).query(&[("text", text)]).send().await {
            Ok(response) => response,
            Err(err) => {
                debug!(error = %err, "model service unreachable");
                return Ok(PredictionOutcome::TransportFailure(err));
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "model service returned error status");
            return Ok(PredictionOutcome::UpstreamStatus(status.as_u16()));
        }

        let raw: RawPrediction = response
            .json()
            .await
            .map_err(|e| GatewayError::Internal(format!("undecodable model response: {}", e)))?;

        if let Some(error) = raw.error {
            debug!(error = %error, "model service reported an error payload");
            return Ok(PredictionOutcome::EmbeddedError(error));
        }

        let sentiment = raw.sentiment.ok_or_else(|| {
            GatewayError::Internal("model response missing sentiment".to_string())
        })?;

        Ok(PredictionOutcome::Success(ModelPrediction {
            sentiment,
            confidence: raw.confidence,
            warning: raw.warning,
            debug_info: raw.debug_info,
        }))
    }

    /// Fetch the model service version string
    pub async fn version(&self) -> Result<String> {
        let url = format!("{}/version", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GatewayError::ServiceUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::UpstreamError(status.as_u16()));
        }

        let payload: ModelVersion = response
            .json()
            .await
            .map_err(|e| GatewayError::Internal(format!("undecodable version response: {}", e)))?;

        Ok(payload.service_version)
    }
}
