//! Prediction lifecycle orchestration
//!
//! Ties the model client, ledger, and metrics registry together: classify
//! the upstream call into the error taxonomy, persist successful
//! predictions, and route feedback and flag submissions to the ledger.

use crate::error::{GatewayError, Result};
use crate::ledger::PredictionLedger;
use crate::metrics::{labels, names, MetricsRegistry};
use crate::services::model::{ModelClient, PredictionOutcome};
use crate::types::{
    FlagReason, PredictionId, PredictionRecord, Sentiment, UserFeedback, DEFAULT_CONFIDENCE,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Client-facing result of a successful prediction
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResponse {
    pub sentiment: Sentiment,
    pub confidence: f64,
    pub prediction_id: PredictionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<serde_json::Value>,
}

/// Request gateway coordinating the prediction lifecycle
pub struct Gateway {
    model: ModelClient,
    ledger: Arc<PredictionLedger>,
    metrics: Arc<MetricsRegistry>,
    version_tag: String,
}

impl Gateway {
    pub fn new(
        model: ModelClient,
        ledger: Arc<PredictionLedger>,
        metrics: Arc<MetricsRegistry>,
        version_tag: impl Into<String>,
    ) -> Self {
        Self {
            model,
            ledger,
            metrics,
            version_tag: version_tag.into(),
        }
    }

    /// Access the underlying ledger
    pub fn ledger(&self) -> &Arc<PredictionLedger> {
        &self.ledger
    }

    /// Classify `text`, record the prediction, and hand back its identifier
    ///
    /// Every outcome, success or failure, increments the predictions
    /// counter with its outcome label. Empty input is rejected before any
    /// upstream call and is not counted as a prediction outcome.
    pub async fn predict(&self, text: &str) -> Result<PredictionResponse> {
        let text = text.trim();
        if text.is_empty() {
            return Err(GatewayError::InvalidInput(
                "text must not be empty".to_string(),
            ));
        }

        let outcome = match self.model.predict(text).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.count_outcome(err.outcome());
                return Err(err);
            }
        };

        let prediction = match outcome {
            PredictionOutcome::Success(prediction) => prediction,
            PredictionOutcome::TransportFailure(err) => {
                let err = GatewayError::ServiceUnavailable(err.to_string());
                self.count_outcome(err.outcome());
                warn!(error = %err, "model service unreachable");
                return Err(err);
            }
            PredictionOutcome::UpstreamStatus(status) => {
                let err = GatewayError::UpstreamError(status);
                self.count_outcome(err.outcome());
                warn!(status, "model service returned error status");
                return Err(err);
            }
            PredictionOutcome::EmbeddedError(message) => {
                let err = GatewayError::PredictionFailed(message);
                self.count_outcome(err.outcome());
                warn!(error = %err, "model service rejected input");
                return Err(err);
            }
        };

        let confidence = prediction.confidence.unwrap_or(DEFAULT_CONFIDENCE);
        let mut record = PredictionRecord::new(text, prediction.sentiment, confidence);
        record.warning = prediction.warning;
        record.debug_info = prediction.debug_info;

        let response = PredictionResponse {
            sentiment: record.label,
            confidence,
            prediction_id: record.id,
            warning: record.warning.clone(),
            debug_info: record.debug_info.clone(),
        };

        let id = self.ledger.record(record).await;

        self.count_outcome("success");
        let label = response.sentiment.to_string();
        self.metrics.observe(
            names::PREDICTION_CONFIDENCE,
            labels(&[("label", &label), ("version", &self.version_tag)]),
            confidence,
        );
        info!(%id, sentiment = %response.sentiment, confidence, "prediction recorded");

        Ok(response)
    }

    /// Apply a feedback submission against an earlier prediction
    pub async fn submit_feedback(
        &self,
        id: PredictionId,
        feedback: Option<UserFeedback>,
        correction: Option<Sentiment>,
    ) -> Result<()> {
        self.ledger.apply_feedback(id, feedback, correction).await
    }

    /// Flag an earlier prediction for review
    pub async fn submit_flag(&self, id: PredictionId, reason: FlagReason) -> Result<()> {
        self.ledger.apply_flag(id, reason).await
    }

    /// Proxy the model service version
    pub async fn model_version(&self) -> Result<String> {
        self.model.version().await
    }

    fn count_outcome(&self, outcome: &str) {
        self.metrics.inc_counter(
            names::PREDICTIONS_TOTAL,
            labels(&[("outcome", outcome), ("version", &self.version_tag)]),
        );
    }
}
