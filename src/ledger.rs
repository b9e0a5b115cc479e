//! In-memory prediction ledger
//!
//! Keyed store of prediction records. Records are inserted once at
//! prediction time; later feedback, correction, and flag submissions mutate
//! the stored entry. The map lives for the whole process and is never
//! evicted. Writes to distinct identifiers are independent; concurrent
//! writes to the same identifier are last-writer-wins.

use crate::error::{GatewayError, Result};
use crate::metrics::{labels, names, MetricsRegistry};
use crate::types::{FlagReason, PredictionId, PredictionRecord, Sentiment, UserFeedback};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Ledger of predictions awaiting feedback
pub struct PredictionLedger {
    records: RwLock<HashMap<PredictionId, PredictionRecord>>,
    metrics: Arc<MetricsRegistry>,
    version_tag: String,
}

impl PredictionLedger {
    /// Create an empty ledger
    pub fn new(metrics: Arc<MetricsRegistry>, version_tag: impl Into<String>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            metrics,
            version_tag: version_tag.into(),
        }
    }

    /// Insert a freshly created record, returning its identifier
    ///
    /// Identifiers are generated at record construction and collision-free,
    /// so an insert never overwrites an existing entry.
    pub async fn record(&self, record: PredictionRecord) -> PredictionId {
        let id = record.id;
        let mut records = self.records.write().await;
        records.insert(id, record);
        id
    }

    /// Look up a record by identifier
    pub async fn get(&self, id: PredictionId) -> Option<PredictionRecord> {
        let records = self.records.read().await;
        records.get(&id).cloned()
    }

    /// Number of records currently held
    pub async fn len(&self) -> usize {
        let records = self.records.read().await;
        records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Apply a feedback submission to an existing record
    ///
    /// The feedback verdict overwrites any earlier one. A correction is
    /// stored only when it differs from the original label; a correction
    /// equal to the label mutates nothing and emits no metric.
    pub async fn apply_feedback(
        &self,
        id: PredictionId,
        feedback: Option<UserFeedback>,
        correction: Option<Sentiment>,
    ) -> Result<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&id)
            .ok_or_else(|| GatewayError::UnknownPrediction(id.to_string()))?;

        if let Some(feedback) = feedback {
            record.user_feedback = Some(feedback);
            let label = record.label.to_string();
            let feedback_label = feedback.to_string();
            self.metrics.inc_counter(
                names::FEEDBACK_TOTAL,
                labels(&[
                    ("label", &label),
                    ("feedback", &feedback_label),
                    ("version", &self.version_tag),
                ]),
            );
            debug!(%id, feedback = %feedback, "feedback recorded");
        }

        if let Some(correction) = correction {
            if correction != record.label {
                record.user_correction = Some(correction);
                record.updated_at = Utc::now();
                let original = record.label.to_string();
                let corrected = correction.to_string();
                self.metrics.inc_counter(
                    names::CORRECTIONS_TOTAL,
                    labels(&[
                        ("original", &original),
                        ("corrected", &corrected),
                        ("version", &self.version_tag),
                    ]),
                );
                debug!(%id, original = %record.label, corrected = %correction, "correction recorded");
            }
        }

        Ok(())
    }

    /// Flag an existing record for review
    ///
    /// Re-flagging overwrites the previous reason and timestamp.
    pub async fn apply_flag(&self, id: PredictionId, reason: FlagReason) -> Result<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&id)
            .ok_or_else(|| GatewayError::UnknownPrediction(id.to_string()))?;

        record.flagged = true;
        record.flag_reason = Some(reason);
        record.updated_at = Utc::now();

        let reason_label = reason.to_string();
        self.metrics.inc_counter(
            names::FLAGS_TOTAL,
            labels(&[("reason", &reason_label), ("version", &self.version_tag)]),
        );
        debug!(%id, reason = %reason, "prediction flagged");

        Ok(())
    }
}
