//! Core data types for the sentiment gateway
//!
//! This module defines the prediction identifier, the binary sentiment
//! label spoken on the wire, and the ledger record that feedback, correction,
//! and flag submissions mutate after the fact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Confidence assumed when the model service omits one
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Unique identifier for predictions
///
/// Wraps a UUID to provide type safety and prevent mixing prediction IDs
/// with other UUID-based identifiers in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionId(pub Uuid);

impl PredictionId {
    /// Create a new random prediction ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a prediction ID from a string
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for PredictionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PredictionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Binary sentiment label
///
/// The model service speaks integers on the wire: `1` is positive and `0`
/// is negative. Metric labels use the textual form from [`std::fmt::Display`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Sentiment {
    Negative,
    Positive,
}

impl From<Sentiment> for u8 {
    fn from(sentiment: Sentiment) -> u8 {
        match sentiment {
            Sentiment::Negative => 0,
            Sentiment::Positive => 1,
        }
    }
}

impl TryFrom<u8> for Sentiment {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Sentiment::Negative),
            1 => Ok(Sentiment::Positive),
            other => Err(format!("sentiment must be 0 or 1, got {}", other)),
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Negative => write!(f, "negative"),
            Sentiment::Positive => write!(f, "positive"),
        }
    }
}

/// User verdict on a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserFeedback {
    Correct,
    Incorrect,
}

impl std::fmt::Display for UserFeedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserFeedback::Correct => write!(f, "correct"),
            UserFeedback::Incorrect => write!(f, "incorrect"),
        }
    }
}

/// Reason a prediction was flagged
///
/// Unknown reason strings degrade to `Other`, matching the submission form's
/// fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum FlagReason {
    Inappropriate,
    WrongContext,
    Other,
}

impl From<String> for FlagReason {
    fn from(s: String) -> Self {
        match s.as_str() {
            "inappropriate" => FlagReason::Inappropriate,
            "wrong_context" => FlagReason::WrongContext,
            _ => FlagReason::Other,
        }
    }
}

impl Default for FlagReason {
    fn default() -> Self {
        FlagReason::Other
    }
}

impl std::fmt::Display for FlagReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlagReason::Inappropriate => write!(f, "inappropriate"),
            FlagReason::WrongContext => write!(f, "wrong_context"),
            FlagReason::Other => write!(f, "other"),
        }
    }
}

/// A single prediction and everything learned about it afterwards
///
/// Created exactly once, at prediction time. Feedback, correction, and flag
/// submissions only add to or overwrite the optional fields; the base record
/// is never removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Immutable identifier, generated at creation
    pub id: PredictionId,

    /// The text the caller submitted
    pub input_text: String,

    /// Label returned by the model service
    pub label: Sentiment,

    /// Score in [0, 1]; [`DEFAULT_CONFIDENCE`] when the service omitted one
    pub confidence: f64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Bumped by correction and flag mutations
    pub updated_at: DateTime<Utc>,

    /// Diagnostic string from the model service (e.g. vocabulary mismatch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,

    /// Opaque mapping attached by the model service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<serde_json::Value>,

    /// Latest feedback submission wins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_feedback: Option<UserFeedback>,

    /// Set only when a submitted correction differs from `label`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_correction: Option<Sentiment>,

    #[serde(default)]
    pub flagged: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag_reason: Option<FlagReason>,
}

impl PredictionRecord {
    /// Create a fresh record with a newly generated identifier
    pub fn new(input_text: impl Into<String>, label: Sentiment, confidence: f64) -> Self {
        let now = Utc::now();
        Self {
            id: PredictionId::new(),
            input_text: input_text.into(),
            label,
            confidence,
            created_at: now,
            updated_at: now,
            warning: None,
            debug_info: None,
            user_feedback: None,
            user_correction: None,
            flagged: false,
            flag_reason: None,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    pub fn with_debug_info(mut self, debug_info: serde_json::Value) -> Self {
        self.debug_info = Some(debug_info);
        self
    }
}
