//! Pathos - Sentiment Gateway with Prediction Feedback Tracking
//!
//! A small HTTP front door for a remote sentiment model: it forwards
//! free-text input to the model service, records every successful
//! prediction in an in-memory ledger, and lets callers submit feedback,
//! corrections, and flags against the returned prediction identifier.
//!
//! # Architecture
//!
//! The system is organized into several layers:
//! - **Types**: Core data structures (PredictionRecord, Sentiment, etc.)
//! - **Ledger**: In-memory keyed store of prediction records
//! - **Services**: Model service client with typed failure classification
//! - **Gateway**: Prediction lifecycle orchestration and metrics emission
//! - **API**: Axum HTTP surface and Prometheus text exposition
//!
//! # Example
//!
//! ```ignore
//! use pathos_core::{GatewayConfig, GatewayServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = GatewayConfig::default();
//!     config.validate()?;
//!     GatewayServer::new(config)?.serve().await
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod ledger;
pub mod metrics;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use api::{AppState, GatewayServer};
pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use gateway::{Gateway, PredictionResponse};
pub use ledger::PredictionLedger;
pub use metrics::MetricsRegistry;
pub use services::model::{ModelClient, ModelPrediction, PredictionOutcome};
pub use types::{
    FlagReason, PredictionId, PredictionRecord, Sentiment, UserFeedback, DEFAULT_CONFIDENCE,
};
