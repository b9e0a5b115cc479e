//! HTTP API for the sentiment gateway
//!
//! Provides:
//! - Prediction, feedback, and flag submission endpoints
//! - Version and liveness endpoints
//! - Metrics text exposition for the scraper

pub mod server;

pub use server::{AppState, GatewayServer};
