//! Runtime configuration for the gateway
//!
//! Values resolve from CLI flags, then environment variables, then
//! defaults that match the compose network the service ships in.

use crate::error::Result;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Default model service endpoint inside the compose network
const DEFAULT_MODEL_URL: &str = "http://model-service:5001";

/// Default bound on a single model service call
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 10;

const DEFAULT_PORT: u16 = 5000;

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address the HTTP server binds on
    pub addr: SocketAddr,

    /// Base URL of the sentiment model service
    pub model_url: String,

    /// Upper bound on a single model service call
    pub model_timeout: Duration,

    /// Version label attached to domain metrics
    pub version_tag: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], port)),
            model_url: env::var("MODEL_SERVICE_URL")
                .unwrap_or_else(|_| DEFAULT_MODEL_URL.to_string()),
            model_timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
            version_tag: env::var("APP_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
        }
    }
}

impl GatewayConfig {
    /// Catch the obvious misconfigurations before binding the server
    pub fn validate(&self) -> Result<()> {
        if self.model_url.is_empty() {
            return Err(config::ConfigError::Message(
                "model service URL cannot be empty".to_string(),
            )
            .into());
        }

        reqwest::Url::parse(&self.model_url).map_err(|e| {
            config::ConfigError::Message(format!(
                "invalid model service URL '{}': {}",
                self.model_url, e
            ))
        })?;

        if self.model_timeout.is_zero() {
            return Err(config::ConfigError::Message(
                "model timeout must be positive".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
