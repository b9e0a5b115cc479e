//! Pathos - sentiment gateway entry point
//!
//! Parses CLI flags and environment overrides, initializes tracing, and
//! serves the gateway until the process is stopped.

use clap::Parser;
use pathos_core::{GatewayConfig, GatewayServer};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "pathos",
    version,
    about = "Sentiment gateway with prediction feedback tracking"
)]
struct Cli {
    /// Address to bind the HTTP server on
    #[arg(long, default_value = "0.0.0.0:5000")]
    bind: SocketAddr,

    /// Base URL of the sentiment model service
    #[arg(long, env = "MODEL_SERVICE_URL", default_value = "http://model-service:5001")]
    model_url: String,

    /// Timeout for a single model service call, in seconds
    #[arg(long, env = "MODEL_TIMEOUT_SECS", default_value_t = 10)]
    model_timeout_secs: u64,

    /// Version label attached to domain metrics
    #[arg(long, env = "APP_VERSION")]
    version_tag: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = GatewayConfig {
        addr: cli.bind,
        model_url: cli.model_url,
        model_timeout: Duration::from_secs(cli.model_timeout_secs),
        version_tag: cli
            .version_tag
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
    };
    config.validate()?;

    info!("starting pathos {}", env!("CARGO_PKG_VERSION"));
    GatewayServer::new(config)?.serve().await
}
