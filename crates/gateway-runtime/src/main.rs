//! # Citizen Ledger Gateway
//!
//! ```text
//! gateway-runtime --config config/gateway.toml
//! ```
//!
//! Telemetry is configured through the environment (`LEDGER_LOG_LEVEL`,
//! `LEDGER_JSON_LOGS`, `OTEL_EXPORTER_OTLP_ENDPOINT`, `OTEL_SERVICE_NAME`).

use anyhow::{Context, Result};
use clap::Parser;
use gateway_runtime::{GatewayRuntime, RuntimeConfig};
use ledger_telemetry::{init_telemetry, TelemetryConfig};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "gateway-runtime", version, about = "Citizen ledger REST gateway")]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RuntimeConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => {
            let config = RuntimeConfig::default();
            config.validate().context("invalid default configuration")?;
            config
        }
    };

    let _telemetry = init_telemetry(TelemetryConfig::from_env())
        .await
        .context("failed to initialize telemetry")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        "Starting citizen ledger gateway"
    );

    let runtime = GatewayRuntime::build(config)?;
    runtime
        .run(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C"),
                Err(e) => error!(error = %e, "Cannot listen for Ctrl+C; shutting down"),
            }
        })
        .await
}
