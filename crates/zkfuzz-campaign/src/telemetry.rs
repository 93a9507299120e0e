//! Tracing setup for the campaign binary.

use anyhow::{anyhow, Result};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Set to any value to log JSON lines instead of human-readable text
pub const JSON_ENV: &str = "ZKFUZZ_LOG_JSON";

pub fn init_telemetry() -> Result<()> {
    let json = std::env::var_os(JSON_ENV).is_some();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,zkfuzz_campaign=debug".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_target(true)))
        .with((!json).then(|| fmt::layer().with_target(true)))
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {}", e))?;

    info!(json, "Telemetry initialized");
    Ok(())
}
