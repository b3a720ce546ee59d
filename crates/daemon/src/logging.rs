//! Diagnostic logging setup
//!
//! `SHARDMON_LOG_FORMAT=json` for structured output, pretty otherwise.
//! Diagnostics go to stderr; stdout belongs to the operator console.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "shardmon=info";

pub fn init_tracing() -> Result<()> {
    let log_format = std::env::var("SHARDMON_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("Failed to create env filter")?;

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = match log_format.as_str() {
        // Production: JSON structured logging
        "json" => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        // Development: pretty formatting with colors
        _ => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
    };
    installed.context("Failed to install tracing subscriber")
}
