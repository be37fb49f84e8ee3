//! Boot: two-phase logging init and config load.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::{ConsoleConfig, LogFormat, LogOutput};

/// Phase 1: Basic tracing so config loading can log.
/// Uses set_default (thread-local) so it can be replaced by Phase 2's global subscriber
pub fn init_tracing_basic() -> tracing::subscriber::DefaultGuard {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,console=info"));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_default(subscriber)
}

/// Phase 2: Install the global subscriber described by `config.logging`.
/// `RUST_LOG` wins over the configured level. Nothing is written to stdout.
pub fn init_tracing_from_config(config: &ConsoleConfig) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let installed = match (&config.logging.format, &config.logging.output) {
        (LogFormat::Json, LogOutput::Stderr) => {
            let layer = fmt::layer()
                .json()
                .with_target(true)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).try_init()
        }
        (LogFormat::Json, LogOutput::File { path }) => {
            let file = open_log_file(path)?;
            let layer = fmt::layer()
                .json()
                .with_target(true)
                .with_ansi(false)
                .with_writer(Arc::new(file));
            tracing_subscriber::registry().with(filter).with(layer).try_init()
        }
        (LogFormat::Pretty, LogOutput::Stderr) => {
            let layer = fmt::layer()
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).try_init()
        }
        (LogFormat::Pretty, LogOutput::File { path }) => {
            let file = open_log_file(path)?;
            let layer = fmt::layer()
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(false)
                .with_writer(Arc::new(file));
            tracing_subscriber::registry().with(filter).with(layer).try_init()
        }
    };
    installed.context("Failed to install tracing subscriber")
}

fn open_log_file(path: &str) -> Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file '{}'", path))
}

/// Load and validate configuration, then switch logging over to it.
pub fn boot(explicit_config: Option<&Path>) -> Result<ConsoleConfig> {
    let basic_tracing = init_tracing_basic();

    debug!("console v{}", env!("CARGO_PKG_VERSION"));

    let config = ConsoleConfig::load(explicit_config).context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    // Drop the phase-1 thread-local guard so the global subscriber slot is free
    drop(basic_tracing);
    init_tracing_from_config(&config)?;

    info!(endpoint = %config.api.endpoint, "configuration loaded");
    Ok(config)
}
