//! Subcommand handlers. Each returns the text destined for stdout.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use console_core::logs::{render_blocks_with, LogBlock};
use console_core::parser::{LogRenderer, RenderMetrics};
use console_core::rbac::{formalize_policies, parse_policies, validate_policies, Policy};
use tracing::{debug, info};

use crate::cli::{Commands, LogCommands, RbacCommands};
use crate::config::{ConsoleConfig, OutputFormat};
use crate::output;

pub fn run(command: &Commands, config: &ConsoleConfig) -> Result<String> {
    let limit = config.render.max_input_bytes;
    match command {
        Commands::Log(LogCommands::Render { path, format }) => {
            let input = read_input(path.as_deref(), limit)?;
            render_log(&input, format.unwrap_or(config.render.format))
        }
        Commands::Log(LogCommands::Blocks { path, format }) => {
            let input = read_input(Some(path.as_path()), limit)?;
            render_log_blocks(&input, format.unwrap_or(config.render.format))
        }
        Commands::Rbac(RbacCommands::Parse { path }) => {
            let policies = parse_policies(&read_input(path.as_deref(), limit)?);
            info!(count = policies.len(), "parsed policies");
            output::to_json(&policies)
        }
        Commands::Rbac(RbacCommands::Format { path }) => {
            let input = read_input(path.as_deref(), limit)?;
            let policies: Vec<Policy> =
                serde_json::from_str(&input).context("Failed to parse policies JSON")?;
            Ok(formalize_policies(&policies))
        }
        Commands::Rbac(RbacCommands::Check { path }) => {
            check_policies(&read_input(path.as_deref(), limit)?)
        }
        Commands::Config => output::to_json(config),
    }
}

/// Read `path`, or stdin when `None`, refusing anything over `limit` bytes.
pub fn read_input(path: Option<&Path>, limit: usize) -> Result<String> {
    let source = path.map_or_else(|| "stdin".to_string(), |p| p.display().to_string());
    let reader: Box<dyn Read> = match path {
        Some(p) => Box::new(
            std::fs::File::open(p).with_context(|| format!("Failed to open '{}'", source))?,
        ),
        None => Box::new(std::io::stdin()),
    };

    // One byte past the limit is enough to tell that it was exceeded
    let mut buf = Vec::new();
    reader
        .take(limit as u64 + 1)
        .read_to_end(&mut buf)
        .with_context(|| format!("Failed to read '{}'", source))?;

    if buf.len() > limit {
        anyhow::bail!(
            "input '{}' exceeds render.max_input_bytes ({} bytes)",
            source,
            limit
        );
    }

    String::from_utf8(buf).with_context(|| format!("'{}' is not valid UTF-8", source))
}

fn render_log(input: &str, format: OutputFormat) -> Result<String> {
    let metrics = Arc::new(RenderMetrics::new());
    let lines = LogRenderer::with_metrics(Arc::clone(&metrics)).render(input);
    debug!(metrics = ?metrics.snapshot(), "rendered log");
    output::format_lines(&lines, format)
}

fn render_log_blocks(input: &str, format: OutputFormat) -> Result<String> {
    let blocks: Vec<LogBlock> =
        serde_json::from_str(input).context("Failed to parse log blocks JSON")?;

    let metrics = Arc::new(RenderMetrics::new());
    let mut renderer = LogRenderer::with_metrics(Arc::clone(&metrics));
    let rendered = render_blocks_with(&mut renderer, &blocks);
    debug!(blocks = rendered.len(), metrics = ?metrics.snapshot(), "rendered log blocks");

    output::format_blocks(&rendered, format)
}

fn check_policies(input: &str) -> Result<String> {
    let policies = parse_policies(input);
    validate_policies(&policies).context("Policy check failed")?;
    Ok(format!("{} policies OK", policies.len()))
}
