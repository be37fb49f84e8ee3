use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConsoleConfig {
    pub api: ApiConfig,
    pub render: RenderConfig,
    pub logging: LoggingConfig,
}

/// Backend the console talks to. Passed explicitly to whatever needs it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderConfig {
    /// Inputs above this size are refused before parsing
    pub max_input_bytes: usize,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Html,
    Plain,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Stdout is reserved for command output.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stderr,
    File { path: String },
}

impl ConsoleConfig {
    /// Load configuration from console.toml and environment variables
    ///
    /// Priority: Environment Variables > `explicit` file > default file locations > Defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let defaults = config::Config::try_from(&ConsoleConfig::default())
            .context("Failed to serialize default configuration")?;

        let mut builder = config::Config::builder().add_source(defaults);

        // 1. /etc/console/console.toml (system install)
        // 2. config/console.toml (local development)
        for path in ["/etc/console/console", "config/console"] {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        if let Some(path) = explicit {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        // Nested keys use a double underscore: CONSOLE_API__ENDPOINT
        builder = builder.add_source(
            config::Environment::with_prefix("CONSOLE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn validate(&self) -> Result<()> {
        let endpoint = self.api.endpoint.trim();
        if endpoint.is_empty() {
            anyhow::bail!("api.endpoint must not be empty");
        }
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            anyhow::bail!("api.endpoint must be an http(s) URL, got '{}'", endpoint);
        }
        if self.api.timeout_secs == 0 {
            anyhow::bail!("api.timeout_secs must be > 0");
        }
        if self.render.max_input_bytes == 0 {
            anyhow::bail!("render.max_input_bytes must be > 0");
        }
        Ok(())
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                endpoint: "http://localhost:8080".to_string(),
                timeout_secs: 30,
            },
            render: RenderConfig {
                max_input_bytes: 16 * 1024 * 1024,
                format: OutputFormat::Json,
            },
            logging: LoggingConfig {
                level: "info,console=debug".to_string(),
                format: LogFormat::Pretty,
                output: LogOutput::Stderr,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Defaults ────────────────────────────────────────────────

    #[test]
    fn test_defaults() {
        let cfg = ConsoleConfig::default();
        assert_eq!(cfg.api.endpoint, "http://localhost:8080");
        assert_eq!(cfg.api.timeout_secs, 30);
        assert_eq!(cfg.render.max_input_bytes, 16 * 1024 * 1024);
        assert_eq!(cfg.render.format, OutputFormat::Json);
        assert!(matches!(cfg.logging.output, LogOutput::Stderr));
    }

    #[test]
    fn test_defaults_validate() {
        assert!(ConsoleConfig::default().validate().is_ok());
    }

    // ── Validation ──────────────────────────────────────────────

    #[test]
    fn test_validate_empty_endpoint() {
        let mut cfg = ConsoleConfig::default();
        cfg.api.endpoint = "  ".to_string();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("api.endpoint"));
    }

    #[test]
    fn test_validate_non_http_endpoint() {
        let mut cfg = ConsoleConfig::default();
        cfg.api.endpoint = "grpc://localhost:9080".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut cfg = ConsoleConfig::default();
        cfg.api.timeout_secs = 0;
        assert!(cfg.validate().unwrap_err().to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_validate_zero_max_input() {
        let mut cfg = ConsoleConfig::default();
        cfg.render.max_input_bytes = 0;
        assert!(cfg.validate().unwrap_err().to_string().contains("max_input_bytes"));
    }

    // ── Layering ────────────────────────────────────────────────

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console.toml");
        std::fs::write(
            &path,
            r#"
                [api]
                endpoint = "https://pipes.example.com"

                [render]
                format = "html"
            "#,
        )
        .unwrap();

        let cfg = ConsoleConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.api.endpoint, "https://pipes.example.com");
        assert_eq!(cfg.render.format, OutputFormat::Html);
        // untouched keys keep their defaults
        assert_eq!(cfg.api.timeout_secs, 30);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = ConsoleConfig::load(Some(Path::new("/nonexistent/console.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_output_format_serde() {
        let json = serde_json::to_string(&OutputFormat::Plain).unwrap();
        assert_eq!(json, "\"plain\"");
    }
}
