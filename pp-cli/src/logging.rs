//! Structured Logging
//!
//! JSON output for production and pretty-printed output for development.
//! `RUST_LOG`, when set, takes precedence over the configured level.

use pp_core::logging::LogLevel;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Crates whose logs follow the configured level
const WORKSPACE_TARGETS: &[&str] = &["pp_core", "pp_store", "pp_api", "pp_cli", "people_power"];

/// Log format
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Pretty-printed for development
    #[default]
    Pretty,
    /// JSON for production
    Json,
    /// Compact single-line
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Include source file/line
    pub include_source: bool,
    /// Level for everything outside the workspace (tower, sqlx, ...)
    pub dependency_level: LogLevel,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            include_source: true,
            dependency_level: LogLevel::Warn,
        }
    }
}

impl LogConfig {
    /// Create a production-ready configuration
    pub fn production() -> Self {
        Self {
            format: LogFormat::Json,
            include_source: false,
            ..Self::default()
        }
    }

    /// Level and format as given on the command line
    ///
    /// An unknown level falls back to info.
    pub fn from_args(level: &str, format: LogFormat) -> Self {
        Self {
            level: LogLevel::parse(level).unwrap_or_default(),
            format,
            include_source: format != LogFormat::Json,
            ..Self::default()
        }
    }

    /// Filter directive string, e.g. `warn,pp_api=info,...`
    pub fn directives(&self) -> String {
        let mut directives = vec![self.dependency_level.to_string()];
        directives.extend(
            WORKSPACE_TARGETS
                .iter()
                .map(|target| format!("{}={}", target, self.level)),
        );
        directives.push(format!("tower_http={}", self.level));
        directives.join(",")
    }
}

/// Install the global subscriber; call once at startup
pub fn init_logging(config: &LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.directives())?,
    };

    match config.format {
        LogFormat::Json => {
            let subscriber = tracing_subscriber::registry().with(filter).with(
                fmt::layer()
                    .json()
                    .with_file(config.include_source)
                    .with_line_number(config.include_source),
            );
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Pretty => {
            let subscriber = tracing_subscriber::registry().with(filter).with(
                fmt::layer()
                    .pretty()
                    .with_file(config.include_source)
                    .with_line_number(config.include_source),
            );
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Compact => {
            let subscriber = tracing_subscriber::registry().with(filter).with(
                fmt::layer()
                    .compact()
                    .with_file(config.include_source)
                    .with_line_number(config.include_source),
            );
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}
