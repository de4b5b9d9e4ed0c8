//! CLI Commands
//!
//! Command definitions for the `people-power` binary.

use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::logging::LogFormat;

/// People Power CLI
#[derive(Parser, Debug)]
#[command(name = "people-power")]
#[command(version)]
#[command(about = "People Power game server and tooling")]
#[command(long_about = "Run the People Power API, prepare its database and issue \
    tokens for testing.\n\nConfiguration comes from PP_* environment variables \
    (a .env file is loaded first); flags override them.")]
pub struct Cli {
    /// Output format (json, table, plain)
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, env = "PP_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log format (pretty, json, compact)
    #[arg(long, env = "PP_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable
    #[default]
    Table,
    /// Bare values
    Plain,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Host to bind to (env: PP_HOST)
        #[arg(short = 'H', long)]
        host: Option<String>,
        /// Port to listen on (env: PP_PORT)
        #[arg(short, long)]
        port: Option<u16>,
        /// PostgreSQL URL; the in-memory store is used when unset (env: PP_DATABASE_URL)
        #[arg(long)]
        database_url: Option<String>,
        /// Redis URL for the response cache (env: PP_REDIS_URL)
        #[arg(long)]
        redis_url: Option<String>,
    },

    /// Create the PostgreSQL tables
    InitSchema {
        #[arg(long, env = "PP_DATABASE_URL")]
        database_url: String,
    },

    /// Sign a bearer token for a player (uses PP_JWT_SECRET)
    IssueToken {
        #[arg(long)]
        player_id: Uuid,
        /// Include the admin role
        #[arg(long)]
        admin: bool,
        #[arg(long, default_value_t = 0)]
        telegram_id: i64,
    },

    /// Check a running server
    Status {
        /// API endpoint URL
        #[arg(short, long, env = "PP_API_URL", default_value = "http://localhost:3000")]
        api_url: String,
    },
}
