//! People Power CLI
//!
//! # Usage
//!
//! ```text
//! people-power [OPTIONS] <COMMAND>
//!
//! Commands:
//!   serve         Start the API server
//!   init-schema   Create the PostgreSQL tables
//!   issue-token   Sign a bearer token for a player
//!   status        Check a running server
//!
//! Options:
//!   -f, --format <FORMAT>          Output format (json, table, plain) [default: table]
//!       --log-level <LEVEL>        [env: PP_LOG_LEVEL] [default: info]
//!       --log-format <FORMAT>      [env: PP_LOG_FORMAT] [default: pretty]
//! ```
//!
//! # Examples
//!
//! ```text
//! people-power serve --port 8080 --database-url postgres://localhost/pp
//! people-power issue-token --player-id 2f1c... --admin
//! people-power status --api-url http://localhost:3000
//! ```

pub mod client;
pub mod commands;
pub mod error;
pub mod handler;
pub mod logging;
pub mod output;

pub use client::PpClient;
pub use commands::{Cli, Commands, OutputFormat};
pub use error::{CliError, CliResult};
pub use logging::{init_logging, LogConfig, LogFormat};

/// CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
