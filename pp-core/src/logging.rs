//! Logging Conventions
//!
//! Field and operation names used with `tracing` across the workspace so
//! that log queries stay consistent between crates.
//!
//! # Log Levels
//!
//! | Level | Usage | Examples |
//! |-------|-------|----------|
//! | ERROR | Unrecoverable failures | Database unreachable, bridge call failed |
//! | WARN  | Recoverable issues | Cache unavailable, rejected transfer |
//! | INFO  | State changes | Player registered, level up, competition finalized |
//! | DEBUG | Operation flow | Cache hit/miss, mutation details |
//! | TRACE | Full payloads | Request bodies |
//!
//! # Example
//!
//! ```ignore
//! use pp_core::logging::{fields, operations};
//! use tracing::info;
//!
//! info!(
//!     player_id = %player.id,
//!     operation = operations::TRANSFER,
//!     amount,
//!     "Tokens transferred"
//! );
//! ```

use serde::{Deserialize, Serialize};

/// Log level enumeration matching tracing levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Standard log field names
pub mod fields {
    pub const PLAYER_ID: &str = "player_id";
    pub const COUNTERPARTY_ID: &str = "counterparty_id";
    pub const OPERATION: &str = "operation";
    pub const AMOUNT: &str = "amount";
    pub const DURATION_MS: &str = "duration_ms";
    pub const ERROR: &str = "error";
    pub const CACHE_KEY: &str = "cache_key";
    pub const TX_HASH: &str = "tx_hash";
}

/// Operation names for the `operation` field
pub mod operations {
    pub const REGISTER: &str = "register";
    pub const TAP: &str = "tap";
    pub const DAILY_LOGIN: &str = "daily_login";
    pub const EARN: &str = "earn";
    pub const SPEND: &str = "spend";
    pub const TRANSFER: &str = "transfer";
    pub const SHOP_PURCHASE: &str = "shop_purchase";
    pub const MISSION_CLAIM: &str = "mission_claim";
    pub const BADGE_AWARD: &str = "badge_award";
    pub const DIAMOND_PURCHASE: &str = "diamond_purchase";
    pub const DIAMOND_SPEND: &str = "diamond_spend";
    pub const STAKE: &str = "stake";
    pub const UNSTAKE: &str = "unstake";
    pub const TIP: &str = "tip";
    pub const MARKETPLACE_PURCHASE: &str = "marketplace_purchase";
    pub const MOVEMENT_TOKEN_PURCHASE: &str = "movement_token_purchase";
    pub const HABIT_COMPLETE: &str = "habit_complete";
    pub const LESSON_COMPLETE: &str = "lesson_complete";
    pub const REFERRAL: &str = "referral";
    pub const COMPETITION_FINALIZE: &str = "competition_finalize";
    pub const ADMIN_GRANT: &str = "admin_grant";
    pub const CACHE_GET: &str = "cache_get";
    pub const CACHE_SET: &str = "cache_set";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::parse("error"), Some(LogLevel::Error));
        assert_eq!(LogLevel::parse("INFO"), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("loud"), None);
    }

    #[test]
    fn test_default_level() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
        assert_eq!(LogLevel::Debug.to_string(), "debug");
    }
}
