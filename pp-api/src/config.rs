//! API Configuration
//!
//! Loaded from `PP_*` environment variables. Every value has a default
//! except the JWT secret, which is checked when the state is built.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `PP_HOST` | `0.0.0.0` |
//! | `PP_PORT` | `3000` |
//! | `PP_DATABASE_URL` | unset: in-memory store |
//! | `PP_DB_MAX_CONNECTIONS` | `20` |
//! | `PP_REDIS_URL` | unset: no cache |
//! | `PP_CACHE_PREFIX` | `pp:` |
//! | `PP_CACHE_TTL_SECS` | `60` |
//! | `PP_JWT_SECRET` | required, at least 32 bytes |
//! | `PP_JWT_TTL_SECS` | `86400` |
//! | `PP_ENABLE_CORS` | `true` |
//! | `PP_METRICS_ENABLED` | `true` |
//! | `PP_BRIDGE_CONTRACT` | `simulated` |

use pp_store::DEFAULT_MAX_CONNECTIONS;
use std::env;

use crate::DEFAULT_PORT;

/// HTTP service configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub service_name: String,
    pub version: String,
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub redis_url: Option<String>,
    pub cache_prefix: String,
    pub cache_ttl_secs: u64,
    pub jwt_secret: Option<String>,
    pub jwt_ttl_secs: i64,
    pub enable_cors: bool,
    pub metrics_enabled: bool,
    /// Contract address the payment gateway talks to
    pub bridge_contract: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            service_name: "people-power-api".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            database_url: None,
            db_max_connections: DEFAULT_MAX_CONNECTIONS,
            redis_url: None,
            cache_prefix: "pp:".to_string(),
            cache_ttl_secs: 60,
            jwt_secret: None,
            jwt_ttl_secs: 86_400,
            enable_cors: true,
            metrics_enabled: true,
            bridge_contract: "simulated".to_string(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("PP_HOST").unwrap_or(defaults.host),
            port: env_parse("PP_PORT", defaults.port),
            database_url: env_opt("PP_DATABASE_URL"),
            db_max_connections: env_parse("PP_DB_MAX_CONNECTIONS", defaults.db_max_connections),
            redis_url: env_opt("PP_REDIS_URL"),
            cache_prefix: env::var("PP_CACHE_PREFIX").unwrap_or(defaults.cache_prefix),
            cache_ttl_secs: env_parse("PP_CACHE_TTL_SECS", defaults.cache_ttl_secs),
            jwt_secret: env_opt("PP_JWT_SECRET"),
            jwt_ttl_secs: env_parse("PP_JWT_TTL_SECS", defaults.jwt_ttl_secs),
            enable_cors: env_bool("PP_ENABLE_CORS", defaults.enable_cors),
            metrics_enabled: env_bool("PP_METRICS_ENABLED", defaults.metrics_enabled),
            bridge_contract: env::var("PP_BRIDGE_CONTRACT").unwrap_or(defaults.bridge_contract),
            ..defaults
        }
    }

    /// `host:port` to bind
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}
