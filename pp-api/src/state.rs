//! Application State
//!
//! Shared state for the People Power API.

use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use pp_core::GameConfig;
use pp_store::{MemoryStore, PgConfig, PgStore, Services, Store};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::JwtConfig;
use crate::bridge::{PaymentGateway, SimulatedGateway};
use crate::cache::{Cache, NoopCache, RedisCache};
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

/// Application state shared across handlers
pub struct AppState {
    pub config: ApiConfig,
    pub services: Services,
    pub jwt: JwtConfig,
    pub cache: Arc<dyn Cache>,
    pub gateway: Arc<dyn PaymentGateway>,
    /// Prometheus handle, when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
    pub started_at: DateTime<Utc>,
    request_counter: AtomicU64,
    active_requests: AtomicU64,
}

impl AppState {
    /// State with no cache and the simulated payment gateway
    pub fn new(config: ApiConfig, services: Services, jwt: JwtConfig) -> Self {
        let gateway = SimulatedGateway::new(config.bridge_contract.clone());
        Self {
            config,
            services,
            jwt,
            cache: Arc::new(NoopCache),
            gateway: Arc::new(gateway),
            metrics: None,
            started_at: Utc::now(),
            request_counter: AtomicU64::new(0),
            active_requests: AtomicU64::new(0),
        }
    }

    /// In-memory store with default game rules
    pub fn in_memory(config: ApiConfig, jwt: JwtConfig) -> Self {
        let services = Services::new(Arc::new(MemoryStore::new()), GameConfig::default());
        Self::new(config, services, jwt)
    }

    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.gateway = gateway;
        self
    }

    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }

    /// Build everything the configuration asks for
    ///
    /// Connects to PostgreSQL when a database URL is set (and applies the
    /// schema), otherwise uses the in-memory store. A Redis URL that cannot
    /// be reached is logged and the API runs without a cache.
    pub async fn from_config(config: ApiConfig) -> ApiResult<Self> {
        let secret = config
            .jwt_secret
            .clone()
            .ok_or_else(|| ApiError::validation("PP_JWT_SECRET must be set"))?;
        let jwt = JwtConfig::try_new(secret, config.jwt_ttl_secs)?;

        let store: Arc<dyn Store> = match &config.database_url {
            Some(url) => {
                let pg = PgStore::connect(
                    &PgConfig::new(url.clone()).with_max_connections(config.db_max_connections),
                )
                .await?;
                pg.init_schema().await?;
                info!(max_connections = config.db_max_connections, "Connected to PostgreSQL");
                Arc::new(pg)
            }
            None => {
                warn!("PP_DATABASE_URL not set, using the in-memory store");
                Arc::new(MemoryStore::new())
            }
        };

        let cache: Arc<dyn Cache> = match &config.redis_url {
            Some(url) => match RedisCache::connect(url, config.cache_prefix.clone(), config.cache_ttl_secs).await {
                Ok(cache) => {
                    info!(prefix = %config.cache_prefix, ttl_secs = config.cache_ttl_secs, "Redis cache enabled");
                    Arc::new(cache)
                }
                Err(e) => {
                    warn!(error = %e, "Redis unavailable, continuing without cache");
                    Arc::new(NoopCache)
                }
            },
            None => Arc::new(NoopCache),
        };

        let services = Services::new(store, GameConfig::from_env());
        Ok(Self::new(config, services, jwt).with_cache(cache))
    }

    /// Get service uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }

    /// Increment request counter
    pub fn increment_requests(&self) -> u64 {
        self.request_counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn request_count(&self) -> u64 {
        self.request_counter.load(Ordering::Relaxed)
    }

    /// Returns the new in-flight count
    pub fn request_started(&self) -> u64 {
        self.active_requests.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Returns the new in-flight count
    pub fn request_finished(&self) -> u64 {
        self.active_requests.fetch_sub(1, Ordering::Relaxed).saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> AppState {
        let jwt = JwtConfig::try_new("state-test-secret-0123456789abcdef", 60).unwrap();
        AppState::in_memory(ApiConfig::default(), jwt)
    }

    #[test]
    fn test_request_counters() {
        let state = test_state();
        assert_eq!(state.increment_requests(), 1);
        assert_eq!(state.increment_requests(), 2);
        assert_eq!(state.request_count(), 2);

        assert_eq!(state.request_started(), 1);
        assert_eq!(state.request_started(), 2);
        assert_eq!(state.request_finished(), 1);
    }

    #[test]
    fn test_defaults() {
        let state = test_state();
        assert_eq!(state.cache.backend(), "none");
        assert_eq!(state.gateway.contract(), "simulated");
        assert!(state.metrics.is_none());
        assert_eq!(state.services.store.backend(), "memory");
    }

    #[tokio::test]
    async fn test_from_config_requires_secret() {
        let result = AppState::from_config(ApiConfig::default()).await;
        assert!(matches!(result, Err(ApiError::ValidationError { .. })));
    }
}
