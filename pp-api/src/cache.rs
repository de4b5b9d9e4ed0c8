//! Read-through cache
//!
//! Player stats, leaderboards and the static catalogs are cached as JSON
//! under prefixed keys with a TTL. Redis is optional: with no URL the API
//! runs on [`NoopCache`], and a Redis error is logged and treated as a miss,
//! so the store is always the source of truth.

use async_trait::async_trait;
use pp_core::logging::operations;
use pp_core::LeaderboardMetric;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::metrics::record_cache_lookup;

/// Cache keys, before the backend prefix
pub mod keys {
    use super::*;

    pub const SHOP_ITEMS: &str = "shop:items";
    pub const BADGES: &str = "badges:catalog";

    pub fn stats(player_id: Uuid) -> String {
        format!("stats:{}", player_id)
    }

    pub fn leaderboard(metric: LeaderboardMetric, limit: i64) -> String {
        format!("leaderboard:{}:{}", metric.as_str(), limit)
    }

    pub fn missions(player_id: Uuid) -> String {
        format!("missions:{}", player_id)
    }
}

#[async_trait]
pub trait Cache: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn get_raw(&self, key: &str) -> Option<String>;

    async fn set_raw(&self, key: &str, value: String);

    async fn invalidate(&self, key: &str);
}

impl dyn Cache {
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_raw(key).await;
        record_cache_lookup(raw.is_some());
        let raw = raw?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(cache_key = key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    pub async fn set_json<T: Serialize + Sync>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set_raw(key, raw).await,
            Err(e) => warn!(cache_key = key, error = %e, "Value not cacheable"),
        }
    }

    /// Return the cached value or load, store and return a fresh one
    pub async fn get_or_load<T, E, F, Fut>(&self, key: &str, load: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get_json(key).await {
            return Ok(hit);
        }
        let fresh = load().await?;
        self.set_json(key, &fresh).await;
        Ok(fresh)
    }

    pub async fn invalidate_all(&self, keys: &[String]) {
        for key in keys {
            self.invalidate(key).await;
        }
    }
}

/// Cache that never hits
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

#[async_trait]
impl Cache for NoopCache {
    fn backend(&self) -> &'static str {
        "none"
    }

    async fn get_raw(&self, _key: &str) -> Option<String> {
        None
    }

    async fn set_raw(&self, _key: &str, _value: String) {}

    async fn invalidate(&self, _key: &str) {}
}

/// Redis-backed cache
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    prefix: String,
    ttl_secs: u64,
}

impl RedisCache {
    pub async fn connect(url: &str, prefix: impl Into<String>, ttl_secs: u64) -> redis::RedisResult<Self> {
        let client = redis::Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        Ok(Self {
            connection,
            prefix: prefix.into(),
            ttl_secs: ttl_secs.max(1),
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[async_trait]
impl Cache for RedisCache {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn get_raw(&self, key: &str) -> Option<String> {
        let mut conn = self.connection.clone();
        match conn.get::<_, Option<String>>(self.key(key)).await {
            Ok(value) => {
                debug!(cache_key = key, operation = operations::CACHE_GET, hit = value.is_some(), "Cache lookup");
                value
            }
            Err(e) => {
                warn!(cache_key = key, error = %e, "Cache read failed");
                None
            }
        }
    }

    async fn set_raw(&self, key: &str, value: String) {
        let mut conn = self.connection.clone();
        if let Err(e) = conn.set_ex::<_, _, ()>(self.key(key), value, self.ttl_secs).await {
            warn!(cache_key = key, operation = operations::CACHE_SET, error = %e, "Cache write failed");
        }
    }

    async fn invalidate(&self, key: &str) {
        let mut conn = self.connection.clone();
        if let Err(e) = conn.del::<_, ()>(self.key(key)).await {
            warn!(cache_key = key, error = %e, "Cache invalidation failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MapCache(Mutex<HashMap<String, String>>);

    #[async_trait]
    impl Cache for MapCache {
        fn backend(&self) -> &'static str {
            "map"
        }

        async fn get_raw(&self, key: &str) -> Option<String> {
            self.0.lock().await.get(key).cloned()
        }

        async fn set_raw(&self, key: &str, value: String) {
            self.0.lock().await.insert(key.to_string(), value);
        }

        async fn invalidate(&self, key: &str) {
            self.0.lock().await.remove(key);
        }
    }

    #[tokio::test]
    async fn test_get_or_load_reads_through() {
        let cache: Box<dyn Cache> = Box::new(MapCache::default());
        let mut loads = 0;

        for _ in 0..2 {
            let value: Result<Vec<i64>, ()> = cache
                .get_or_load("numbers", || {
                    loads += 1;
                    async { Ok(vec![1, 2, 3]) }
                })
                .await;
            assert_eq!(value.unwrap(), vec![1, 2, 3]);
        }
        assert_eq!(loads, 1);

        cache.invalidate("numbers").await;
        assert!(cache.get_json::<Vec<i64>>("numbers").await.is_none());
    }

    #[tokio::test]
    async fn test_noop_cache_always_loads() {
        let cache: Box<dyn Cache> = Box::new(NoopCache);
        cache.set_json("k", &1).await;
        assert!(cache.get_json::<i64>("k").await.is_none());
    }

    #[tokio::test]
    async fn test_load_errors_are_not_cached() {
        let cache: Box<dyn Cache> = Box::new(MapCache::default());
        let result: Result<i64, &str> = cache.get_or_load("k", || async { Err("boom") }).await;
        assert!(result.is_err());
        assert!(cache.get_raw("k").await.is_none());
    }

    #[test]
    fn test_key_layout() {
        let id = Uuid::nil();
        assert_eq!(keys::stats(id), format!("stats:{}", id));
        assert_eq!(
            keys::leaderboard(LeaderboardMetric::Level, 10),
            "leaderboard:level:10"
        );
    }
}
