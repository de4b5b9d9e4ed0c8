//! Analytics Service
//!
//! Read-only platform figures for the admin dashboard.

use chrono::{DateTime, Duration, Utc};
use pp_core::GameConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::entities::{DailyActivity, PlatformTotals, PlayerEntity};
use crate::error::{StoreError, StoreResult};
use crate::repos::Store;

pub const MAX_DAILY_WINDOW: i64 = 90;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsOverview {
    #[serde(flatten)]
    pub totals: PlatformTotals,
    /// Share of players active in the last 24 hours, in percent
    pub active_ratio_pct: f64,
    pub backend: String,
    pub generated_at: DateTime<Utc>,
}

pub struct AnalyticsService {
    store: Arc<dyn Store>,
    config: GameConfig,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn Store>, config: GameConfig) -> Self {
        Self { store, config }
    }

    pub async fn overview(&self) -> StoreResult<AnalyticsOverview> {
        let now = Utc::now();
        let totals = self.store.platform_totals(now).await?;
        let active_ratio_pct = if totals.total_players > 0 {
            totals.active_players_24h as f64 * 100.0 / totals.total_players as f64
        } else {
            0.0
        };
        Ok(AnalyticsOverview {
            totals,
            active_ratio_pct,
            backend: self.store.backend().to_string(),
            generated_at: now,
        })
    }

    /// Activity for the last `days` days, oldest first; quiet days are omitted
    pub async fn daily(&self, days: i64) -> StoreResult<Vec<DailyActivity>> {
        if !(1..=MAX_DAILY_WINDOW).contains(&days) {
            return Err(StoreError::validation(format!(
                "days must be between 1 and {}",
                MAX_DAILY_WINDOW
            )));
        }
        let since = (Utc::now() - Duration::days(days - 1)).date_naive();
        self.store.daily_activity(since).await
    }

    pub async fn players(&self, limit: Option<i64>, offset: Option<i64>) -> StoreResult<Vec<PlayerEntity>> {
        self.store
            .list_players(self.config.page_size(limit), offset.unwrap_or(0).max(0))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{funded_player, memory_store};

    #[tokio::test]
    async fn test_overview_counts_players_and_volume() {
        let store = memory_store();
        let analytics = AnalyticsService::new(store.clone(), GameConfig::default());
        funded_player(&store, 1, 100).await;
        funded_player(&store, 2, 50).await;

        let overview = analytics.overview().await.unwrap();
        assert_eq!(overview.totals.total_players, 2);
        assert_eq!(overview.totals.total_power_tokens, 150);
        assert_eq!(overview.totals.token_transactions, 2);
        assert_eq!(overview.totals.token_volume, 150);
        assert_eq!(overview.backend, "memory");
        assert!(overview.active_ratio_pct > 99.0);
    }

    #[tokio::test]
    async fn test_daily_window_bounds() {
        let store = memory_store();
        let analytics = AnalyticsService::new(store.clone(), GameConfig::default());
        funded_player(&store, 1, 10).await;

        let rows = analytics.daily(7).await.unwrap();
        let today = rows.iter().find(|r| r.day == Utc::now().date_naive()).unwrap();
        assert_eq!(today.new_players, 1);
        assert_eq!(today.token_transactions, 1);

        assert!(analytics.daily(0).await.is_err());
        assert!(analytics.daily(MAX_DAILY_WINDOW + 1).await.is_err());
    }

    #[tokio::test]
    async fn test_players_paging() {
        let store = memory_store();
        let analytics = AnalyticsService::new(store.clone(), GameConfig::default());
        for id in 0..3 {
            funded_player(&store, id, 0).await;
        }
        assert_eq!(analytics.players(Some(2), None).await.unwrap().len(), 2);
        assert_eq!(analytics.players(Some(2), Some(2)).await.unwrap().len(), 1);
    }
}
