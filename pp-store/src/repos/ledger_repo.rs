//! Ledger Repository

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::entities::{DailyActivity, DiamondTransactionEntity, PlatformTotals, TokenTransactionEntity};
use crate::error::StoreResult;

#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Newest first
    async fn list_token_transactions(
        &self,
        player_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<TokenTransactionEntity>>;

    /// Newest first
    async fn list_diamond_transactions(
        &self,
        player_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<DiamondTransactionEntity>>;

    async fn platform_totals(&self, now: DateTime<Utc>) -> StoreResult<PlatformTotals>;

    /// One row per day from `since` onwards, oldest first; days without activity are omitted
    async fn daily_activity(&self, since: NaiveDate) -> StoreResult<Vec<DailyActivity>>;
}
