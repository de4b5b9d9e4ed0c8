//! Player Repository

use async_trait::async_trait;
use pp_core::LeaderboardMetric;
use uuid::Uuid;

use crate::entities::{LedgerEntry, NewPlayer, PlayerEntity};
use crate::error::StoreResult;

/// Read-modify-write of one player row
pub type PlayerMutation<'a> =
    Box<dyn FnOnce(&mut PlayerEntity) -> StoreResult<Vec<LedgerEntry>> + Send + 'a>;

/// Read-modify-write of two player rows, passed in argument order
pub type PairMutation<'a> = Box<
    dyn FnOnce(&mut PlayerEntity, &mut PlayerEntity) -> StoreResult<Vec<LedgerEntry>> + Send + 'a,
>;

#[async_trait]
pub trait PlayerRepository: Send + Sync {
    /// Insert a new player; conflicts on a duplicate telegram id
    async fn create_player(&self, new: NewPlayer) -> StoreResult<PlayerEntity>;

    async fn get_player(&self, id: Uuid) -> StoreResult<Option<PlayerEntity>>;

    async fn get_player_by_telegram(&self, telegram_id: i64) -> StoreResult<Option<PlayerEntity>>;

    async fn get_player_by_referral_code(&self, code: &str) -> StoreResult<Option<PlayerEntity>>;

    /// Players ordered by creation time
    async fn list_players(&self, limit: i64, offset: i64) -> StoreResult<Vec<PlayerEntity>>;

    /// Top players by metric, descending
    async fn leaderboard(
        &self,
        metric: LeaderboardMetric,
        limit: i64,
    ) -> StoreResult<Vec<PlayerEntity>>;

    /// Atomically update one player and append the returned ledger rows
    async fn mutate_player<'a>(
        &self,
        id: Uuid,
        mutation: PlayerMutation<'a>,
    ) -> StoreResult<PlayerEntity>;

    /// Atomically update two distinct players; rows are locked in id order
    async fn mutate_pair<'a>(
        &self,
        first: Uuid,
        second: Uuid,
        mutation: PairMutation<'a>,
    ) -> StoreResult<(PlayerEntity, PlayerEntity)>;
}
