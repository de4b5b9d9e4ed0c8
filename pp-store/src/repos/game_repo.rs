//! Mission and Badge Repositories

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{
    BadgeEntity, LedgerEntry, MissionEntity, MissionProgressEntity, NewBadge, NewMission,
    PlayerBadgeEntity, PlayerEntity,
};
use crate::error::StoreResult;

/// Claim step: progress row (empty if never started) and the claiming player
pub type MissionClaimMutation<'a> = Box<
    dyn FnOnce(&mut MissionProgressEntity, &mut PlayerEntity) -> StoreResult<Vec<LedgerEntry>>
        + Send
        + 'a,
>;

#[async_trait]
pub trait MissionRepository: Send + Sync {
    async fn create_mission(&self, new: NewMission) -> StoreResult<MissionEntity>;

    async fn get_mission(&self, id: Uuid) -> StoreResult<Option<MissionEntity>>;

    async fn list_missions(&self, active_only: bool) -> StoreResult<Vec<MissionEntity>>;

    /// Progress rows of a player for the given period keys
    async fn list_progress(
        &self,
        player_id: Uuid,
        period_keys: &[String],
    ) -> StoreResult<Vec<MissionProgressEntity>>;

    /// Add progress, capped at `target`; creates the row on first progress
    async fn record_progress(
        &self,
        player_id: Uuid,
        mission_id: Uuid,
        period_key: &str,
        amount: i64,
        target: i64,
    ) -> StoreResult<MissionProgressEntity>;

    /// Atomically claim a mission reward
    async fn claim_mission<'a>(
        &self,
        player_id: Uuid,
        mission_id: Uuid,
        period_key: &str,
        mutation: MissionClaimMutation<'a>,
    ) -> StoreResult<(MissionProgressEntity, PlayerEntity)>;
}

#[async_trait]
pub trait BadgeRepository: Send + Sync {
    /// Conflicts on a duplicate code
    async fn create_badge(&self, new: NewBadge) -> StoreResult<BadgeEntity>;

    async fn list_badges(&self) -> StoreResult<Vec<BadgeEntity>>;

    /// Returns true when the badge was newly awarded
    async fn award_badge(&self, player_id: Uuid, badge_id: Uuid) -> StoreResult<bool>;

    async fn list_player_badges(&self, player_id: Uuid) -> StoreResult<Vec<PlayerBadgeEntity>>;
}
