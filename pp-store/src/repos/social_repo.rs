//! Social Repository: communities, chat, competitions, referrals

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entities::{
    ChatMessageEntity, CommunityEntity, CommunityMemberEntity, CompetitionEntity,
    CompetitionEntryEntity, LedgerEntry, NewCommunity, NewCompetition, NewReferral, PlayerEntity,
    ReferralEntity,
};
use crate::error::StoreResult;

/// Entry step: competition and joining player
pub type CompetitionMutation<'a> = Box<
    dyn FnOnce(&mut CompetitionEntity, &mut PlayerEntity) -> StoreResult<Vec<LedgerEntry>>
        + Send
        + 'a,
>;

/// Finalize step: competition and its top entrant, if any
pub type FinalizeMutation<'a> = Box<
    dyn FnOnce(&mut CompetitionEntity, Option<&mut PlayerEntity>) -> StoreResult<Vec<LedgerEntry>>
        + Send
        + 'a,
>;

#[async_trait]
pub trait SocialRepository: Send + Sync {
    /// Insert the community with its owner as first member; conflicts on a duplicate name
    async fn create_community(&self, new: NewCommunity) -> StoreResult<CommunityEntity>;

    async fn get_community(&self, id: Uuid) -> StoreResult<Option<CommunityEntity>>;

    /// Largest first
    async fn list_communities(&self, limit: i64) -> StoreResult<Vec<CommunityEntity>>;

    /// Conflicts when already a member
    async fn add_member(
        &self,
        community_id: Uuid,
        player_id: Uuid,
    ) -> StoreResult<CommunityMemberEntity>;

    async fn remove_member(&self, community_id: Uuid, player_id: Uuid) -> StoreResult<()>;

    async fn get_member(
        &self,
        community_id: Uuid,
        player_id: Uuid,
    ) -> StoreResult<Option<CommunityMemberEntity>>;

    async fn list_members(
        &self,
        community_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<CommunityMemberEntity>>;

    async fn post_message(&self, message: ChatMessageEntity) -> StoreResult<ChatMessageEntity>;

    /// Newest first, strictly older than `before` when given
    async fn list_messages(
        &self,
        community_id: Uuid,
        before: Option<DateTime<Utc>>,
        limit: i64,
    ) -> StoreResult<Vec<ChatMessageEntity>>;

    async fn create_competition(&self, new: NewCompetition) -> StoreResult<CompetitionEntity>;

    async fn get_competition(&self, id: Uuid) -> StoreResult<Option<CompetitionEntity>>;

    /// Soonest ending first
    async fn list_competitions(&self, limit: i64) -> StoreResult<Vec<CompetitionEntity>>;

    /// Atomically enter a competition; conflicts when already entered
    async fn join_competition<'a>(
        &self,
        competition_id: Uuid,
        player_id: Uuid,
        mutation: CompetitionMutation<'a>,
    ) -> StoreResult<CompetitionEntryEntity>;

    async fn get_entry(
        &self,
        competition_id: Uuid,
        player_id: Uuid,
    ) -> StoreResult<Option<CompetitionEntryEntity>>;

    /// Keep the higher of the stored and submitted score
    async fn submit_score(
        &self,
        competition_id: Uuid,
        player_id: Uuid,
        score: i64,
    ) -> StoreResult<CompetitionEntryEntity>;

    /// Highest score first, earliest entrant wins ties
    async fn standings(
        &self,
        competition_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<CompetitionEntryEntity>>;

    /// Atomically settle a competition against its current leader
    async fn finalize_competition<'a>(
        &self,
        competition_id: Uuid,
        mutation: FinalizeMutation<'a>,
    ) -> StoreResult<CompetitionEntity>;

    /// Atomically record a referral; the mutation receives (referrer, referee).
    /// Conflicts when the referee was already referred.
    async fn apply_referral<'a>(
        &self,
        referral: NewReferral,
        mutation: crate::repos::PairMutation<'a>,
    ) -> StoreResult<ReferralEntity>;

    async fn list_referrals(&self, referrer_id: Uuid) -> StoreResult<Vec<ReferralEntity>>;

    async fn count_referrals(&self, referrer_id: Uuid) -> StoreResult<i64>;
}
