//! Social Service
//!
//! Communities with chat, competitions with entry fees and a prize pool,
//! and referrals.

use chrono::{DateTime, Utc};
use pp_core::logging::operations;
use pp_core::{CommunityRole, CompetitionStatus, CoreError, GameConfig, TransactionKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::entities::{
    ChatMessageEntity, CommunityEntity, CommunityMemberEntity, CompetitionEntity,
    CompetitionEntryEntity, NewCommunity, NewCompetition, NewReferral, PlayerEntity,
    ReferralEntity,
};
use crate::error::{StoreError, StoreResult};
use crate::repos::Store;
use crate::services::badges::evaluate_badges;

pub const MAX_COMMUNITY_NAME_LEN: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralOutcome {
    pub referral: ReferralEntity,
    pub referrer_id: Uuid,
    pub reward: i64,
}

/// Social Service
pub struct SocialService {
    store: Arc<dyn Store>,
    config: GameConfig,
}

impl SocialService {
    pub fn new(store: Arc<dyn Store>, config: GameConfig) -> Self {
        Self { store, config }
    }

    // ==================== communities ====================

    /// Create a community; the creator joins as owner
    pub async fn create_community(
        &self,
        owner_id: Uuid,
        name: &str,
        description: &str,
    ) -> StoreResult<CommunityEntity> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_COMMUNITY_NAME_LEN {
            return Err(StoreError::validation(format!(
                "community name must be 1 to {} characters",
                MAX_COMMUNITY_NAME_LEN
            )));
        }
        let community = self
            .store
            .create_community(NewCommunity {
                name: name.to_string(),
                description: description.trim().to_string(),
                owner_id,
            })
            .await?;
        info!(player_id = %owner_id, community_id = %community.id, "Community created");
        Ok(community)
    }

    pub async fn get_community(&self, id: Uuid) -> StoreResult<CommunityEntity> {
        self.store
            .get_community(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Community", id))
    }

    pub async fn list_communities(&self, limit: Option<i64>) -> StoreResult<Vec<CommunityEntity>> {
        self.store
            .list_communities(self.config.page_size(limit))
            .await
    }

    pub async fn join_community(
        &self,
        community_id: Uuid,
        player_id: Uuid,
    ) -> StoreResult<CommunityMemberEntity> {
        self.store.add_member(community_id, player_id).await
    }

    pub async fn leave_community(&self, community_id: Uuid, player_id: Uuid) -> StoreResult<()> {
        let member = self
            .store
            .get_member(community_id, player_id)
            .await?
            .ok_or_else(|| StoreError::not_found("CommunityMember", player_id))?;
        if CommunityRole::parse(&member.role)? == CommunityRole::Owner {
            return Err(StoreError::forbidden("the owner cannot leave their community"));
        }
        self.store.remove_member(community_id, player_id).await
    }

    pub async fn members(
        &self,
        community_id: Uuid,
        limit: Option<i64>,
    ) -> StoreResult<Vec<CommunityMemberEntity>> {
        self.get_community(community_id).await?;
        self.store
            .list_members(community_id, self.config.page_size(limit))
            .await
    }

    // ==================== chat ====================

    pub async fn post_message(
        &self,
        community_id: Uuid,
        player_id: Uuid,
        content: &str,
    ) -> StoreResult<ChatMessageEntity> {
        let content = content.trim();
        let len = content.chars().count();
        if len == 0 || len > self.config.max_message_len {
            return Err(StoreError::validation(format!(
                "message must be 1 to {} characters",
                self.config.max_message_len
            )));
        }
        self.require_member(community_id, player_id).await?;
        let message =
            ChatMessageEntity::new(community_id, player_id, content.to_string(), Utc::now());
        self.store.post_message(message).await
    }

    pub async fn messages(
        &self,
        community_id: Uuid,
        player_id: Uuid,
        before: Option<DateTime<Utc>>,
        limit: Option<i64>,
    ) -> StoreResult<Vec<ChatMessageEntity>> {
        self.require_member(community_id, player_id).await?;
        self.store
            .list_messages(community_id, before, self.config.page_size(limit))
            .await
    }

    async fn require_member(&self, community_id: Uuid, player_id: Uuid) -> StoreResult<()> {
        self.get_community(community_id).await?;
        match self.store.get_member(community_id, player_id).await? {
            Some(_) => Ok(()),
            None => Err(StoreError::forbidden("only members can use the community chat")),
        }
    }

    // ==================== competitions ====================

    /// Only admins may seed a prize pool; player-created competitions start empty
    pub async fn create_competition(
        &self,
        new: NewCompetition,
        is_admin: bool,
    ) -> StoreResult<CompetitionEntity> {
        if new.name.trim().is_empty() {
            return Err(StoreError::validation("competition name must not be empty"));
        }
        if new.ends_at <= new.starts_at {
            return Err(StoreError::validation("competition must end after it starts"));
        }
        if new.entry_fee < 0 || new.prize_pool < 0 {
            return Err(StoreError::validation("entry fee and prize pool must not be negative"));
        }
        if new.prize_pool > 0 && !is_admin {
            return Err(StoreError::forbidden("only admins can seed a prize pool"));
        }
        self.store.create_competition(new).await
    }

    pub async fn get_competition(&self, id: Uuid) -> StoreResult<CompetitionEntity> {
        self.store
            .get_competition(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Competition", id))
    }

    pub async fn list_competitions(&self, limit: Option<i64>) -> StoreResult<Vec<CompetitionEntity>> {
        self.store
            .list_competitions(self.config.page_size(limit))
            .await
    }

    /// Enter a competition; the entry fee moves into the prize pool
    pub async fn join_competition(
        &self,
        competition_id: Uuid,
        player_id: Uuid,
    ) -> StoreResult<CompetitionEntryEntity> {
        let now = Utc::now();
        let entry = self
            .store
            .join_competition(
                competition_id,
                player_id,
                Box::new(move |competition, p| {
                    match competition.status(now) {
                        CompetitionStatus::Upcoming | CompetitionStatus::Active => {}
                        status => {
                            return Err(CoreError::InvalidState(format!(
                                "competition is {}",
                                status.as_str()
                            ))
                            .into())
                        }
                    }
                    let mut entries = Vec::new();
                    if competition.entry_fee > 0 {
                        entries.push(p.debit_tokens(
                            competition.entry_fee,
                            TransactionKind::Competition,
                            format!("Entry fee: {}", competition.name),
                        )?);
                        competition.prize_pool += competition.entry_fee;
                    }
                    Ok(entries)
                }),
            )
            .await?;
        info!(player_id = %player_id, competition_id = %competition_id, "Competition joined");
        Ok(entry)
    }

    /// Record a score; the best score is kept
    pub async fn submit_score(
        &self,
        competition_id: Uuid,
        player_id: Uuid,
        score: i64,
    ) -> StoreResult<CompetitionEntryEntity> {
        if score < 0 {
            return Err(StoreError::validation("score must not be negative"));
        }
        let competition = self.get_competition(competition_id).await?;
        let status = competition.status(Utc::now());
        if status != CompetitionStatus::Active {
            return Err(CoreError::InvalidState(format!("competition is {}", status.as_str())).into());
        }
        self.store.submit_score(competition_id, player_id, score).await
    }

    pub async fn standings(
        &self,
        competition_id: Uuid,
        limit: Option<i64>,
    ) -> StoreResult<Vec<CompetitionEntryEntity>> {
        self.get_competition(competition_id).await?;
        self.store
            .standings(competition_id, self.config.page_size(limit))
            .await
    }

    /// Close an ended competition and pay the pool to the top entrant
    pub async fn finalize_competition(
        &self,
        competition_id: Uuid,
        caller_id: Uuid,
        is_admin: bool,
    ) -> StoreResult<CompetitionEntity> {
        let now = Utc::now();
        let competition = self
            .store
            .finalize_competition(
                competition_id,
                Box::new(move |competition, leader| {
                    if competition.creator_id != caller_id && !is_admin {
                        return Err(StoreError::forbidden(
                            "only the creator or an admin can finalize",
                        ));
                    }
                    match competition.status(now) {
                        CompetitionStatus::Ended => {}
                        CompetitionStatus::Finalized => {
                            return Err(CoreError::AlreadyCompleted(
                                "competition already finalized".to_string(),
                            )
                            .into())
                        }
                        status => {
                            return Err(CoreError::InvalidState(format!(
                                "competition is {}",
                                status.as_str()
                            ))
                            .into())
                        }
                    }

                    competition.finalized_at = Some(now);
                    let mut entries = Vec::new();
                    if let Some(winner) = leader {
                        competition.winner_id = Some(winner.id);
                        if competition.prize_pool > 0 {
                            entries.push(winner.credit_tokens(
                                competition.prize_pool,
                                TransactionKind::Competition,
                                format!("Won: {}", competition.name),
                            )?);
                        }
                        winner.touch(now);
                    }
                    Ok(entries)
                }),
            )
            .await?;

        info!(
            operation = operations::COMPETITION_FINALIZE,
            competition_id = %competition_id,
            amount = competition.prize_pool,
            winner = ?competition.winner_id,
            "Competition finalized"
        );
        Ok(competition)
    }

    // ==================== referrals ====================

    /// Apply another player's referral code; each player can do this once
    pub async fn apply_referral(&self, referee_id: Uuid, code: &str) -> StoreResult<ReferralOutcome> {
        let code = code.trim().to_uppercase();
        let referrer = self
            .store
            .get_player_by_referral_code(&code)
            .await?
            .ok_or_else(|| StoreError::not_found("ReferralCode", &code))?;
        if referrer.id == referee_id {
            return Err(StoreError::validation("cannot apply your own referral code"));
        }

        let referrer_reward = self.config.referrer_reward;
        let referee_reward = self.config.referee_reward;
        let now = Utc::now();
        let referral = self
            .store
            .apply_referral(
                NewReferral {
                    referrer_id: referrer.id,
                    referee_id,
                    referrer_reward,
                    referee_reward,
                },
                Box::new(move |referrer, referee| {
                    if referee.referred_by.is_some() {
                        return Err(StoreError::conflict("a referral code was already applied"));
                    }
                    referee.referred_by = Some(referrer.id);
                    referee.touch(now);
                    let mut entries = Vec::with_capacity(2);
                    if referrer_reward > 0 {
                        entries.push(
                            referrer
                                .credit_tokens(referrer_reward, TransactionKind::Referral, "Referral reward")?
                                .with_counterparty(referee.id),
                        );
                    }
                    if referee_reward > 0 {
                        entries.push(
                            referee
                                .credit_tokens(referee_reward, TransactionKind::Referral, "Welcome bonus")?
                                .with_counterparty(referrer.id),
                        );
                    }
                    Ok(entries)
                }),
            )
            .await?;

        info!(
            player_id = %referee_id,
            operation = operations::REFERRAL,
            amount = referee_reward,
            referrer_id = %referrer.id,
            "Referral applied"
        );
        if let Some(referrer) = self.store.get_player(referrer.id).await? {
            evaluate_badges(self.store.as_ref(), &referrer).await?;
        }

        Ok(ReferralOutcome {
            referrer_id: referral.referrer_id,
            reward: referee_reward,
            referral,
        })
    }

    pub async fn referrals(&self, referrer_id: Uuid) -> StoreResult<Vec<ReferralEntity>> {
        self.store.list_referrals(referrer_id).await
    }

    pub async fn get_player(&self, id: Uuid) -> StoreResult<PlayerEntity> {
        self.store
            .get_player(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Player", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{funded_player, memory_store};
    use chrono::Duration;

    fn service(store: Arc<dyn Store>) -> SocialService {
        SocialService::new(store, GameConfig::default())
    }

    fn competition(creator_id: Uuid, starts_in: i64, ends_in: i64, fee: i64) -> NewCompetition {
        let now = Utc::now();
        NewCompetition {
            name: "Tap sprint".to_string(),
            description: "Most taps wins".to_string(),
            creator_id,
            starts_at: now + Duration::seconds(starts_in),
            ends_at: now + Duration::seconds(ends_in),
            entry_fee: fee,
            prize_pool: 0,
        }
    }

    #[tokio::test]
    async fn test_community_membership_rules() {
        let store = memory_store();
        let social = service(store.clone());
        let owner = funded_player(&store, 1, 0).await;
        let member = funded_player(&store, 2, 0).await;

        let community = social
            .create_community(owner.id, "Builders", "We build")
            .await
            .unwrap();
        assert_eq!(community.member_count, 1);

        social.join_community(community.id, member.id).await.unwrap();
        assert!(matches!(
            social.join_community(community.id, member.id).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(matches!(
            social.leave_community(community.id, owner.id).await,
            Err(StoreError::Forbidden(_))
        ));

        let members = social.members(community.id, None).await.unwrap();
        assert_eq!(members.len(), 2);

        social.leave_community(community.id, member.id).await.unwrap();
        assert_eq!(social.get_community(community.id).await.unwrap().member_count, 1);
    }

    #[tokio::test]
    async fn test_chat_requires_membership_and_length() {
        let store = memory_store();
        let social = service(store.clone());
        let owner = funded_player(&store, 1, 0).await;
        let outsider = funded_player(&store, 2, 0).await;
        let community = social.create_community(owner.id, "Chatters", "").await.unwrap();

        social.post_message(community.id, owner.id, "hello").await.unwrap();
        assert!(matches!(
            social.post_message(community.id, outsider.id, "hi").await,
            Err(StoreError::Forbidden(_))
        ));
        assert!(matches!(
            social.post_message(community.id, owner.id, "   ").await,
            Err(StoreError::Validation(_))
        ));
        let long = "x".repeat(1001);
        assert!(social.post_message(community.id, owner.id, &long).await.is_err());

        let messages = social.messages(community.id, owner.id, None, None).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "hello");
    }

    #[tokio::test]
    async fn test_competition_fee_goes_to_pool_and_winner_is_paid() {
        let store = memory_store();
        let social = service(store.clone());
        let creator = funded_player(&store, 1, 0).await;
        let alice = funded_player(&store, 2, 100).await;
        let bob = funded_player(&store, 3, 100).await;

        let comp = social
            .create_competition(competition(creator.id, -10, 3600, 30), false)
            .await
            .unwrap();
        social.join_competition(comp.id, alice.id).await.unwrap();
        social.join_competition(comp.id, bob.id).await.unwrap();
        assert!(matches!(
            social.join_competition(comp.id, bob.id).await,
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(social.get_competition(comp.id).await.unwrap().prize_pool, 60);

        social.submit_score(comp.id, alice.id, 50).await.unwrap();
        social.submit_score(comp.id, bob.id, 80).await.unwrap();
        let entry = social.submit_score(comp.id, bob.id, 10).await.unwrap();
        assert_eq!(entry.score, 80);

        let standings = social.standings(comp.id, None).await.unwrap();
        assert_eq!(standings[0].player_id, bob.id);

        // still running
        assert!(matches!(
            social.finalize_competition(comp.id, creator.id, false).await,
            Err(StoreError::Rule(CoreError::InvalidState(_)))
        ));
    }

    #[tokio::test]
    async fn test_finalize_pays_top_entrant_once() {
        let memory = Arc::new(crate::memory::MemoryStore::new());
        let store: Arc<dyn Store> = memory.clone();
        let social = service(store.clone());
        let creator = funded_player(&store, 1, 0).await;
        let alice = funded_player(&store, 2, 100).await;
        let bob = funded_player(&store, 3, 100).await;

        let comp = social
            .create_competition(competition(creator.id, -10, 3600, 25), false)
            .await
            .unwrap();
        social.join_competition(comp.id, alice.id).await.unwrap();
        social.join_competition(comp.id, bob.id).await.unwrap();
        social.submit_score(comp.id, alice.id, 5).await.unwrap();
        social.submit_score(comp.id, bob.id, 9).await.unwrap();

        let now = Utc::now();
        memory
            .shift_competition(comp.id, now - Duration::hours(2), now - Duration::hours(1))
            .await;

        // an entrant who did not create it cannot close it
        assert!(matches!(
            social.finalize_competition(comp.id, alice.id, false).await,
            Err(StoreError::Forbidden(_))
        ));

        let done = social
            .finalize_competition(comp.id, creator.id, false)
            .await
            .unwrap();
        assert_eq!(done.winner_id, Some(bob.id));
        assert!(done.finalized_at.is_some());
        assert_eq!(social.get_player(bob.id).await.unwrap().power_tokens, 75 + 50);

        assert!(matches!(
            social.finalize_competition(comp.id, creator.id, true).await,
            Err(StoreError::Rule(CoreError::AlreadyCompleted(_)))
        ));
    }

    #[tokio::test]
    async fn test_player_cannot_seed_prize_pool() {
        let store = memory_store();
        let social = service(store.clone());
        let creator = funded_player(&store, 1, 0).await;
        let mut new = competition(creator.id, 0, 60, 0);
        new.prize_pool = 1000;
        assert!(matches!(
            social.create_competition(new.clone(), false).await,
            Err(StoreError::Forbidden(_))
        ));
        assert_eq!(social.create_competition(new, true).await.unwrap().prize_pool, 1000);
    }

    #[tokio::test]
    async fn test_referral_rewards_both_once() {
        let store = memory_store();
        let social = service(store.clone());
        let referrer = funded_player(&store, 1, 0).await;
        let referee = funded_player(&store, 2, 0).await;

        let outcome = social
            .apply_referral(referee.id, &referrer.referral_code.to_lowercase())
            .await
            .unwrap();
        assert_eq!(outcome.referrer_id, referrer.id);

        assert_eq!(social.get_player(referrer.id).await.unwrap().power_tokens, 500);
        let referee = social.get_player(referee.id).await.unwrap();
        assert_eq!(referee.power_tokens, 250);
        assert_eq!(referee.referred_by, Some(referrer.id));

        assert!(matches!(
            social.apply_referral(referee.id, &referrer.referral_code).await,
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(social.referrals(referrer.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_own_referral_code_rejected() {
        let store = memory_store();
        let social = service(store.clone());
        let player = funded_player(&store, 1, 0).await;
        assert!(matches!(
            social.apply_referral(player.id, &player.referral_code).await,
            Err(StoreError::Validation(_))
        ));
    }
}
