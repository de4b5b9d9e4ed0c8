use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pp_core::CommunityRole;
use uuid::Uuid;

use super::{newest_first, MemoryStore};
use crate::entities::*;
use crate::error::{StoreError, StoreResult};
use crate::repos::{CompetitionMutation, FinalizeMutation, PairMutation, SocialRepository};

fn rank_entries(entries: &mut [CompetitionEntryEntity]) {
    entries.sort_by(|a, b| b.score.cmp(&a.score).then(a.joined_at.cmp(&b.joined_at)));
}

#[async_trait]
impl SocialRepository for MemoryStore {
    async fn create_community(&self, new: NewCommunity) -> StoreResult<CommunityEntity> {
        let mut state = self.state.write().await;
        if state
            .communities
            .values()
            .any(|c| c.name.eq_ignore_ascii_case(&new.name))
        {
            return Err(StoreError::conflict(format!(
                "community {} already exists",
                new.name
            )));
        }

        let community = CommunityEntity::new(new, Utc::now());
        state.members.insert(
            (community.id, community.owner_id),
            CommunityMemberEntity {
                community_id: community.id,
                player_id: community.owner_id,
                role: CommunityRole::Owner.as_str().to_string(),
                joined_at: community.created_at,
            },
        );
        state.communities.insert(community.id, community.clone());
        Ok(community)
    }

    async fn get_community(&self, id: Uuid) -> StoreResult<Option<CommunityEntity>> {
        Ok(self.state.read().await.communities.get(&id).cloned())
    }

    async fn list_communities(&self, limit: i64) -> StoreResult<Vec<CommunityEntity>> {
        let state = self.state.read().await;
        let mut communities: Vec<_> = state.communities.values().cloned().collect();
        communities.sort_by(|a, b| {
            b.member_count
                .cmp(&a.member_count)
                .then(a.created_at.cmp(&b.created_at))
        });
        communities.truncate(limit.max(0) as usize);
        Ok(communities)
    }

    async fn add_member(
        &self,
        community_id: Uuid,
        player_id: Uuid,
    ) -> StoreResult<CommunityMemberEntity> {
        let mut state = self.state.write().await;
        if !state.communities.contains_key(&community_id) {
            return Err(StoreError::not_found("Community", community_id));
        }
        if state.members.contains_key(&(community_id, player_id)) {
            return Err(StoreError::conflict("already a member of this community"));
        }

        let member = CommunityMemberEntity {
            community_id,
            player_id,
            role: CommunityRole::Member.as_str().to_string(),
            joined_at: Utc::now(),
        };
        state.members.insert((community_id, player_id), member.clone());
        if let Some(community) = state.communities.get_mut(&community_id) {
            community.member_count += 1;
        }
        Ok(member)
    }

    async fn remove_member(&self, community_id: Uuid, player_id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.members.remove(&(community_id, player_id)).is_none() {
            return Err(StoreError::not_found(
                "CommunityMember",
                format!("{}/{}", community_id, player_id),
            ));
        }
        if let Some(community) = state.communities.get_mut(&community_id) {
            community.member_count = (community.member_count - 1).max(0);
        }
        Ok(())
    }

    async fn get_member(
        &self,
        community_id: Uuid,
        player_id: Uuid,
    ) -> StoreResult<Option<CommunityMemberEntity>> {
        let state = self.state.read().await;
        Ok(state.members.get(&(community_id, player_id)).cloned())
    }

    async fn list_members(
        &self,
        community_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<CommunityMemberEntity>> {
        let state = self.state.read().await;
        let mut members: Vec<_> = state
            .members
            .values()
            .filter(|m| m.community_id == community_id)
            .cloned()
            .collect();
        members.sort_by_key(|m| m.joined_at);
        members.truncate(limit.max(0) as usize);
        Ok(members)
    }

    async fn post_message(&self, message: ChatMessageEntity) -> StoreResult<ChatMessageEntity> {
        let mut state = self.state.write().await;
        if !state.communities.contains_key(&message.community_id) {
            return Err(StoreError::not_found("Community", message.community_id));
        }
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn list_messages(
        &self,
        community_id: Uuid,
        before: Option<DateTime<Utc>>,
        limit: i64,
    ) -> StoreResult<Vec<ChatMessageEntity>> {
        let state = self.state.read().await;
        let rows = state
            .messages
            .iter()
            .filter(|m| m.community_id == community_id)
            .filter(|m| before.map_or(true, |cutoff| m.created_at < cutoff))
            .cloned()
            .collect();
        Ok(newest_first(rows, |m| m.created_at, limit))
    }

    async fn create_competition(&self, new: NewCompetition) -> StoreResult<CompetitionEntity> {
        let competition = CompetitionEntity::new(new, Utc::now());
        self.state
            .write()
            .await
            .competitions
            .insert(competition.id, competition.clone());
        Ok(competition)
    }

    async fn get_competition(&self, id: Uuid) -> StoreResult<Option<CompetitionEntity>> {
        Ok(self.state.read().await.competitions.get(&id).cloned())
    }

    async fn list_competitions(&self, limit: i64) -> StoreResult<Vec<CompetitionEntity>> {
        let state = self.state.read().await;
        let mut competitions: Vec<_> = state.competitions.values().cloned().collect();
        competitions.sort_by_key(|c| c.ends_at);
        competitions.truncate(limit.max(0) as usize);
        Ok(competitions)
    }

    async fn join_competition<'a>(
        &self,
        competition_id: Uuid,
        player_id: Uuid,
        mutation: CompetitionMutation<'a>,
    ) -> StoreResult<CompetitionEntryEntity> {
        let mut state = self.state.write().await;
        let mut competition = state
            .competitions
            .get(&competition_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Competition", competition_id))?;
        if state.entries.contains_key(&(competition_id, player_id)) {
            return Err(StoreError::conflict("already entered this competition"));
        }
        let mut player = state.player(player_id)?;
        let entries = mutation(&mut competition, &mut player)?;

        let now = Utc::now();
        let entry = CompetitionEntryEntity::new(competition_id, player_id, now);
        state.append_ledger(entries, now);
        state.competitions.insert(competition.id, competition);
        state
            .entries
            .insert((competition_id, player_id), entry.clone());
        state.commit_player(player, now);
        Ok(entry)
    }

    async fn get_entry(
        &self,
        competition_id: Uuid,
        player_id: Uuid,
    ) -> StoreResult<Option<CompetitionEntryEntity>> {
        let state = self.state.read().await;
        Ok(state.entries.get(&(competition_id, player_id)).cloned())
    }

    async fn submit_score(
        &self,
        competition_id: Uuid,
        player_id: Uuid,
        score: i64,
    ) -> StoreResult<CompetitionEntryEntity> {
        let mut state = self.state.write().await;
        let entry = state
            .entries
            .get_mut(&(competition_id, player_id))
            .ok_or_else(|| {
                StoreError::not_found(
                    "CompetitionEntry",
                    format!("{}/{}", competition_id, player_id),
                )
            })?;
        entry.score = entry.score.max(score);
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn standings(
        &self,
        competition_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<CompetitionEntryEntity>> {
        let state = self.state.read().await;
        let mut entries: Vec<_> = state
            .entries
            .values()
            .filter(|e| e.competition_id == competition_id)
            .cloned()
            .collect();
        rank_entries(&mut entries);
        entries.truncate(limit.max(0) as usize);
        Ok(entries)
    }

    async fn finalize_competition<'a>(
        &self,
        competition_id: Uuid,
        mutation: FinalizeMutation<'a>,
    ) -> StoreResult<CompetitionEntity> {
        let mut state = self.state.write().await;
        let mut competition = state
            .competitions
            .get(&competition_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Competition", competition_id))?;

        let mut entries: Vec<_> = state
            .entries
            .values()
            .filter(|e| e.competition_id == competition_id)
            .cloned()
            .collect();
        rank_entries(&mut entries);
        let mut leader = match entries.first() {
            Some(entry) => Some(state.player(entry.player_id)?),
            None => None,
        };

        let ledger = mutation(&mut competition, leader.as_mut())?;

        let now = Utc::now();
        state.append_ledger(ledger, now);
        state.competitions.insert(competition.id, competition.clone());
        if let Some(player) = leader {
            state.commit_player(player, now);
        }
        Ok(competition)
    }

    async fn apply_referral<'a>(
        &self,
        referral: NewReferral,
        mutation: PairMutation<'a>,
    ) -> StoreResult<ReferralEntity> {
        let mut state = self.state.write().await;
        if referral.referrer_id == referral.referee_id {
            return Err(StoreError::validation("cannot refer yourself"));
        }
        if state.referrals.contains_key(&referral.referee_id) {
            return Err(StoreError::conflict("a referral code was already applied"));
        }

        let mut referrer = state.player(referral.referrer_id)?;
        let mut referee = state.player(referral.referee_id)?;
        let entries = mutation(&mut referrer, &mut referee)?;

        let now = Utc::now();
        let row = ReferralEntity::new(referral, now);
        state.append_ledger(entries, now);
        state.referrals.insert(row.referee_id, row.clone());
        state.commit_player(referrer, now);
        state.commit_player(referee, now);
        Ok(row)
    }

    async fn list_referrals(&self, referrer_id: Uuid) -> StoreResult<Vec<ReferralEntity>> {
        let state = self.state.read().await;
        let rows = state
            .referrals
            .values()
            .filter(|r| r.referrer_id == referrer_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |r| r.created_at, i64::MAX))
    }

    async fn count_referrals(&self, referrer_id: Uuid) -> StoreResult<i64> {
        let state = self.state.read().await;
        Ok(state
            .referrals
            .values()
            .filter(|r| r.referrer_id == referrer_id)
            .count() as i64)
    }
}
