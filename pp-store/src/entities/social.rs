//! Communities, chat, competitions and referrals

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommunityEntity {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub owner_id: Uuid,
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCommunity {
    pub name: String,
    pub description: String,
    pub owner_id: Uuid,
}

impl CommunityEntity {
    pub fn new(new: NewCommunity, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            owner_id: new.owner_id,
            member_count: 1,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommunityMemberEntity {
    pub community_id: Uuid,
    pub player_id: Uuid,
    /// owner | member
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatMessageEntity {
    pub id: Uuid,
    pub community_id: Uuid,
    pub player_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessageEntity {
    pub fn new(community_id: Uuid, player_id: Uuid, content: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            community_id,
            player_id,
            content,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CompetitionEntity {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub creator_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub entry_fee: i64,
    pub prize_pool: i64,
    pub winner_id: Option<Uuid>,
    pub finalized_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCompetition {
    pub name: String,
    pub description: String,
    pub creator_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub entry_fee: i64,
    /// Seed prize pool funded by the platform
    pub prize_pool: i64,
}

impl CompetitionEntity {
    pub fn new(new: NewCompetition, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            creator_id: new.creator_id,
            starts_at: new.starts_at,
            ends_at: new.ends_at,
            entry_fee: new.entry_fee,
            prize_pool: new.prize_pool,
            winner_id: None,
            finalized_at: None,
            created_at: now,
        }
    }

    pub fn status(&self, now: DateTime<Utc>) -> pp_core::CompetitionStatus {
        pp_core::CompetitionStatus::at(
            self.starts_at,
            self.ends_at,
            self.finalized_at.is_some(),
            now,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CompetitionEntryEntity {
    pub competition_id: Uuid,
    pub player_id: Uuid,
    pub score: i64,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CompetitionEntryEntity {
    pub fn new(competition_id: Uuid, player_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            competition_id,
            player_id,
            score: 0,
            joined_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReferralEntity {
    pub referrer_id: Uuid,
    pub referee_id: Uuid,
    pub referrer_reward: i64,
    pub referee_reward: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReferral {
    pub referrer_id: Uuid,
    pub referee_id: Uuid,
    pub referrer_reward: i64,
    pub referee_reward: i64,
}

impl ReferralEntity {
    pub fn new(new: NewReferral, now: DateTime<Utc>) -> Self {
        Self {
            referrer_id: new.referrer_id,
            referee_id: new.referee_id,
            referrer_reward: new.referrer_reward,
            referee_reward: new.referee_reward,
            created_at: now,
        }
    }
}
