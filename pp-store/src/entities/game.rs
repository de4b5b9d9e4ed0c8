//! Mission and badge rows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mission catalog row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MissionEntity {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// once | daily | weekly
    pub cadence: String,
    pub target: i64,
    pub reward_tokens: i64,
    pub reward_experience: i64,
    pub reward_influence: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMission {
    pub title: String,
    pub description: String,
    pub cadence: String,
    pub target: i64,
    pub reward_tokens: i64,
    pub reward_experience: i64,
    pub reward_influence: i64,
}

impl MissionEntity {
    pub fn new(new: NewMission, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            cadence: new.cadence,
            target: new.target,
            reward_tokens: new.reward_tokens,
            reward_experience: new.reward_experience,
            reward_influence: new.reward_influence,
            is_active: true,
            created_at: now,
        }
    }
}

/// Progress of one player on one mission within one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MissionProgressEntity {
    pub player_id: Uuid,
    pub mission_id: Uuid,
    pub period_key: String,
    pub progress: i64,
    pub completed_at: Option<DateTime<Utc>>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl MissionProgressEntity {
    pub fn empty(player_id: Uuid, mission_id: Uuid, period_key: &str, now: DateTime<Utc>) -> Self {
        Self {
            player_id,
            mission_id,
            period_key: period_key.to_string(),
            progress: 0,
            completed_at: None,
            claimed_at: None,
            updated_at: now,
        }
    }

    /// Add `amount`, capped at `target`; marks completion the first time the target is hit
    pub fn advance(&mut self, amount: i64, target: i64, now: DateTime<Utc>) {
        self.progress = self.progress.saturating_add(amount.max(0)).min(target);
        if self.progress >= target && self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
        self.updated_at = now;
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed_at.is_some()
    }
}

/// Badge catalog row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BadgeEntity {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: String,
    /// level | power_tokens | total_taps | referrals | habit_streak | diamond_tier
    pub requirement: String,
    pub threshold: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBadge {
    pub code: String,
    pub name: String,
    pub description: String,
    pub requirement: String,
    pub threshold: i64,
}

impl BadgeEntity {
    pub fn new(new: NewBadge, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: new.code,
            name: new.name,
            description: new.description,
            requirement: new.requirement,
            threshold: new.threshold,
            created_at: now,
        }
    }
}

/// A badge held by a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlayerBadgeEntity {
    pub player_id: Uuid,
    pub badge_id: Uuid,
    pub code: String,
    pub name: String,
    pub description: String,
    pub awarded_at: DateTime<Utc>,
}
