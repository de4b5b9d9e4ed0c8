//! Game Service
//!
//! Registration, tapping, daily login, missions, badges and leaderboards.

use chrono::{DateTime, Utc};
use pp_core::logging::operations;
use pp_core::progression::level_progress;
use pp_core::{
    referral_code_for, spend_energy, validate_amount, BadgeRequirement, EnergyState, GameConfig,
    LeaderboardMetric, LevelChange, MissionCadence, TierBenefits, TransactionKind,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::entities::{
    BadgeEntity, MissionEntity, MissionProgressEntity, NewBadge, NewMission, NewPlayer,
    PlayerBadgeEntity, PlayerEntity, ProfileUpdate,
};
use crate::error::{StoreError, StoreResult};
use crate::repos::Store;
use crate::services::badges::evaluate_badges;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 32;

/// Result of a login call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginOutcome {
    pub player: PlayerEntity,
    pub created: bool,
}

/// Player with derived state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerStats {
    pub player: PlayerEntity,
    pub energy: EnergyState,
    pub level_floor_experience: i64,
    pub next_level_experience: i64,
    pub tier_benefits: TierBenefits,
    pub badges: usize,
    pub referrals: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapOutcome {
    pub taps_applied: i64,
    pub tokens_earned: i64,
    pub experience_gained: i64,
    pub level_change: LevelChange,
    pub energy: EnergyState,
    pub new_badges: Vec<BadgeEntity>,
    pub player: PlayerEntity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyLoginOutcome {
    pub reward: i64,
    pub player: PlayerEntity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub player_id: Uuid,
    pub username: String,
    pub level: i32,
    pub value: i64,
}

/// A mission with the caller's progress in the current period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionView {
    #[serde(flatten)]
    pub mission: MissionEntity,
    pub period_key: String,
    pub progress: i64,
    pub completed: bool,
    pub claimed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionClaim {
    pub progress: MissionProgressEntity,
    pub reward_tokens: i64,
    pub reward_experience: i64,
    pub player: PlayerEntity,
}

/// Game Service
pub struct GameService {
    store: Arc<dyn Store>,
    config: GameConfig,
}

impl GameService {
    pub fn new(store: Arc<dyn Store>, config: GameConfig) -> Self {
        Self { store, config }
    }

    /// Return the player for `telegram_id`, creating it on first login
    pub async fn login(&self, telegram_id: i64, username: &str) -> StoreResult<LoginOutcome> {
        let username = validate_username(username)?;
        let now = Utc::now();

        if let Some(player) = self.store.get_player_by_telegram(telegram_id).await? {
            let player = self
                .store
                .mutate_player(
                    player.id,
                    Box::new(move |p| {
                        p.touch(now);
                        Ok(Vec::new())
                    }),
                )
                .await?;
            return Ok(LoginOutcome {
                player,
                created: false,
            });
        }

        let id = Uuid::new_v4();
        let player = self
            .store
            .create_player(NewPlayer {
                id,
                telegram_id,
                username,
                display_name: None,
                referral_code: referral_code_for(&id),
                max_energy: self.config.max_energy,
            })
            .await?;
        info!(player_id = %player.id, operation = operations::REGISTER, "Player registered");
        Ok(LoginOutcome {
            player,
            created: true,
        })
    }

    pub async fn get_player(&self, id: Uuid) -> StoreResult<PlayerEntity> {
        self.store
            .get_player(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Player", id))
    }

    pub async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> StoreResult<PlayerEntity> {
        let mut update = update;
        if let Some(username) = &update.username {
            update.username = Some(validate_username(username)?);
        }
        let now = Utc::now();
        self.store
            .mutate_player(
                id,
                Box::new(move |p| {
                    p.apply_profile(&update);
                    p.touch(now);
                    Ok(Vec::new())
                }),
            )
            .await
    }

    pub async fn player_stats(&self, id: Uuid) -> StoreResult<PlayerStats> {
        let player = self.get_player(id).await?;
        let energy = player.energy_at(Utc::now(), self.config.energy_regen_per_sec);
        let (floor, next) = level_progress(player.experience);
        let badges = self.store.list_player_badges(id).await?.len();
        let referrals = self.store.count_referrals(id).await?;

        Ok(PlayerStats {
            tier_benefits: player.tier().benefits(),
            player,
            energy,
            level_floor_experience: floor,
            next_level_experience: next,
            badges,
            referrals,
        })
    }

    /// Apply up to `taps` taps, limited by available energy
    pub async fn tap(&self, id: Uuid, taps: i64) -> StoreResult<TapOutcome> {
        validate_amount(taps)?;
        let taps = taps.min(self.config.max_taps_per_request);
        let config = self.config.clone();
        let now = Utc::now();

        let mut outcome: Option<(i64, i64, i64, LevelChange, EnergyState)> = None;
        let player = self
            .store
            .mutate_player(
                id,
                Box::new(|p| {
                    let energy = p.energy_at(now, config.energy_regen_per_sec);
                    let applied = spend_energy(energy.current, taps)?;
                    let tokens = p
                        .tier()
                        .benefits()
                        .apply_tap_multiplier(applied * config.tokens_per_tap);
                    let experience = applied * config.experience_per_tap;

                    p.energy = energy.current - applied;
                    p.energy_updated_at = now;
                    p.total_taps += applied;
                    p.touch(now);

                    let mut entries =
                        vec![p.credit_tokens(tokens, TransactionKind::Tap, format!("{} taps", applied))?];
                    let (change, bonus) = p.grant_experience(experience)?;
                    entries.extend(bonus);

                    let energy = EnergyState {
                        current: p.energy,
                        max: energy.max,
                        updated_at: now,
                    };
                    outcome = Some((applied, tokens, experience, change, energy));
                    Ok(entries)
                }),
            )
            .await?;

        let (taps_applied, tokens_earned, experience_gained, level_change, energy) = outcome
            .ok_or_else(|| StoreError::Database("tap mutation did not run".to_string()))?;
        info!(
            player_id = %id,
            operation = operations::TAP,
            amount = tokens_earned,
            taps = taps_applied,
            "Taps applied"
        );
        let new_badges = evaluate_badges(self.store.as_ref(), &player).await?;

        Ok(TapOutcome {
            taps_applied,
            tokens_earned,
            experience_gained,
            level_change,
            energy,
            new_badges,
            player,
        })
    }

    /// First login of the calendar day pays the daily reward
    pub async fn daily_login(&self, id: Uuid) -> StoreResult<DailyLoginOutcome> {
        let reward = self.config.daily_login_reward;
        let now = Utc::now();
        let today = now.date_naive();

        let player = self
            .store
            .mutate_player(
                id,
                Box::new(move |p| {
                    if p.last_daily_login == Some(today) {
                        return Err(pp_core::CoreError::AlreadyCompleted(format!(
                            "daily reward already claimed on {}",
                            today
                        ))
                        .into());
                    }
                    p.last_daily_login = Some(today);
                    p.touch(now);
                    Ok(vec![p.credit_tokens(reward, TransactionKind::DailyLogin, "Daily login")?])
                }),
            )
            .await?;

        info!(player_id = %id, operation = operations::DAILY_LOGIN, amount = reward, "Daily reward paid");
        Ok(DailyLoginOutcome { reward, player })
    }

    pub async fn leaderboard(
        &self,
        metric: LeaderboardMetric,
        limit: Option<i64>,
    ) -> StoreResult<Vec<LeaderboardEntry>> {
        let players = self
            .store
            .leaderboard(metric, self.config.page_size(limit))
            .await?;
        Ok(players
            .into_iter()
            .enumerate()
            .map(|(i, p)| LeaderboardEntry {
                rank: i + 1,
                player_id: p.id,
                value: metric.value_of(&p),
                username: p.username,
                level: p.level,
            })
            .collect())
    }

    // ==================== missions ====================

    pub async fn create_mission(&self, new: NewMission) -> StoreResult<MissionEntity> {
        MissionCadence::parse(&new.cadence)?;
        if new.title.trim().is_empty() {
            return Err(StoreError::validation("mission title must not be empty"));
        }
        validate_amount(new.target)?;
        if new.reward_tokens < 0 || new.reward_experience < 0 || new.reward_influence < 0 {
            return Err(StoreError::validation("mission rewards must not be negative"));
        }
        self.store.create_mission(new).await
    }

    pub async fn list_missions(&self, player_id: Uuid) -> StoreResult<Vec<MissionView>> {
        let today = Utc::now().date_naive();
        let missions = self.store.list_missions(true).await?;
        let keys: Vec<String> = [MissionCadence::Once, MissionCadence::Daily, MissionCadence::Weekly]
            .iter()
            .map(|c| c.period_key(today))
            .collect();
        let progress = self.store.list_progress(player_id, &keys).await?;

        Ok(missions
            .into_iter()
            .map(|mission| {
                let period_key = MissionCadence::parse(&mission.cadence)
                    .unwrap_or(MissionCadence::Once)
                    .period_key(today);
                let row = progress
                    .iter()
                    .find(|p| p.mission_id == mission.id && p.period_key == period_key);
                MissionView {
                    progress: row.map_or(0, |r| r.progress),
                    completed: row.map_or(false, |r| r.is_completed()),
                    claimed: row.map_or(false, |r| r.is_claimed()),
                    period_key,
                    mission,
                }
            })
            .collect())
    }

    pub async fn record_mission_progress(
        &self,
        player_id: Uuid,
        mission_id: Uuid,
        amount: i64,
    ) -> StoreResult<MissionProgressEntity> {
        validate_amount(amount)?;
        let (mission, period_key) = self.active_mission(mission_id, Utc::now()).await?;
        self.store
            .record_progress(player_id, mission_id, &period_key, amount, mission.target)
            .await
    }

    /// Pay out a completed mission once per period
    pub async fn claim_mission(&self, player_id: Uuid, mission_id: Uuid) -> StoreResult<MissionClaim> {
        let now = Utc::now();
        let (mission, period_key) = self.active_mission(mission_id, now).await?;
        let reward_tokens = mission.reward_tokens;
        let reward_experience = mission.reward_experience;
        let reward_influence = mission.reward_influence;
        let title = mission.title.clone();

        let (progress, player) = self
            .store
            .claim_mission(
                player_id,
                mission_id,
                &period_key,
                Box::new(move |progress, p| {
                    if !progress.is_completed() {
                        return Err(pp_core::CoreError::InvalidState(format!(
                            "mission not completed: {}/{}",
                            progress.progress, mission.target
                        ))
                        .into());
                    }
                    if progress.is_claimed() {
                        return Err(pp_core::CoreError::AlreadyCompleted(
                            "mission reward already claimed".to_string(),
                        )
                        .into());
                    }
                    progress.claimed_at = Some(now);
                    progress.updated_at = now;
                    p.influence += reward_influence;
                    p.touch(now);
                    Ok(p.reward(
                        reward_tokens,
                        reward_experience,
                        TransactionKind::Mission,
                        format!("Mission: {}", title),
                    )?)
                }),
            )
            .await?;

        info!(
            player_id = %player_id,
            operation = operations::MISSION_CLAIM,
            amount = reward_tokens,
            mission_id = %mission_id,
            "Mission claimed"
        );
        evaluate_badges(self.store.as_ref(), &player).await?;

        Ok(MissionClaim {
            progress,
            reward_tokens,
            reward_experience,
            player,
        })
    }

    async fn active_mission(
        &self,
        mission_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<(MissionEntity, String)> {
        let mission = self
            .store
            .get_mission(mission_id)
            .await?
            .filter(|m| m.is_active)
            .ok_or_else(|| StoreError::not_found("Mission", mission_id))?;
        let period_key = MissionCadence::parse(&mission.cadence)?.period_key(now.date_naive());
        Ok((mission, period_key))
    }

    // ==================== badges ====================

    pub async fn create_badge(&self, new: NewBadge) -> StoreResult<BadgeEntity> {
        BadgeRequirement::parse(&new.requirement)?;
        if new.code.trim().is_empty() {
            return Err(StoreError::validation("badge code must not be empty"));
        }
        self.store.create_badge(new).await
    }

    pub async fn list_badges(&self) -> StoreResult<Vec<BadgeEntity>> {
        self.store.list_badges().await
    }

    pub async fn player_badges(&self, player_id: Uuid) -> StoreResult<Vec<PlayerBadgeEntity>> {
        self.store.list_player_badges(player_id).await
    }

    pub async fn evaluate_badges(&self, player_id: Uuid) -> StoreResult<Vec<BadgeEntity>> {
        let player = self.get_player(player_id).await?;
        evaluate_badges(self.store.as_ref(), &player).await
    }
}

fn validate_username(username: &str) -> StoreResult<String> {
    let username = username.trim();
    let len = username.chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&len) {
        return Err(StoreError::validation(format!(
            "username must be {} to {} characters",
            MIN_USERNAME_LEN, MAX_USERNAME_LEN
        )));
    }
    Ok(username.to_string())
}
