//! Habit Service

use chrono::Utc;
use pp_core::logging::operations;
use pp_core::{advance_streak, StreakUpdate, TransactionKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::entities::{HabitEntity, NewHabit, PlayerEntity};
use crate::error::{StoreError, StoreResult};
use crate::repos::Store;
use crate::services::badges::evaluate_badges;

pub const MAX_HABIT_REWARD: i64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitCompletion {
    pub habit: HabitEntity,
    pub streak: StreakUpdate,
    pub reward: i64,
    pub player: PlayerEntity,
}

pub struct HabitService {
    store: Arc<dyn Store>,
}

impl HabitService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, new: NewHabit) -> StoreResult<HabitEntity> {
        if new.name.trim().is_empty() {
            return Err(StoreError::validation("habit name must not be empty"));
        }
        if !(0..=MAX_HABIT_REWARD).contains(&new.reward_tokens) {
            return Err(StoreError::validation(format!(
                "habit reward must be between 0 and {}",
                MAX_HABIT_REWARD
            )));
        }
        self.store
            .create_habit(NewHabit {
                name: new.name.trim().to_string(),
                ..new
            })
            .await
    }

    pub async fn list(&self, player_id: Uuid) -> StoreResult<Vec<HabitEntity>> {
        self.store.list_habits(player_id).await
    }

    /// Mark today's completion, extend the streak and pay the reward
    pub async fn complete(&self, habit_id: Uuid, player_id: Uuid) -> StoreResult<HabitCompletion> {
        let now = Utc::now();
        let today = now.date_naive();
        let mut update: Option<StreakUpdate> = None;

        let (habit, player) = self
            .store
            .complete_habit(
                habit_id,
                player_id,
                Box::new(|habit, p| {
                    let streak = advance_streak(habit.last_completed, habit.current_streak, today)?;
                    habit.current_streak = streak.streak();
                    habit.longest_streak = habit.longest_streak.max(habit.current_streak);
                    habit.last_completed = Some(today);
                    habit.total_completions += 1;
                    update = Some(streak);

                    p.touch(now);
                    let mut entries = Vec::new();
                    if habit.reward_tokens > 0 {
                        entries.push(p.credit_tokens(
                            habit.reward_tokens,
                            TransactionKind::Habit,
                            format!("Habit: {} (day {})", habit.name, habit.current_streak),
                        )?);
                    }
                    Ok(entries)
                }),
            )
            .await?;

        let streak = update.ok_or_else(|| StoreError::Database("habit mutation did not run".to_string()))?;
        info!(
            player_id = %player_id,
            operation = operations::HABIT_COMPLETE,
            amount = habit.reward_tokens,
            streak = habit.current_streak,
            "Habit completed"
        );
        evaluate_badges(self.store.as_ref(), &player).await?;

        Ok(HabitCompletion {
            reward: habit.reward_tokens,
            habit,
            streak,
            player,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{funded_player, memory_store};
    use pp_core::CoreError;

    fn habit(player_id: Uuid, reward: i64) -> NewHabit {
        NewHabit {
            player_id,
            name: "Morning walk".to_string(),
            description: "30 minutes outside".to_string(),
            reward_tokens: reward,
        }
    }

    #[tokio::test]
    async fn test_first_completion_starts_streak_and_pays() {
        let store = memory_store();
        let habits = HabitService::new(store.clone());
        let player = funded_player(&store, 1, 0).await;
        let created = habits.create(habit(player.id, 15)).await.unwrap();

        let done = habits.complete(created.id, player.id).await.unwrap();
        assert_eq!(done.streak, StreakUpdate::Started);
        assert_eq!(done.habit.current_streak, 1);
        assert_eq!(done.habit.longest_streak, 1);
        assert_eq!(done.player.power_tokens, 15);
    }

    #[tokio::test]
    async fn test_same_day_completion_rejected() {
        let store = memory_store();
        let habits = HabitService::new(store.clone());
        let player = funded_player(&store, 1, 0).await;
        let created = habits.create(habit(player.id, 5)).await.unwrap();

        habits.complete(created.id, player.id).await.unwrap();
        assert!(matches!(
            habits.complete(created.id, player.id).await,
            Err(StoreError::Rule(CoreError::AlreadyCompleted(_)))
        ));
        assert_eq!(
            store.get_player(player.id).await.unwrap().unwrap().power_tokens,
            5
        );
    }

    #[tokio::test]
    async fn test_other_players_habit_forbidden() {
        let store = memory_store();
        let habits = HabitService::new(store.clone());
        let owner = funded_player(&store, 1, 0).await;
        let other = funded_player(&store, 2, 0).await;
        let created = habits.create(habit(owner.id, 5)).await.unwrap();

        assert!(matches!(
            habits.complete(created.id, other.id).await,
            Err(StoreError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_reward_bounds() {
        let store = memory_store();
        let habits = HabitService::new(store.clone());
        let player = funded_player(&store, 1, 0).await;
        assert!(habits.create(habit(player.id, -1)).await.is_err());
        assert!(habits.create(habit(player.id, MAX_HABIT_REWARD + 1)).await.is_err());
        assert!(habits.list(player.id).await.unwrap().is_empty());
    }
}
