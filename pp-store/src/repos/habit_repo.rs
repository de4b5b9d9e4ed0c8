//! Habit Repository

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{HabitEntity, LedgerEntry, NewHabit, PlayerEntity};
use crate::error::StoreResult;

pub type HabitMutation<'a> = Box<
    dyn FnOnce(&mut HabitEntity, &mut PlayerEntity) -> StoreResult<Vec<LedgerEntry>> + Send + 'a,
>;

#[async_trait]
pub trait HabitRepository: Send + Sync {
    async fn create_habit(&self, new: NewHabit) -> StoreResult<HabitEntity>;

    async fn get_habit(&self, id: Uuid) -> StoreResult<Option<HabitEntity>>;

    async fn list_habits(&self, player_id: Uuid) -> StoreResult<Vec<HabitEntity>>;

    /// Atomically complete a habit owned by `player_id`
    async fn complete_habit<'a>(
        &self,
        habit_id: Uuid,
        player_id: Uuid,
        mutation: HabitMutation<'a>,
    ) -> StoreResult<(HabitEntity, PlayerEntity)>;

    /// Best longest-streak across a player's habits
    async fn best_streak(&self, player_id: Uuid) -> StoreResult<i64>;
}
