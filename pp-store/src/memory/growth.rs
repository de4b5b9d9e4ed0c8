use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{newest_first, MemoryStore};
use crate::entities::*;
use crate::error::{StoreError, StoreResult};
use crate::repos::{CourseRepository, EnrollmentMutation, HabitMutation, HabitRepository};

#[async_trait]
impl HabitRepository for MemoryStore {
    async fn create_habit(&self, new: NewHabit) -> StoreResult<HabitEntity> {
        let habit = HabitEntity::new(new, Utc::now());
        self.state
            .write()
            .await
            .habits
            .insert(habit.id, habit.clone());
        Ok(habit)
    }

    async fn get_habit(&self, id: Uuid) -> StoreResult<Option<HabitEntity>> {
        Ok(self.state.read().await.habits.get(&id).cloned())
    }

    async fn list_habits(&self, player_id: Uuid) -> StoreResult<Vec<HabitEntity>> {
        let state = self.state.read().await;
        let mut habits: Vec<_> = state
            .habits
            .values()
            .filter(|h| h.player_id == player_id)
            .cloned()
            .collect();
        habits.sort_by_key(|h| h.created_at);
        Ok(habits)
    }

    async fn complete_habit<'a>(
        &self,
        habit_id: Uuid,
        player_id: Uuid,
        mutation: HabitMutation<'a>,
    ) -> StoreResult<(HabitEntity, PlayerEntity)> {
        let mut state = self.state.write().await;
        let mut habit = state
            .habits
            .get(&habit_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Habit", habit_id))?;
        if habit.player_id != player_id {
            return Err(StoreError::forbidden("habit belongs to another player"));
        }
        let mut player = state.player(player_id)?;
        let entries = mutation(&mut habit, &mut player)?;

        let now = Utc::now();
        state.append_ledger(entries, now);
        state.habits.insert(habit.id, habit.clone());
        let player = state.commit_player(player, now);
        Ok((habit, player))
    }

    async fn best_streak(&self, player_id: Uuid) -> StoreResult<i64> {
        let state = self.state.read().await;
        Ok(state
            .habits
            .values()
            .filter(|h| h.player_id == player_id)
            .map(|h| i64::from(h.longest_streak))
            .max()
            .unwrap_or(0))
    }
}

#[async_trait]
impl CourseRepository for MemoryStore {
    async fn create_course(&self, course: CourseEntity) -> StoreResult<CourseEntity> {
        self.state
            .write()
            .await
            .courses
            .insert(course.id, course.clone());
        Ok(course)
    }

    async fn get_course(&self, id: Uuid) -> StoreResult<Option<CourseEntity>> {
        Ok(self.state.read().await.courses.get(&id).cloned())
    }

    async fn list_courses(&self, limit: i64) -> StoreResult<Vec<CourseEntity>> {
        let state = self.state.read().await;
        let rows = state.courses.values().cloned().collect();
        Ok(newest_first(rows, |c| c.created_at, limit))
    }

    async fn enroll(&self, course_id: Uuid, player_id: Uuid) -> StoreResult<EnrollmentEntity> {
        let mut state = self.state.write().await;
        if !state.courses.contains_key(&course_id) {
            return Err(StoreError::not_found("Course", course_id));
        }
        if state.enrollments.contains_key(&(course_id, player_id)) {
            return Err(StoreError::conflict("already enrolled in this course"));
        }
        let enrollment = EnrollmentEntity::new(course_id, player_id, Utc::now());
        state
            .enrollments
            .insert((course_id, player_id), enrollment.clone());
        Ok(enrollment)
    }

    async fn get_enrollment(
        &self,
        course_id: Uuid,
        player_id: Uuid,
    ) -> StoreResult<Option<EnrollmentEntity>> {
        let state = self.state.read().await;
        Ok(state.enrollments.get(&(course_id, player_id)).cloned())
    }

    async fn list_enrollments(&self, player_id: Uuid) -> StoreResult<Vec<EnrollmentEntity>> {
        let state = self.state.read().await;
        let rows = state
            .enrollments
            .values()
            .filter(|e| e.player_id == player_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |e| e.enrolled_at, i64::MAX))
    }

    async fn complete_lesson<'a>(
        &self,
        course_id: Uuid,
        player_id: Uuid,
        mutation: EnrollmentMutation<'a>,
    ) -> StoreResult<(EnrollmentEntity, PlayerEntity)> {
        let mut state = self.state.write().await;
        let course = state
            .courses
            .get(&course_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Course", course_id))?;
        let mut enrollment = state
            .enrollments
            .get(&(course_id, player_id))
            .cloned()
            .ok_or_else(|| {
                StoreError::not_found("Enrollment", format!("{}/{}", course_id, player_id))
            })?;
        let mut player = state.player(player_id)?;
        let entries = mutation(&course, &mut enrollment, &mut player)?;

        let now = Utc::now();
        enrollment.updated_at = now;
        state.append_ledger(entries, now);
        state
            .enrollments
            .insert((course_id, player_id), enrollment.clone());
        let player = state.commit_player(player, now);
        Ok((enrollment, player))
    }
}
