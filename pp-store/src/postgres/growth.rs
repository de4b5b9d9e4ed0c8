use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{insert_ledger, lock_player, save_player, PgStore};
use crate::entities::*;
use crate::error::{StoreError, StoreResult};
use crate::repos::{CourseRepository, EnrollmentMutation, HabitMutation, HabitRepository};

#[async_trait]
impl HabitRepository for PgStore {
    async fn create_habit(&self, new: NewHabit) -> StoreResult<HabitEntity> {
        let habit = HabitEntity::new(new, Utc::now());
        let row = sqlx::query_as::<_, HabitEntity>(
            r#"INSERT INTO habits
                (id, player_id, name, description, reward_tokens, current_streak, longest_streak,
                 last_completed, total_completions, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *"#,
        )
        .bind(habit.id)
        .bind(habit.player_id)
        .bind(&habit.name)
        .bind(&habit.description)
        .bind(habit.reward_tokens)
        .bind(habit.current_streak)
        .bind(habit.longest_streak)
        .bind(habit.last_completed)
        .bind(habit.total_completions)
        .bind(habit.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_habit(&self, id: Uuid) -> StoreResult<Option<HabitEntity>> {
        let row = sqlx::query_as::<_, HabitEntity>("SELECT * FROM habits WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_habits(&self, player_id: Uuid) -> StoreResult<Vec<HabitEntity>> {
        let rows = sqlx::query_as::<_, HabitEntity>(
            "SELECT * FROM habits WHERE player_id = $1 ORDER BY created_at",
        )
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn complete_habit<'a>(
        &self,
        habit_id: Uuid,
        player_id: Uuid,
        mutation: HabitMutation<'a>,
    ) -> StoreResult<(HabitEntity, PlayerEntity)> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut player = lock_player(&mut tx, player_id).await?;
        let mut habit =
            sqlx::query_as::<_, HabitEntity>("SELECT * FROM habits WHERE id = $1 FOR UPDATE")
                .bind(habit_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| StoreError::not_found("Habit", habit_id))?;
        if habit.player_id != player_id {
            return Err(StoreError::forbidden("habit belongs to another player"));
        }

        let entries = mutation(&mut habit, &mut player)?;

        let habit = sqlx::query_as::<_, HabitEntity>(
            r#"UPDATE habits SET
                current_streak = $2,
                longest_streak = $3,
                last_completed = $4,
                total_completions = $5
            WHERE id = $1
            RETURNING *"#,
        )
        .bind(habit.id)
        .bind(habit.current_streak)
        .bind(habit.longest_streak)
        .bind(habit.last_completed)
        .bind(habit.total_completions)
        .fetch_one(&mut *tx)
        .await?;
        insert_ledger(&mut tx, entries, now).await?;
        let player = save_player(&mut tx, &player, now).await?;
        tx.commit().await?;
        Ok((habit, player))
    }

    async fn best_streak(&self, player_id: Uuid) -> StoreResult<i64> {
        let (best,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(MAX(longest_streak), 0)::BIGINT FROM habits WHERE player_id = $1",
        )
        .bind(player_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(best)
    }
}

#[async_trait]
impl CourseRepository for PgStore {
    async fn create_course(&self, course: CourseEntity) -> StoreResult<CourseEntity> {
        let row = sqlx::query_as::<_, CourseEntity>(
            r#"INSERT INTO courses
                (id, creator_id, title, description, topic, difficulty, lessons,
                 estimated_minutes, reward_tokens, reward_experience, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *"#,
        )
        .bind(course.id)
        .bind(course.creator_id)
        .bind(&course.title)
        .bind(&course.description)
        .bind(&course.topic)
        .bind(&course.difficulty)
        .bind(&course.lessons)
        .bind(course.estimated_minutes)
        .bind(course.reward_tokens)
        .bind(course.reward_experience)
        .bind(course.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_course(&self, id: Uuid) -> StoreResult<Option<CourseEntity>> {
        let row = sqlx::query_as::<_, CourseEntity>("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_courses(&self, limit: i64) -> StoreResult<Vec<CourseEntity>> {
        let rows = sqlx::query_as::<_, CourseEntity>(
            "SELECT * FROM courses ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn enroll(&self, course_id: Uuid, player_id: Uuid) -> StoreResult<EnrollmentEntity> {
        let now = Utc::now();
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM courses WHERE id = $1")
            .bind(course_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(StoreError::not_found("Course", course_id));
        }

        let row = sqlx::query_as::<_, EnrollmentEntity>(
            r#"INSERT INTO course_enrollments
                (course_id, player_id, completed_lessons, enrolled_at, updated_at)
            VALUES ($1, $2, 0, $3, $3)
            RETURNING *"#,
        )
        .bind(course_id)
        .bind(player_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match StoreError::from(err) {
            StoreError::Conflict(_) => StoreError::conflict("already enrolled in this course"),
            other => other,
        })?;
        Ok(row)
    }

    async fn get_enrollment(
        &self,
        course_id: Uuid,
        player_id: Uuid,
    ) -> StoreResult<Option<EnrollmentEntity>> {
        let row = sqlx::query_as::<_, EnrollmentEntity>(
            "SELECT * FROM course_enrollments WHERE course_id = $1 AND player_id = $2",
        )
        .bind(course_id)
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_enrollments(&self, player_id: Uuid) -> StoreResult<Vec<EnrollmentEntity>> {
        let rows = sqlx::query_as::<_, EnrollmentEntity>(
            "SELECT * FROM course_enrollments WHERE player_id = $1 ORDER BY enrolled_at DESC",
        )
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn complete_lesson<'a>(
        &self,
        course_id: Uuid,
        player_id: Uuid,
        mutation: EnrollmentMutation<'a>,
    ) -> StoreResult<(EnrollmentEntity, PlayerEntity)> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let course = sqlx::query_as::<_, CourseEntity>("SELECT * FROM courses WHERE id = $1")
            .bind(course_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::not_found("Course", course_id))?;
        let mut player = lock_player(&mut tx, player_id).await?;
        let mut enrollment = sqlx::query_as::<_, EnrollmentEntity>(
            r#"SELECT * FROM course_enrollments
            WHERE course_id = $1 AND player_id = $2
            FOR UPDATE"#,
        )
        .bind(course_id)
        .bind(player_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("Enrollment", format!("{}/{}", course_id, player_id)))?;

        let entries = mutation(&course, &mut enrollment, &mut player)?;

        let enrollment = sqlx::query_as::<_, EnrollmentEntity>(
            r#"UPDATE course_enrollments
            SET completed_lessons = $3, completed_at = $4, updated_at = $5
            WHERE course_id = $1 AND player_id = $2
            RETURNING *"#,
        )
        .bind(course_id)
        .bind(player_id)
        .bind(enrollment.completed_lessons)
        .bind(enrollment.completed_at)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        insert_ledger(&mut tx, entries, now).await?;
        let player = save_player(&mut tx, &player, now).await?;
        tx.commit().await?;
        Ok((enrollment, player))
    }
}
