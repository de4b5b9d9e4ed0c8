//! Habits and courses

use chrono::{DateTime, NaiveDate, Utc};
use pp_core::{GeneratedCourse, GeneratedLesson};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct HabitEntity {
    pub id: Uuid,
    pub player_id: Uuid,
    pub name: String,
    pub description: String,
    pub reward_tokens: i64,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_completed: Option<NaiveDate>,
    pub total_completions: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHabit {
    pub player_id: Uuid,
    pub name: String,
    pub description: String,
    pub reward_tokens: i64,
}

impl HabitEntity {
    pub fn new(new: NewHabit, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id: new.player_id,
            name: new.name,
            description: new.description,
            reward_tokens: new.reward_tokens,
            current_streak: 0,
            longest_streak: 0,
            last_completed: None,
            total_completions: 0,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CourseEntity {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: String,
    pub description: String,
    pub topic: String,
    pub difficulty: String,
    pub lessons: Json<Vec<GeneratedLesson>>,
    pub estimated_minutes: i32,
    pub reward_tokens: i64,
    pub reward_experience: i64,
    pub created_at: DateTime<Utc>,
}

impl CourseEntity {
    pub fn from_generated(creator_id: Uuid, course: GeneratedCourse, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            creator_id,
            title: course.title,
            description: course.description,
            topic: course.topic,
            difficulty: course.difficulty.as_str().to_string(),
            lessons: Json(course.lessons),
            estimated_minutes: course.estimated_minutes,
            reward_tokens: course.reward_tokens,
            reward_experience: course.reward_experience,
            created_at: now,
        }
    }

    pub fn lesson_count(&self) -> i32 {
        self.lessons.0.len() as i32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EnrollmentEntity {
    pub course_id: Uuid,
    pub player_id: Uuid,
    pub completed_lessons: i32,
    pub completed_at: Option<DateTime<Utc>>,
    pub enrolled_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EnrollmentEntity {
    pub fn new(course_id: Uuid, player_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            course_id,
            player_id,
            completed_lessons: 0,
            completed_at: None,
            enrolled_at: now,
            updated_at: now,
        }
    }
}
