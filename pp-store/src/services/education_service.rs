//! Education Service
//!
//! Generated courses, enrollment and lesson-by-lesson progress.

use chrono::Utc;
use pp_core::logging::operations;
use pp_core::{CoreError, CourseGenerator, Difficulty, GameConfig, TransactionKind};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::entities::{CourseEntity, EnrollmentEntity, PlayerEntity};
use crate::error::{StoreError, StoreResult};
use crate::repos::Store;
use crate::services::badges::evaluate_badges;

pub const DEFAULT_LESSON_COUNT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonOutcome {
    pub lesson_index: i32,
    pub lesson_title: String,
    pub experience_gained: i64,
    pub course_completed: bool,
    pub reward_tokens: i64,
    pub enrollment: EnrollmentEntity,
    pub player: PlayerEntity,
}

pub struct EducationService {
    store: Arc<dyn Store>,
    config: GameConfig,
    generator: CourseGenerator,
}

impl EducationService {
    pub fn new(store: Arc<dyn Store>, config: GameConfig) -> Self {
        Self {
            store,
            config,
            generator: CourseGenerator,
        }
    }

    /// Generate a course from templates and save it
    pub async fn generate_course(
        &self,
        creator_id: Uuid,
        topic: &str,
        difficulty: &str,
        lesson_count: Option<usize>,
    ) -> StoreResult<CourseEntity> {
        let difficulty = Difficulty::parse(difficulty)?;
        let generated = {
            let mut rng = StdRng::from_entropy();
            self.generator.generate(
                topic,
                difficulty,
                lesson_count.unwrap_or(DEFAULT_LESSON_COUNT),
                &mut rng,
            )?
        };
        let course = self
            .store
            .create_course(CourseEntity::from_generated(creator_id, generated, Utc::now()))
            .await?;
        info!(
            player_id = %creator_id,
            course_id = %course.id,
            lessons = course.lesson_count(),
            "Course generated"
        );
        Ok(course)
    }

    pub async fn get_course(&self, id: Uuid) -> StoreResult<CourseEntity> {
        self.store
            .get_course(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Course", id))
    }

    pub async fn list_courses(&self, limit: Option<i64>) -> StoreResult<Vec<CourseEntity>> {
        self.store.list_courses(self.config.page_size(limit)).await
    }

    pub async fn enroll(&self, course_id: Uuid, player_id: Uuid) -> StoreResult<EnrollmentEntity> {
        self.store.enroll(course_id, player_id).await
    }

    pub async fn enrollments(&self, player_id: Uuid) -> StoreResult<Vec<EnrollmentEntity>> {
        self.store.list_enrollments(player_id).await
    }

    /// Complete the next lesson; lessons are taken strictly in order
    ///
    /// `lesson_index`, when given, must be the next lesson.
    pub async fn complete_lesson(
        &self,
        course_id: Uuid,
        player_id: Uuid,
        lesson_index: Option<i32>,
    ) -> StoreResult<LessonOutcome> {
        let lesson_experience = self.config.lesson_experience;
        let now = Utc::now();
        let mut details: Option<(i32, String, i64, bool, i64)> = None;

        let (enrollment, player) = self
            .store
            .complete_lesson(
                course_id,
                player_id,
                Box::new(|course, enrollment, p| {
                    let total = course.lesson_count();
                    if enrollment.completed_at.is_some() || enrollment.completed_lessons >= total {
                        return Err(CoreError::AlreadyCompleted("course already completed".to_string()).into());
                    }
                    let next = enrollment.completed_lessons;
                    if let Some(requested) = lesson_index {
                        if requested != next {
                            return Err(CoreError::InvalidState(format!(
                                "lesson {} is next, not {}",
                                next, requested
                            ))
                            .into());
                        }
                    }
                    let title = course
                        .lessons
                        .0
                        .get(next as usize)
                        .map(|l| l.title.clone())
                        .unwrap_or_default();

                    enrollment.completed_lessons = next + 1;
                    enrollment.updated_at = now;
                    let finished = enrollment.completed_lessons == total;

                    let (_, bonus) = p.grant_experience(lesson_experience)?;
                    let mut entries: Vec<_> = bonus.into_iter().collect();
                    let mut reward = 0;
                    if finished {
                        enrollment.completed_at = Some(now);
                        reward = course.reward_tokens;
                        entries.extend(p.reward(
                            course.reward_tokens,
                            course.reward_experience,
                            TransactionKind::Course,
                            format!("Completed course: {}", course.title),
                        )?);
                    }
                    p.touch(now);
                    details = Some((next, title, lesson_experience, finished, reward));
                    Ok(entries)
                }),
            )
            .await?;

        let (lesson_index, lesson_title, experience_gained, course_completed, reward_tokens) =
            details.ok_or_else(|| StoreError::Database("lesson mutation did not run".to_string()))?;
        info!(
            player_id = %player_id,
            operation = operations::LESSON_COMPLETE,
            course_id = %course_id,
            lesson = lesson_index,
            completed = course_completed,
            "Lesson completed"
        );
        if course_completed {
            evaluate_badges(self.store.as_ref(), &player).await?;
        }

        Ok(LessonOutcome {
            lesson_index,
            lesson_title,
            experience_gained,
            course_completed,
            reward_tokens,
            enrollment,
            player,
        })
    }
}
