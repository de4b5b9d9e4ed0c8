//! Course Repository

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{CourseEntity, EnrollmentEntity, LedgerEntry, PlayerEntity};
use crate::error::StoreResult;

pub type EnrollmentMutation<'a> = Box<
    dyn FnOnce(&CourseEntity, &mut EnrollmentEntity, &mut PlayerEntity) -> StoreResult<Vec<LedgerEntry>>
        + Send
        + 'a,
>;

#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn create_course(&self, course: CourseEntity) -> StoreResult<CourseEntity>;

    async fn get_course(&self, id: Uuid) -> StoreResult<Option<CourseEntity>>;

    /// Newest first
    async fn list_courses(&self, limit: i64) -> StoreResult<Vec<CourseEntity>>;

    /// Conflicts when already enrolled
    async fn enroll(&self, course_id: Uuid, player_id: Uuid) -> StoreResult<EnrollmentEntity>;

    async fn get_enrollment(
        &self,
        course_id: Uuid,
        player_id: Uuid,
    ) -> StoreResult<Option<EnrollmentEntity>>;

    async fn list_enrollments(&self, player_id: Uuid) -> StoreResult<Vec<EnrollmentEntity>>;

    /// Atomically advance an enrollment
    async fn complete_lesson<'a>(
        &self,
        course_id: Uuid,
        player_id: Uuid,
        mutation: EnrollmentMutation<'a>,
    ) -> StoreResult<(EnrollmentEntity, PlayerEntity)>;
}
