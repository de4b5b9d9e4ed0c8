//! Generated courses and lesson progress

use axum::extract::State;
use pp_core::logging::operations;
use pp_store::entities::{CourseEntity, EnrollmentEntity};
use pp_store::services::LessonOutcome;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthClaims;
use crate::dto::{CompleteLessonRequest, GenerateCourseRequest, LimitQuery};
use crate::error::ApiResult;
use crate::handlers::{invalidate_players, tracked};
use crate::response::{ApiJson, ApiPath, ApiQuery, ApiResponse};
use crate::state::AppState;

pub async fn generate_course(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiJson(req): ApiJson<GenerateCourseRequest>,
) -> ApiResult<ApiResponse<CourseEntity>> {
    let course = state
        .services
        .education
        .generate_course(claims.player_id()?, &req.topic, &req.difficulty, req.lesson_count)
        .await?;
    Ok(ApiResponse::created(course).with_message("Course generated"))
}

pub async fn list_courses(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> ApiResult<ApiResponse<Vec<CourseEntity>>> {
    let courses = state.services.education.list_courses(query.limit).await?;
    Ok(ApiResponse::ok(courses))
}

pub async fn get_course(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<CourseEntity>> {
    let course = state.services.education.get_course(id).await?;
    Ok(ApiResponse::ok(course))
}

pub async fn enroll(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<EnrollmentEntity>> {
    let enrollment = state
        .services
        .education
        .enroll(id, claims.player_id()?)
        .await?;
    Ok(ApiResponse::ok(enrollment).with_message("Enrolled"))
}

pub async fn my_enrollments(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
) -> ApiResult<ApiResponse<Vec<EnrollmentEntity>>> {
    let enrollments = state.services.education.enrollments(claims.player_id()?).await?;
    Ok(ApiResponse::ok(enrollments))
}

/// Complete the next lesson; an explicit `lesson_index` must match it
pub async fn complete_lesson(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiPath(id): ApiPath<Uuid>,
    body: Option<ApiJson<CompleteLessonRequest>>,
) -> ApiResult<ApiResponse<LessonOutcome>> {
    let player_id = claims.player_id()?;
    let lesson_index = body.and_then(|ApiJson(req)| req.lesson_index);
    let outcome = tracked(
        operations::LESSON_COMPLETE,
        state
            .services
            .education
            .complete_lesson(id, player_id, lesson_index)
            .await,
    )?;
    invalidate_players(&state, &[player_id]).await;
    let message = if outcome.course_completed {
        "Course completed"
    } else {
        "Lesson completed"
    };
    Ok(ApiResponse::ok(outcome).with_message(message))
}
