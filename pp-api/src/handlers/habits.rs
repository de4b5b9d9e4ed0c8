//! Habit tracking

use axum::extract::State;
use pp_core::logging::operations;
use pp_store::entities::{HabitEntity, NewHabit};
use pp_store::services::HabitCompletion;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthClaims;
use crate::dto::CreateHabitRequest;
use crate::error::ApiResult;
use crate::handlers::{invalidate_players, tracked};
use crate::response::{ApiJson, ApiPath, ApiResponse};
use crate::state::AppState;

pub async fn create_habit(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiJson(req): ApiJson<CreateHabitRequest>,
) -> ApiResult<ApiResponse<HabitEntity>> {
    let habit = state
        .services
        .habits
        .create(NewHabit {
            player_id: claims.player_id()?,
            name: req.name,
            description: req.description,
            reward_tokens: req.reward_tokens,
        })
        .await?;
    Ok(ApiResponse::created(habit))
}

pub async fn list_habits(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
) -> ApiResult<ApiResponse<Vec<HabitEntity>>> {
    let habits = state.services.habits.list(claims.player_id()?).await?;
    Ok(ApiResponse::ok(habits))
}

pub async fn complete_habit(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<HabitCompletion>> {
    let player_id = claims.player_id()?;
    let completion = tracked(
        operations::HABIT_COMPLETE,
        state.services.habits.complete(id, player_id).await,
    )?;
    invalidate_players(&state, &[player_id]).await;
    let message = format!("Streak: {} days", completion.habit.current_streak);
    Ok(ApiResponse::ok(completion).with_message(message))
}
