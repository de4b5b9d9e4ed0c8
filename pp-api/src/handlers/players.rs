//! Player profile

use axum::extract::State;
use pp_store::entities::{PlayerEntity, ProfileUpdate};
use pp_store::services::PlayerStats;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthClaims;
use crate::cache::keys;
use crate::error::ApiResult;
use crate::handlers::invalidate_players;
use crate::response::{ApiJson, ApiPath, ApiResponse};
use crate::state::AppState;

pub async fn me(State(state): State<Arc<AppState>>, claims: AuthClaims) -> ApiResult<ApiResponse<PlayerEntity>> {
    let player = state.services.game.get_player(claims.player_id()?).await?;
    Ok(ApiResponse::ok(player))
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> ApiResult<ApiResponse<PlayerEntity>> {
    let player_id = claims.player_id()?;
    let player = state.services.game.update_profile(player_id, update).await?;
    invalidate_players(&state, &[player_id]).await;
    Ok(ApiResponse::ok(player).with_message("Profile updated"))
}

pub async fn get_player(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<PlayerEntity>> {
    let player = state.services.game.get_player(id).await?;
    Ok(ApiResponse::ok(player))
}

/// Level progress, energy, tier and badges; cached per player
pub async fn my_stats(State(state): State<Arc<AppState>>, claims: AuthClaims) -> ApiResult<ApiResponse<PlayerStats>> {
    let player_id = claims.player_id()?;
    let game = &state.services.game;
    let stats = state
        .cache
        .get_or_load(&keys::stats(player_id), || game.player_stats(player_id))
        .await?;
    Ok(ApiResponse::ok(stats))
}
