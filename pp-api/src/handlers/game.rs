//! Tap game, daily login, missions, badges and leaderboards

use axum::extract::State;
use pp_core::logging::operations;
use pp_core::LeaderboardMetric;
use pp_store::entities::{BadgeEntity, MissionProgressEntity, PlayerBadgeEntity};
use pp_store::services::{DailyLoginOutcome, LeaderboardEntry, MissionClaim, MissionView, TapOutcome};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthClaims;
use crate::cache::keys;
use crate::dto::{LeaderboardQuery, MissionProgressRequest, TapRequest};
use crate::error::ApiResult;
use crate::handlers::{invalidate_players, tracked};
use crate::response::{ApiJson, ApiPath, ApiQuery, ApiResponse};
use crate::state::AppState;

pub async fn tap(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiJson(req): ApiJson<TapRequest>,
) -> ApiResult<ApiResponse<TapOutcome>> {
    let player_id = claims.player_id()?;
    let outcome = tracked(operations::TAP, state.services.game.tap(player_id, req.taps).await)?;
    invalidate_players(&state, &[player_id]).await;
    Ok(ApiResponse::ok(outcome))
}

pub async fn daily_login(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
) -> ApiResult<ApiResponse<DailyLoginOutcome>> {
    let player_id = claims.player_id()?;
    let outcome = tracked(
        operations::DAILY_LOGIN,
        state.services.game.daily_login(player_id).await,
    )?;
    invalidate_players(&state, &[player_id]).await;
    Ok(ApiResponse::ok(outcome).with_message("Daily reward collected"))
}

/// Ranked players; cached per metric and limit until the TTL runs out
pub async fn leaderboard(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<LeaderboardQuery>,
) -> ApiResult<ApiResponse<Vec<LeaderboardEntry>>> {
    let metric = match query.metric.as_deref() {
        Some(name) => LeaderboardMetric::parse(name)?,
        None => LeaderboardMetric::default(),
    };
    let limit = state.services.config.page_size(query.limit);
    let game = &state.services.game;
    let entries = state
        .cache
        .get_or_load(&keys::leaderboard(metric, limit), || game.leaderboard(metric, Some(limit)))
        .await?;
    Ok(ApiResponse::ok(entries))
}

pub async fn missions(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
) -> ApiResult<ApiResponse<Vec<MissionView>>> {
    let player_id = claims.player_id()?;
    let game = &state.services.game;
    let missions = state
        .cache
        .get_or_load(&keys::missions(player_id), || game.list_missions(player_id))
        .await?;
    Ok(ApiResponse::ok(missions))
}

pub async fn mission_progress(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiPath(mission_id): ApiPath<Uuid>,
    body: Option<ApiJson<MissionProgressRequest>>,
) -> ApiResult<ApiResponse<MissionProgressEntity>> {
    let player_id = claims.player_id()?;
    let amount = body.and_then(|ApiJson(req)| req.amount).unwrap_or(1);
    let progress = state
        .services
        .game
        .record_mission_progress(player_id, mission_id, amount)
        .await?;
    state.cache.invalidate(&keys::missions(player_id)).await;
    Ok(ApiResponse::ok(progress))
}

pub async fn claim_mission(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiPath(mission_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<MissionClaim>> {
    let player_id = claims.player_id()?;
    let claim = tracked(
        operations::MISSION_CLAIM,
        state.services.game.claim_mission(player_id, mission_id).await,
    )?;
    state.cache.invalidate(&keys::missions(player_id)).await;
    invalidate_players(&state, &[player_id]).await;
    Ok(ApiResponse::ok(claim).with_message("Mission reward claimed"))
}

pub async fn badges(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse<Vec<BadgeEntity>>> {
    let game = &state.services.game;
    let badges = state
        .cache
        .get_or_load(keys::BADGES, || game.list_badges())
        .await?;
    Ok(ApiResponse::ok(badges))
}

pub async fn my_badges(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
) -> ApiResult<ApiResponse<Vec<PlayerBadgeEntity>>> {
    let badges = state.services.game.player_badges(claims.player_id()?).await?;
    Ok(ApiResponse::ok(badges))
}
