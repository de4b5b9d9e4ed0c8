//! Admin endpoints
//!
//! Routed behind [`require_admin`](crate::auth::require_admin); handlers
//! here assume the caller already holds the admin role.

use axum::extract::State;
use pp_core::logging::operations;
use pp_store::entities::{
    BadgeEntity, DailyActivity, MissionEntity, NewBadge, NewMission, NewShopItem, PlayerEntity,
    ShopItemEntity,
};
use pp_store::services::{AnalyticsOverview, Balance};
use std::sync::Arc;
use tracing::info;

use crate::auth::AuthClaims;
use crate::cache::keys;
use crate::dto::{DailyQuery, GrantRequest, PageQuery};
use crate::error::ApiResult;
use crate::handlers::{invalidate_players, tracked};
use crate::response::{ApiJson, ApiQuery, ApiResponse};
use crate::state::AppState;

const DEFAULT_DAILY_WINDOW: i64 = 7;

pub async fn analytics_overview(
    State(state): State<Arc<AppState>>,
) -> ApiResult<ApiResponse<AnalyticsOverview>> {
    let overview = state.services.analytics.overview().await?;
    Ok(ApiResponse::ok(overview))
}

pub async fn analytics_daily(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<DailyQuery>,
) -> ApiResult<ApiResponse<Vec<DailyActivity>>> {
    let days = query.days.unwrap_or(DEFAULT_DAILY_WINDOW);
    let activity = state.services.analytics.daily(days).await?;
    Ok(ApiResponse::ok(activity))
}

pub async fn players(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<ApiResponse<Vec<PlayerEntity>>> {
    let players = state
        .services
        .analytics
        .players(query.limit, query.offset)
        .await?;
    Ok(ApiResponse::ok(players))
}

/// Players see new missions once their cached list expires
pub async fn create_mission(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiJson(req): ApiJson<NewMission>,
) -> ApiResult<ApiResponse<MissionEntity>> {
    let mission = state.services.game.create_mission(req).await?;
    info!(admin_id = %claims.sub, mission_id = %mission.id, "Mission created");
    Ok(ApiResponse::created(mission))
}

pub async fn create_badge(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiJson(req): ApiJson<NewBadge>,
) -> ApiResult<ApiResponse<BadgeEntity>> {
    let badge = state.services.game.create_badge(req).await?;
    state.cache.invalidate(keys::BADGES).await;
    info!(admin_id = %claims.sub, badge = %badge.code, "Badge created");
    Ok(ApiResponse::created(badge))
}

pub async fn create_shop_item(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiJson(req): ApiJson<NewShopItem>,
) -> ApiResult<ApiResponse<ShopItemEntity>> {
    let item = state.services.economy.create_shop_item(req).await?;
    state.cache.invalidate(keys::SHOP_ITEMS).await;
    info!(admin_id = %claims.sub, item_id = %item.id, "Shop item created");
    Ok(ApiResponse::created(item))
}

pub async fn grant(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiJson(req): ApiJson<GrantRequest>,
) -> ApiResult<ApiResponse<Balance>> {
    let reason = req.reason.as_deref().unwrap_or_default();
    let balance = tracked(
        operations::ADMIN_GRANT,
        state
            .services
            .economy
            .admin_grant(req.player_id, req.tokens, req.diamonds, reason)
            .await,
    )?;
    invalidate_players(&state, &[req.player_id]).await;
    info!(
        admin_id = %claims.sub,
        player_id = %req.player_id,
        tokens = req.tokens,
        diamonds = req.diamonds,
        "Admin grant"
    );
    Ok(ApiResponse::ok(balance).with_message("Grant applied"))
}
