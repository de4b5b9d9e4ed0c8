//! Tips and gifts

use axum::extract::State;
use pp_core::logging::operations;
use pp_store::entities::TipEntity;
use std::sync::Arc;

use crate::auth::AuthClaims;
use crate::dto::{TipRequest, TipsQuery};
use crate::error::ApiResult;
use crate::handlers::{invalidate_players, tracked};
use crate::response::{ApiJson, ApiQuery, ApiResponse};
use crate::state::AppState;

pub async fn send_tip(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiJson(req): ApiJson<TipRequest>,
) -> ApiResult<ApiResponse<TipEntity>> {
    let sender_id = claims.player_id()?;
    let tip = tracked(
        operations::TIP,
        state
            .services
            .tips
            .send(sender_id, req.recipient_id, req.amount, req.kind, req.message)
            .await,
    )?;
    invalidate_players(&state, &[sender_id, req.recipient_id]).await;
    Ok(ApiResponse::created(tip))
}

/// `direction` is sent, received or all (default)
pub async fn list_tips(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiQuery(query): ApiQuery<TipsQuery>,
) -> ApiResult<ApiResponse<Vec<TipEntity>>> {
    let tips = state
        .services
        .tips
        .list(claims.player_id()?, query.direction, query.limit)
        .await?;
    Ok(ApiResponse::ok(tips))
}
