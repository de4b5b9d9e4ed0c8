//! Login

use axum::extract::State;
use pp_core::logging::operations;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::roles_for;
use crate::dto::{LoginRequest, LoginResponse};
use crate::error::ApiResult;
use crate::response::{ApiJson, ApiResponse};
use crate::state::AppState;

/// Register on first call, then hand out a token
///
/// A referral code is only applied when the player is created here; a bad
/// code does not fail the login.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<ApiResponse<LoginResponse>> {
    let services = &state.services;
    let outcome = services.game.login(req.telegram_id, &req.username).await?;
    let mut player = outcome.player;

    let mut referral = None;
    if outcome.created {
        if let Some(code) = req.referral_code.as_deref().filter(|c| !c.trim().is_empty()) {
            match services.social.apply_referral(player.id, code).await {
                Ok(applied) => {
                    info!(
                        player_id = %player.id,
                        operation = operations::REFERRAL,
                        referrer_id = %applied.referrer_id,
                        "Referral applied at signup"
                    );
                    player = services.game.get_player(player.id).await?;
                    referral = Some(applied);
                }
                Err(e) => warn!(player_id = %player.id, error = %e, "Referral code rejected at signup"),
            }
        }
    }

    let issued = state
        .jwt
        .issue(player.id, player.telegram_id, roles_for(player.is_admin))?;

    let message = if outcome.created { "Player registered" } else { "Logged in" };
    let body = LoginResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        created: outcome.created,
        player,
        referral,
    };
    Ok(if outcome.created {
        ApiResponse::created(body).with_message(message)
    } else {
        ApiResponse::ok(body).with_message(message)
    })
}
