//! Diamonds: purchase through the payment bridge, spend, stake and tiers
//!
//! Purchases and stake moves go to the contract first and are recorded in
//! the ledger with the returned transaction hash. Balances are checked
//! before the contract call so that obviously invalid requests never reach
//! the chain.

use axum::extract::State;
use pp_core::logging::operations;
use pp_core::{diamonds_for_payment, validate_amount, CoreError, TierBenefits};
use pp_store::entities::{DiamondTransactionEntity, PlayerEntity};
use std::sync::Arc;
use tracing::{error, warn};

use crate::auth::AuthClaims;
use crate::dto::{
    DiamondOverview, DiamondPurchaseRequest, DiamondPurchaseResponse, DiamondSpendRequest, LimitQuery,
    StakeRequest, StakeResponse,
};
use crate::error::{ApiError, ApiResult};
use crate::handlers::{invalidate_players, tracked};
use crate::response::{ApiJson, ApiQuery, ApiResponse};
use crate::state::AppState;

fn wallet_for(player: &PlayerEntity, requested: Option<String>) -> ApiResult<String> {
    requested
        .filter(|w| !w.trim().is_empty())
        .or_else(|| player.wallet_address.clone())
        .ok_or_else(|| ApiError::validation("wallet_address is required (or set one on your profile)"))
}

pub async fn purchase(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiJson(req): ApiJson<DiamondPurchaseRequest>,
) -> ApiResult<ApiResponse<DiamondPurchaseResponse>> {
    let player_id = claims.player_id()?;
    let player = state.services.game.get_player(player_id).await?;
    let wallet = wallet_for(&player, req.wallet_address)?;
    diamonds_for_payment(req.amount)?;

    let tx = tracked(
        operations::DIAMOND_PURCHASE,
        state.gateway.process_payment(&wallet, req.amount).await,
    )?
    .tx;

    let purchase = state
        .services
        .diamonds
        .purchase(player_id, req.amount, &tx.tx_hash)
        .await
        .map_err(|e| {
            error!(player_id = %player_id, tx_hash = %tx.tx_hash, error = %e, "Payment confirmed but not credited");
            e
        })?;

    invalidate_players(&state, &[player_id]).await;
    let message = format!("{} diamonds credited", purchase.diamonds_credited);
    Ok(ApiResponse::ok(DiamondPurchaseResponse { tx, purchase }).with_message(message))
}

pub async fn spend(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiJson(req): ApiJson<DiamondSpendRequest>,
) -> ApiResult<ApiResponse<PlayerEntity>> {
    let player_id = claims.player_id()?;
    let reason = req.reason.as_deref().unwrap_or("Diamond spend");
    let player = tracked(
        operations::DIAMOND_SPEND,
        state.services.diamonds.spend(player_id, req.amount, reason).await,
    )?;
    invalidate_players(&state, &[player_id]).await;
    Ok(ApiResponse::ok(player))
}

pub async fn stake(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiJson(req): ApiJson<StakeRequest>,
) -> ApiResult<ApiResponse<StakeResponse>> {
    let player_id = claims.player_id()?;
    let amount = validate_amount(req.amount)?;
    let player = state.services.game.get_player(player_id).await?;
    if player.diamonds < amount {
        return Err(CoreError::insufficient_diamonds(amount, player.diamonds).into());
    }
    let wallet = wallet_for(&player, req.wallet_address)?;

    let tx = tracked(operations::STAKE, state.gateway.stake_tokens(&wallet, amount).await)?;
    let outcome = state
        .services
        .diamonds
        .stake(player_id, amount, Some(tx.tx_hash.clone()))
        .await
        .map_err(|e| {
            error!(player_id = %player_id, tx_hash = %tx.tx_hash, error = %e, "Stake confirmed but not recorded");
            e
        })?;

    invalidate_players(&state, &[player_id]).await;
    Ok(ApiResponse::ok(StakeResponse { tx, outcome }))
}

pub async fn unstake(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiJson(req): ApiJson<StakeRequest>,
) -> ApiResult<ApiResponse<StakeResponse>> {
    let player_id = claims.player_id()?;
    let amount = validate_amount(req.amount)?;
    let player = state.services.game.get_player(player_id).await?;
    if player.diamonds_staked < amount {
        return Err(CoreError::InsufficientFunds {
            currency: "staked diamonds".to_string(),
            required: amount,
            available: player.diamonds_staked,
        }
        .into());
    }
    let wallet = wallet_for(&player, req.wallet_address)?;

    let tx = tracked(operations::UNSTAKE, state.gateway.unstake_tokens(&wallet, amount).await)?;
    let outcome = state
        .services
        .diamonds
        .unstake(player_id, amount, Some(tx.tx_hash.clone()))
        .await
        .map_err(|e| {
            error!(player_id = %player_id, tx_hash = %tx.tx_hash, error = %e, "Unstake confirmed but not recorded");
            e
        })?;

    invalidate_players(&state, &[player_id]).await;
    Ok(ApiResponse::ok(StakeResponse { tx, outcome }))
}

pub async fn tiers(State(state): State<Arc<AppState>>) -> ApiResponse<Vec<TierBenefits>> {
    ApiResponse::ok(state.services.diamonds.tiers())
}

/// Ledger balances plus what the contract reports for the player's wallet
pub async fn me(State(state): State<Arc<AppState>>, claims: AuthClaims) -> ApiResult<ApiResponse<DiamondOverview>> {
    let player_id = claims.player_id()?;
    let summary = state.services.diamonds.summary(player_id).await?;
    let player = state.services.game.get_player(player_id).await?;

    let chain = match player.wallet_address.as_deref() {
        Some(wallet) => match state.gateway.get_user_stats(wallet).await {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!(player_id = %player_id, error = %e, "Chain stats unavailable");
                None
            }
        },
        None => None,
    };
    Ok(ApiResponse::ok(DiamondOverview { summary, chain }))
}

pub async fn transactions(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> ApiResult<ApiResponse<Vec<DiamondTransactionEntity>>> {
    let history = state
        .services
        .diamonds
        .history(claims.player_id()?, query.limit)
        .await?;
    Ok(ApiResponse::ok(history))
}
