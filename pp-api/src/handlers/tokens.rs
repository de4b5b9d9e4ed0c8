//! Movement tokens

use axum::extract::State;
use pp_core::logging::operations;
use pp_core::PriceQuote;
use pp_store::entities::{MovementTokenEntity, NewMovementToken, TokenHoldingEntity};
use pp_store::services::TokenPurchase;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthClaims;
use crate::dto::{CreateMovementTokenRequest, LimitQuery, TokenPurchaseRequest};
use crate::error::ApiResult;
use crate::handlers::{invalidate_players, tracked};
use crate::response::{ApiJson, ApiPath, ApiQuery, ApiResponse};
use crate::state::AppState;

pub async fn create_token(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiJson(req): ApiJson<CreateMovementTokenRequest>,
) -> ApiResult<ApiResponse<MovementTokenEntity>> {
    let token = state
        .services
        .tokens
        .create(NewMovementToken {
            symbol: req.symbol,
            name: req.name,
            description: req.description,
            creator_id: claims.player_id()?,
            total_supply: req.total_supply,
            initial_price: req.initial_price,
        })
        .await?;
    Ok(ApiResponse::created(token))
}

pub async fn list_tokens(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> ApiResult<ApiResponse<Vec<MovementTokenEntity>>> {
    let tokens = state.services.tokens.list(query.limit).await?;
    Ok(ApiResponse::ok(tokens))
}

pub async fn get_token(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<MovementTokenEntity>> {
    let token = state.services.tokens.get(id).await?;
    Ok(ApiResponse::ok(token))
}

/// What buying `amount` would cost right now
pub async fn quote_token(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<TokenPurchaseRequest>,
) -> ApiResult<ApiResponse<PriceQuote>> {
    let quote = state.services.tokens.quote(id, query.amount).await?;
    Ok(ApiResponse::ok(quote))
}

/// Buy at the current price; the price moves after the purchase
pub async fn purchase_token(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<TokenPurchaseRequest>,
) -> ApiResult<ApiResponse<TokenPurchase>> {
    let buyer_id = claims.player_id()?;
    let purchase = tracked(
        operations::MOVEMENT_TOKEN_PURCHASE,
        state.services.tokens.purchase(id, buyer_id, req.amount).await,
    )?;
    invalidate_players(&state, &[buyer_id]).await;
    Ok(ApiResponse::ok(purchase))
}

pub async fn my_holdings(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
) -> ApiResult<ApiResponse<Vec<TokenHoldingEntity>>> {
    let holdings = state.services.tokens.holdings(claims.player_id()?).await?;
    Ok(ApiResponse::ok(holdings))
}
