//! Power token balance, transactions and the shop

use axum::extract::State;
use pp_core::logging::operations;
use pp_store::entities::{ShopItemEntity, TokenTransactionEntity};
use pp_store::services::{Balance, ShopPurchaseOutcome};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthClaims;
use crate::cache::keys;
use crate::dto::{LimitQuery, QuantityRequest, TransactionRequest, TransactionType};
use crate::error::{ApiError, ApiResult};
use crate::handlers::{invalidate_players, tracked};
use crate::response::{ApiJson, ApiPath, ApiQuery, ApiResponse};
use crate::state::AppState;

pub async fn balance(State(state): State<Arc<AppState>>, claims: AuthClaims) -> ApiResult<ApiResponse<Balance>> {
    let balance = state.services.economy.balance(claims.player_id()?).await?;
    Ok(ApiResponse::ok(balance))
}

/// Result of `POST /economy/transaction`
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TransactionResult {
    Balance(Balance),
    Transfer(pp_store::services::TransferOutcome),
}

/// `type` is one of earn, spend or transfer
pub async fn transaction(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiJson(req): ApiJson<TransactionRequest>,
) -> ApiResult<ApiResponse<TransactionResult>> {
    let player_id = claims.player_id()?;
    let economy = &state.services.economy;

    let (result, touched): (TransactionResult, Vec<Uuid>) = match req.kind {
        TransactionType::Earn => {
            let description = req.description.as_deref().unwrap_or("Earned");
            let balance = tracked(
                operations::EARN,
                economy.earn(player_id, req.amount, description).await,
            )?;
            (TransactionResult::Balance(balance), vec![player_id])
        }
        TransactionType::Spend => {
            let description = req.description.as_deref().unwrap_or("Spent");
            let balance = tracked(
                operations::SPEND,
                economy.spend(player_id, req.amount, description).await,
            )?;
            (TransactionResult::Balance(balance), vec![player_id])
        }
        TransactionType::Transfer => {
            let recipient_id = req
                .recipient_id
                .ok_or_else(|| ApiError::validation("recipient_id is required for transfers"))?;
            let description = req.description.as_deref().unwrap_or("Transfer");
            let outcome = tracked(
                operations::TRANSFER,
                economy
                    .transfer(player_id, recipient_id, req.amount, description)
                    .await,
            )?;
            (TransactionResult::Transfer(outcome), vec![player_id, recipient_id])
        }
    };

    invalidate_players(&state, &touched).await;
    Ok(ApiResponse::ok(result))
}

pub async fn transactions(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> ApiResult<ApiResponse<Vec<TokenTransactionEntity>>> {
    let history = state
        .services
        .economy
        .history(claims.player_id()?, query.limit)
        .await?;
    Ok(ApiResponse::ok(history))
}

pub async fn shop(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse<Vec<ShopItemEntity>>> {
    let economy = &state.services.economy;
    let items = state
        .cache
        .get_or_load(keys::SHOP_ITEMS, || economy.list_shop())
        .await?;
    Ok(ApiResponse::ok(items))
}

pub async fn purchase_item(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiPath(item_id): ApiPath<Uuid>,
    body: Option<ApiJson<QuantityRequest>>,
) -> ApiResult<ApiResponse<ShopPurchaseOutcome>> {
    let player_id = claims.player_id()?;
    let quantity = body.and_then(|ApiJson(req)| req.quantity).unwrap_or(1);
    let outcome = tracked(
        operations::SHOP_PURCHASE,
        state
            .services
            .economy
            .purchase_item(player_id, item_id, quantity)
            .await,
    )?;

    // stock changed
    state.cache.invalidate(keys::SHOP_ITEMS).await;
    invalidate_players(&state, &[player_id]).await;
    Ok(ApiResponse::ok(outcome).with_message("Purchase complete"))
}
