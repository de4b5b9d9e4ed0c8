//! Player-to-player marketplace

use axum::extract::State;
use pp_core::logging::operations;
use pp_store::entities::{ListingEntity, MarketplacePurchaseEntity, NewListing};
use pp_store::services::ListingPurchase;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthClaims;
use crate::dto::{CreateListingRequest, LimitQuery, ListingsQuery, QuantityRequest};
use crate::error::ApiResult;
use crate::handlers::{invalidate_players, tracked};
use crate::response::{ApiJson, ApiPath, ApiQuery, ApiResponse};
use crate::state::AppState;

pub async fn create_listing(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiJson(req): ApiJson<CreateListingRequest>,
) -> ApiResult<ApiResponse<ListingEntity>> {
    let listing = state
        .services
        .marketplace
        .create_listing(NewListing {
            seller_id: claims.player_id()?,
            title: req.title,
            description: req.description,
            price: req.price,
            quantity: req.quantity,
        })
        .await?;
    Ok(ApiResponse::created(listing))
}

/// Active listings unless `status` asks for sold or cancelled ones
pub async fn list_listings(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ListingsQuery>,
) -> ApiResult<ApiResponse<Vec<ListingEntity>>> {
    let listings = state
        .services
        .marketplace
        .list_listings(query.status.as_deref(), query.limit)
        .await?;
    Ok(ApiResponse::ok(listings))
}

pub async fn get_listing(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<ListingEntity>> {
    let listing = state.services.marketplace.get_listing(id).await?;
    Ok(ApiResponse::ok(listing))
}

pub async fn purchase(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiPath(id): ApiPath<Uuid>,
    body: Option<ApiJson<QuantityRequest>>,
) -> ApiResult<ApiResponse<ListingPurchase>> {
    let buyer_id = claims.player_id()?;
    let quantity = body.and_then(|ApiJson(req)| req.quantity).unwrap_or(1);
    let outcome = tracked(
        operations::MARKETPLACE_PURCHASE,
        state.services.marketplace.purchase(id, buyer_id, quantity).await,
    )?;
    invalidate_players(&state, &[buyer_id, outcome.listing.seller_id]).await;
    Ok(ApiResponse::ok(outcome).with_message("Purchase complete"))
}

pub async fn cancel_listing(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<ListingEntity>> {
    let listing = state
        .services
        .marketplace
        .cancel_listing(id, claims.player_id()?)
        .await?;
    Ok(ApiResponse::ok(listing).with_message("Listing cancelled"))
}

pub async fn my_purchases(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> ApiResult<ApiResponse<Vec<MarketplacePurchaseEntity>>> {
    let purchases = state
        .services
        .marketplace
        .purchases(claims.player_id()?, query.limit)
        .await?;
    Ok(ApiResponse::ok(purchases))
}
