//! Marketplace and Tip Repositories

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{
    LedgerEntry, ListingEntity, MarketplacePurchaseEntity, NewListing, NewTip, PlayerEntity,
    TipDirection, TipEntity,
};
use crate::error::StoreResult;
use crate::repos::PairMutation;

/// Purchase step: listing, buyer, seller
pub type ListingMutation<'a> = Box<
    dyn FnOnce(&mut ListingEntity, &mut PlayerEntity, &mut PlayerEntity) -> StoreResult<Vec<LedgerEntry>>
        + Send
        + 'a,
>;

#[async_trait]
pub trait MarketplaceRepository: Send + Sync {
    async fn create_listing(&self, new: NewListing) -> StoreResult<ListingEntity>;

    async fn get_listing(&self, id: Uuid) -> StoreResult<Option<ListingEntity>>;

    /// Newest first, optionally filtered by status name
    async fn list_listings(
        &self,
        status: Option<&str>,
        limit: i64,
    ) -> StoreResult<Vec<ListingEntity>>;

    /// Cancel an active listing owned by `seller_id`
    async fn cancel_listing(&self, id: Uuid, seller_id: Uuid) -> StoreResult<ListingEntity>;

    /// Atomically apply a purchase and record it
    async fn purchase_listing<'a>(
        &self,
        listing_id: Uuid,
        buyer_id: Uuid,
        quantity: i64,
        mutation: ListingMutation<'a>,
    ) -> StoreResult<(MarketplacePurchaseEntity, ListingEntity, PlayerEntity)>;

    /// Purchases made by a buyer, newest first
    async fn list_purchases(
        &self,
        buyer_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<MarketplacePurchaseEntity>>;
}

#[async_trait]
pub trait TipRepository: Send + Sync {
    /// Atomically move funds and record the tip; the mutation receives (sender, recipient)
    async fn send_tip<'a>(&self, tip: NewTip, mutation: PairMutation<'a>) -> StoreResult<TipEntity>;

    /// Newest first
    async fn list_tips(
        &self,
        player_id: Uuid,
        direction: TipDirection,
        limit: i64,
    ) -> StoreResult<Vec<TipEntity>>;
}
