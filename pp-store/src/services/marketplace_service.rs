//! Marketplace Service
//!
//! Player-to-player listings priced in power tokens.

use chrono::Utc;
use pp_core::logging::operations;
use pp_core::{validate_amount, CoreError, GameConfig, ListingStatus, TransactionKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::entities::{ListingEntity, MarketplacePurchaseEntity, NewListing, PlayerEntity};
use crate::error::{StoreError, StoreResult};
use crate::repos::Store;

pub const MAX_LISTING_TITLE_LEN: usize = 120;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingPurchase {
    pub purchase: MarketplacePurchaseEntity,
    pub listing: ListingEntity,
    pub buyer: PlayerEntity,
}

/// Marketplace Service
pub struct MarketplaceService {
    store: Arc<dyn Store>,
    config: GameConfig,
}

impl MarketplaceService {
    pub fn new(store: Arc<dyn Store>, config: GameConfig) -> Self {
        Self { store, config }
    }

    pub async fn create_listing(&self, new: NewListing) -> StoreResult<ListingEntity> {
        let title = new.title.trim();
        if title.is_empty() || title.chars().count() > MAX_LISTING_TITLE_LEN {
            return Err(StoreError::validation(format!(
                "listing title must be 1 to {} characters",
                MAX_LISTING_TITLE_LEN
            )));
        }
        validate_amount(new.price)?;
        validate_amount(new.quantity)?;
        let listing = self
            .store
            .create_listing(NewListing {
                title: title.to_string(),
                ..new
            })
            .await?;
        info!(player_id = %listing.seller_id, listing_id = %listing.id, "Listing created");
        Ok(listing)
    }

    pub async fn get_listing(&self, id: Uuid) -> StoreResult<ListingEntity> {
        self.store
            .get_listing(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Listing", id))
    }

    /// Active listings unless a status filter is given
    pub async fn list_listings(
        &self,
        status: Option<&str>,
        limit: Option<i64>,
    ) -> StoreResult<Vec<ListingEntity>> {
        let status = match status {
            Some(s) => ListingStatus::parse(s)?,
            None => ListingStatus::Active,
        };
        self.store
            .list_listings(Some(status.as_str()), self.config.page_size(limit))
            .await
    }

    pub async fn cancel_listing(&self, id: Uuid, seller_id: Uuid) -> StoreResult<ListingEntity> {
        self.store.cancel_listing(id, seller_id).await
    }

    /// Buy from a listing; buyer pays, seller is paid, stock drops
    pub async fn purchase(
        &self,
        listing_id: Uuid,
        buyer_id: Uuid,
        quantity: i64,
    ) -> StoreResult<ListingPurchase> {
        validate_amount(quantity)?;
        let now = Utc::now();
        let (purchase, listing, buyer) = self
            .store
            .purchase_listing(
                listing_id,
                buyer_id,
                quantity,
                Box::new(move |listing, buyer, seller| {
                    if !listing.is_active() {
                        return Err(StoreError::conflict(format!("listing is {}", listing.status)));
                    }
                    if quantity > listing.quantity {
                        return Err(CoreError::SupplyExceeded {
                            requested: quantity,
                            remaining: listing.quantity,
                        }
                        .into());
                    }
                    let total = listing
                        .price
                        .checked_mul(quantity)
                        .ok_or_else(|| StoreError::validation("purchase total overflows"))?;

                    let paid = buyer
                        .debit_tokens(
                            total,
                            TransactionKind::MarketplacePurchase,
                            format!("Bought {} x{}", listing.title, quantity),
                        )?
                        .with_counterparty(seller.id);
                    let earned = seller
                        .credit_tokens(
                            total,
                            TransactionKind::MarketplaceSale,
                            format!("Sold {} x{}", listing.title, quantity),
                        )?
                        .with_counterparty(buyer.id);

                    listing.quantity -= quantity;
                    if listing.quantity == 0 {
                        listing.status = ListingStatus::Sold.as_str().to_string();
                    }
                    listing.updated_at = now;
                    buyer.touch(now);
                    Ok(vec![paid, earned])
                }),
            )
            .await?;

        info!(
            player_id = %buyer_id,
            operation = operations::MARKETPLACE_PURCHASE,
            amount = purchase.total_price,
            listing_id = %listing_id,
            "Listing purchased"
        );
        Ok(ListingPurchase {
            purchase,
            listing,
            buyer,
        })
    }

    pub async fn purchases(
        &self,
        buyer_id: Uuid,
        limit: Option<i64>,
    ) -> StoreResult<Vec<MarketplacePurchaseEntity>> {
        self.store
            .list_purchases(buyer_id, self.config.page_size(limit))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{funded_player, memory_store};

    fn service(store: Arc<dyn Store>) -> MarketplaceService {
        MarketplaceService::new(store, GameConfig::default())
    }

    fn listing(seller_id: Uuid, price: i64, quantity: i64) -> NewListing {
        NewListing {
            seller_id,
            title: "Hand-made poster".to_string(),
            description: "Signed".to_string(),
            price,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_purchase_moves_tokens_and_sells_out() {
        let store = memory_store();
        let market = service(store.clone());
        let seller = funded_player(&store, 1, 0).await;
        let buyer = funded_player(&store, 2, 100).await;
        let created = market.create_listing(listing(seller.id, 20, 3)).await.unwrap();

        let first = market.purchase(created.id, buyer.id, 2).await.unwrap();
        assert_eq!(first.purchase.total_price, 40);
        assert_eq!(first.buyer.power_tokens, 60);
        assert_eq!(first.listing.quantity, 1);

        let second = market.purchase(created.id, buyer.id, 1).await.unwrap();
        assert_eq!(second.listing.status, "sold");

        let seller = store.get_player(seller.id).await.unwrap().unwrap();
        assert_eq!(seller.power_tokens, 60);
        assert!(market.list_listings(None, None).await.unwrap().is_empty());
        assert_eq!(market.purchases(buyer.id, None).await.unwrap().len(), 2);

        assert!(matches!(
            market.purchase(created.id, buyer.id, 1).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_purchase_rules() {
        let store = memory_store();
        let market = service(store.clone());
        let seller = funded_player(&store, 1, 100).await;
        let buyer = funded_player(&store, 2, 10).await;
        let created = market.create_listing(listing(seller.id, 20, 2)).await.unwrap();

        assert!(matches!(
            market.purchase(created.id, seller.id, 1).await,
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            market.purchase(created.id, buyer.id, 3).await,
            Err(StoreError::Rule(CoreError::SupplyExceeded { .. }))
        ));
        assert!(matches!(
            market.purchase(created.id, buyer.id, 1).await,
            Err(StoreError::Rule(CoreError::InsufficientFunds { .. }))
        ));
        assert_eq!(market.get_listing(created.id).await.unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn test_only_seller_cancels() {
        let store = memory_store();
        let market = service(store.clone());
        let seller = funded_player(&store, 1, 0).await;
        let other = funded_player(&store, 2, 0).await;
        let created = market.create_listing(listing(seller.id, 5, 1)).await.unwrap();

        assert!(matches!(
            market.cancel_listing(created.id, other.id).await,
            Err(StoreError::Forbidden(_))
        ));
        let cancelled = market.cancel_listing(created.id, seller.id).await.unwrap();
        assert_eq!(cancelled.status, "cancelled");
        assert!(matches!(
            market.cancel_listing(created.id, seller.id).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_listing_validation() {
        let market = service(memory_store());
        let seller = Uuid::new_v4();
        assert!(market.create_listing(listing(seller, 0, 1)).await.is_err());
        assert!(market.create_listing(listing(seller, 1, 0)).await.is_err());
        let mut untitled = listing(seller, 1, 1);
        untitled.title = "  ".to_string();
        assert!(matches!(
            market.create_listing(untitled).await,
            Err(StoreError::Validation(_))
        ));
    }
}
