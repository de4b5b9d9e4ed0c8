use async_trait::async_trait;
use chrono::Utc;
use pp_core::ListingStatus;
use uuid::Uuid;

use super::{newest_first, MemoryStore};
use crate::entities::*;
use crate::error::{StoreError, StoreResult};
use crate::repos::{
    ListingMutation, MarketplaceRepository, MovementTokenRepository, PairMutation, TipRepository,
    TokenPurchaseMutation,
};

#[async_trait]
impl MarketplaceRepository for MemoryStore {
    async fn create_listing(&self, new: NewListing) -> StoreResult<ListingEntity> {
        let listing = ListingEntity::new(new, Utc::now());
        self.state
            .write()
            .await
            .listings
            .insert(listing.id, listing.clone());
        Ok(listing)
    }

    async fn get_listing(&self, id: Uuid) -> StoreResult<Option<ListingEntity>> {
        Ok(self.state.read().await.listings.get(&id).cloned())
    }

    async fn list_listings(
        &self,
        status: Option<&str>,
        limit: i64,
    ) -> StoreResult<Vec<ListingEntity>> {
        let state = self.state.read().await;
        let rows = state
            .listings
            .values()
            .filter(|l| status.map_or(true, |s| l.status == s))
            .cloned()
            .collect();
        Ok(newest_first(rows, |l| l.created_at, limit))
    }

    async fn cancel_listing(&self, id: Uuid, seller_id: Uuid) -> StoreResult<ListingEntity> {
        let mut state = self.state.write().await;
        let listing = state
            .listings
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Listing", id))?;
        if listing.seller_id != seller_id {
            return Err(StoreError::forbidden("only the seller can cancel a listing"));
        }
        if !listing.is_active() {
            return Err(StoreError::conflict(format!(
                "listing is {}",
                listing.status
            )));
        }
        listing.status = ListingStatus::Cancelled.as_str().to_string();
        listing.updated_at = Utc::now();
        Ok(listing.clone())
    }

    async fn purchase_listing<'a>(
        &self,
        listing_id: Uuid,
        buyer_id: Uuid,
        quantity: i64,
        mutation: ListingMutation<'a>,
    ) -> StoreResult<(MarketplacePurchaseEntity, ListingEntity, PlayerEntity)> {
        let mut state = self.state.write().await;
        let mut listing = state
            .listings
            .get(&listing_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Listing", listing_id))?;
        if listing.seller_id == buyer_id {
            return Err(StoreError::validation("cannot buy your own listing"));
        }
        let mut buyer = state.player(buyer_id)?;
        let mut seller = state.player(listing.seller_id)?;

        // purchase row uses the price at the time of sale
        let now = Utc::now();
        let purchase = MarketplacePurchaseEntity::new(&listing, buyer_id, quantity, now);
        let entries = mutation(&mut listing, &mut buyer, &mut seller)?;
        listing.updated_at = now;

        state.append_ledger(entries, now);
        state.listings.insert(listing.id, listing.clone());
        state.market_purchases.push(purchase.clone());
        state.commit_player(seller, now);
        let buyer = state.commit_player(buyer, now);
        Ok((purchase, listing, buyer))
    }

    async fn list_purchases(
        &self,
        buyer_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<MarketplacePurchaseEntity>> {
        let state = self.state.read().await;
        let rows = state
            .market_purchases
            .iter()
            .filter(|p| p.buyer_id == buyer_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |p| p.created_at, limit))
    }
}

#[async_trait]
impl TipRepository for MemoryStore {
    async fn send_tip<'a>(&self, tip: NewTip, mutation: PairMutation<'a>) -> StoreResult<TipEntity> {
        if tip.sender_id == tip.recipient_id {
            return Err(StoreError::validation("cannot tip yourself"));
        }

        let mut state = self.state.write().await;
        let mut sender = state.player(tip.sender_id)?;
        let mut recipient = state.player(tip.recipient_id)?;
        let entries = mutation(&mut sender, &mut recipient)?;

        let now = Utc::now();
        let row = TipEntity::new(tip, now);
        state.append_ledger(entries, now);
        state.tips.push(row.clone());
        state.commit_player(sender, now);
        state.commit_player(recipient, now);
        Ok(row)
    }

    async fn list_tips(
        &self,
        player_id: Uuid,
        direction: TipDirection,
        limit: i64,
    ) -> StoreResult<Vec<TipEntity>> {
        let state = self.state.read().await;
        let rows = state
            .tips
            .iter()
            .filter(|t| match direction {
                TipDirection::Sent => t.sender_id == player_id,
                TipDirection::Received => t.recipient_id == player_id,
                TipDirection::All => t.sender_id == player_id || t.recipient_id == player_id,
            })
            .cloned()
            .collect();
        Ok(newest_first(rows, |t| t.created_at, limit))
    }
}

#[async_trait]
impl MovementTokenRepository for MemoryStore {
    async fn create_token(&self, new: NewMovementToken) -> StoreResult<MovementTokenEntity> {
        let mut state = self.state.write().await;
        if state
            .tokens
            .values()
            .any(|t| t.symbol.eq_ignore_ascii_case(&new.symbol))
        {
            return Err(StoreError::conflict(format!(
                "token symbol {} already exists",
                new.symbol
            )));
        }
        let token = MovementTokenEntity::new(new, Utc::now())?;
        state.tokens.insert(token.id, token.clone());
        Ok(token)
    }

    async fn get_token(&self, id: Uuid) -> StoreResult<Option<MovementTokenEntity>> {
        Ok(self.state.read().await.tokens.get(&id).cloned())
    }

    async fn list_tokens(&self, limit: i64) -> StoreResult<Vec<MovementTokenEntity>> {
        let state = self.state.read().await;
        let mut tokens: Vec<_> = state.tokens.values().cloned().collect();
        tokens.sort_by(|a, b| b.market_cap.cmp(&a.market_cap).then(a.symbol.cmp(&b.symbol)));
        tokens.truncate(limit.max(0) as usize);
        Ok(tokens)
    }

    async fn purchase_token<'a>(
        &self,
        token_id: Uuid,
        buyer_id: Uuid,
        mutation: TokenPurchaseMutation<'a>,
    ) -> StoreResult<(MovementTokenEntity, TokenHoldingEntity, PlayerEntity)> {
        let mut state = self.state.write().await;
        let mut token = state
            .tokens
            .get(&token_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("MovementToken", token_id))?;
        let mut buyer = state.player(buyer_id)?;

        let circulating_before = token.circulating_supply;
        let entries = mutation(&mut token, &mut buyer)?;
        let bought = token.circulating_supply - circulating_before;

        let now = Utc::now();
        token.updated_at = now;
        let holding = state
            .holdings
            .entry((buyer_id, token_id))
            .or_insert_with(|| TokenHoldingEntity {
                player_id: buyer_id,
                token_id,
                amount: 0,
                updated_at: now,
            });
        holding.amount += bought;
        holding.updated_at = now;
        let holding = holding.clone();

        state.append_ledger(entries, now);
        state.tokens.insert(token.id, token.clone());
        let buyer = state.commit_player(buyer, now);
        Ok((token, holding, buyer))
    }

    async fn list_holdings(&self, player_id: Uuid) -> StoreResult<Vec<TokenHoldingEntity>> {
        let state = self.state.read().await;
        let mut holdings: Vec<_> = state
            .holdings
            .values()
            .filter(|h| h.player_id == player_id && h.amount > 0)
            .cloned()
            .collect();
        holdings.sort_by(|a, b| b.amount.cmp(&a.amount));
        Ok(holdings)
    }
}
