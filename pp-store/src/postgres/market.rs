use async_trait::async_trait;
use chrono::Utc;
use pp_core::ListingStatus;
use uuid::Uuid;

use super::{insert_ledger, lock_pair, lock_player, save_player, PgStore};
use crate::entities::*;
use crate::error::{StoreError, StoreResult};
use crate::repos::{
    ListingMutation, MarketplaceRepository, MovementTokenRepository, PairMutation, TipRepository,
    TokenPurchaseMutation,
};

#[async_trait]
impl MarketplaceRepository for PgStore {
    async fn create_listing(&self, new: NewListing) -> StoreResult<ListingEntity> {
        let listing = ListingEntity::new(new, Utc::now());
        let row = sqlx::query_as::<_, ListingEntity>(
            r#"INSERT INTO marketplace_listings
                (id, seller_id, title, description, price, quantity, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *"#,
        )
        .bind(listing.id)
        .bind(listing.seller_id)
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(listing.price)
        .bind(listing.quantity)
        .bind(&listing.status)
        .bind(listing.created_at)
        .bind(listing.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_listing(&self, id: Uuid) -> StoreResult<Option<ListingEntity>> {
        let row = sqlx::query_as::<_, ListingEntity>(
            "SELECT * FROM marketplace_listings WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_listings(
        &self,
        status: Option<&str>,
        limit: i64,
    ) -> StoreResult<Vec<ListingEntity>> {
        let rows = sqlx::query_as::<_, ListingEntity>(
            r#"SELECT * FROM marketplace_listings
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2"#,
        )
        .bind(status)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn cancel_listing(&self, id: Uuid, seller_id: Uuid) -> StoreResult<ListingEntity> {
        let mut tx = self.pool.begin().await?;
        let listing = sqlx::query_as::<_, ListingEntity>(
            "SELECT * FROM marketplace_listings WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("Listing", id))?;

        if listing.seller_id != seller_id {
            return Err(StoreError::forbidden("only the seller can cancel a listing"));
        }
        if !listing.is_active() {
            return Err(StoreError::conflict(format!("listing is {}", listing.status)));
        }

        let row = sqlx::query_as::<_, ListingEntity>(
            "UPDATE marketplace_listings SET status = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(ListingStatus::Cancelled.as_str())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn purchase_listing<'a>(
        &self,
        listing_id: Uuid,
        buyer_id: Uuid,
        quantity: i64,
        mutation: ListingMutation<'a>,
    ) -> StoreResult<(MarketplacePurchaseEntity, ListingEntity, PlayerEntity)> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut listing = sqlx::query_as::<_, ListingEntity>(
            "SELECT * FROM marketplace_listings WHERE id = $1 FOR UPDATE",
        )
        .bind(listing_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("Listing", listing_id))?;
        if listing.seller_id == buyer_id {
            return Err(StoreError::validation("cannot buy your own listing"));
        }
        let (mut buyer, mut seller) = lock_pair(&mut tx, buyer_id, listing.seller_id).await?;

        let purchase = MarketplacePurchaseEntity::new(&listing, buyer_id, quantity, now);
        let entries = mutation(&mut listing, &mut buyer, &mut seller)?;

        let listing = sqlx::query_as::<_, ListingEntity>(
            r#"UPDATE marketplace_listings SET quantity = $2, status = $3, updated_at = $4
            WHERE id = $1
            RETURNING *"#,
        )
        .bind(listing.id)
        .bind(listing.quantity)
        .bind(&listing.status)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        sqlx::query(
            r#"INSERT INTO marketplace_purchases
                (id, listing_id, buyer_id, seller_id, quantity, unit_price, total_price, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
        )
        .bind(purchase.id)
        .bind(purchase.listing_id)
        .bind(purchase.buyer_id)
        .bind(purchase.seller_id)
        .bind(purchase.quantity)
        .bind(purchase.unit_price)
        .bind(purchase.total_price)
        .bind(purchase.created_at)
        .execute(&mut *tx)
        .await?;
        insert_ledger(&mut tx, entries, now).await?;
        save_player(&mut tx, &seller, now).await?;
        let buyer = save_player(&mut tx, &buyer, now).await?;
        tx.commit().await?;
        Ok((purchase, listing, buyer))
    }

    async fn list_purchases(
        &self,
        buyer_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<MarketplacePurchaseEntity>> {
        let rows = sqlx::query_as::<_, MarketplacePurchaseEntity>(
            "SELECT * FROM marketplace_purchases WHERE buyer_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(buyer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl TipRepository for PgStore {
    async fn send_tip<'a>(&self, tip: NewTip, mutation: PairMutation<'a>) -> StoreResult<TipEntity> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let (mut sender, mut recipient) = lock_pair(&mut tx, tip.sender_id, tip.recipient_id).await?;
        let entries = mutation(&mut sender, &mut recipient)?;

        let row = TipEntity::new(tip, now);
        let row = sqlx::query_as::<_, TipEntity>(
            r#"INSERT INTO tips (id, sender_id, recipient_id, amount, kind, message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *"#,
        )
        .bind(row.id)
        .bind(row.sender_id)
        .bind(row.recipient_id)
        .bind(row.amount)
        .bind(&row.kind)
        .bind(&row.message)
        .bind(row.created_at)
        .fetch_one(&mut *tx)
        .await?;
        insert_ledger(&mut tx, entries, now).await?;
        save_player(&mut tx, &sender, now).await?;
        save_player(&mut tx, &recipient, now).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn list_tips(
        &self,
        player_id: Uuid,
        direction: TipDirection,
        limit: i64,
    ) -> StoreResult<Vec<TipEntity>> {
        let filter = match direction {
            TipDirection::Sent => "sender_id = $1",
            TipDirection::Received => "recipient_id = $1",
            TipDirection::All => "(sender_id = $1 OR recipient_id = $1)",
        };
        let sql = format!(
            "SELECT * FROM tips WHERE {} ORDER BY created_at DESC LIMIT $2",
            filter
        );
        let rows = sqlx::query_as::<_, TipEntity>(&sql)
            .bind(player_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl MovementTokenRepository for PgStore {
    async fn create_token(&self, new: NewMovementToken) -> StoreResult<MovementTokenEntity> {
        let token = MovementTokenEntity::new(new, Utc::now())?;
        let row = sqlx::query_as::<_, MovementTokenEntity>(
            r#"INSERT INTO movement_tokens
                (id, symbol, name, description, creator_id, total_supply, circulating_supply,
                 price, market_cap, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *"#,
        )
        .bind(token.id)
        .bind(&token.symbol)
        .bind(&token.name)
        .bind(&token.description)
        .bind(token.creator_id)
        .bind(token.total_supply)
        .bind(token.circulating_supply)
        .bind(token.price)
        .bind(token.market_cap)
        .bind(token.created_at)
        .bind(token.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_token(&self, id: Uuid) -> StoreResult<Option<MovementTokenEntity>> {
        let row = sqlx::query_as::<_, MovementTokenEntity>(
            "SELECT * FROM movement_tokens WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_tokens(&self, limit: i64) -> StoreResult<Vec<MovementTokenEntity>> {
        let rows = sqlx::query_as::<_, MovementTokenEntity>(
            "SELECT * FROM movement_tokens ORDER BY market_cap DESC, symbol LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn purchase_token<'a>(
        &self,
        token_id: Uuid,
        buyer_id: Uuid,
        mutation: TokenPurchaseMutation<'a>,
    ) -> StoreResult<(MovementTokenEntity, TokenHoldingEntity, PlayerEntity)> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut token = sqlx::query_as::<_, MovementTokenEntity>(
            "SELECT * FROM movement_tokens WHERE id = $1 FOR UPDATE",
        )
        .bind(token_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("MovementToken", token_id))?;
        let mut buyer = lock_player(&mut tx, buyer_id).await?;

        let circulating_before = token.circulating_supply;
        let entries = mutation(&mut token, &mut buyer)?;
        let bought = token.circulating_supply - circulating_before;

        let token = sqlx::query_as::<_, MovementTokenEntity>(
            r#"UPDATE movement_tokens
            SET circulating_supply = $2, price = $3, market_cap = $4, updated_at = $5
            WHERE id = $1
            RETURNING *"#,
        )
        .bind(token.id)
        .bind(token.circulating_supply)
        .bind(token.price)
        .bind(token.market_cap)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        let holding = sqlx::query_as::<_, TokenHoldingEntity>(
            r#"INSERT INTO token_holdings (player_id, token_id, amount, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (player_id, token_id) DO UPDATE SET
                amount = token_holdings.amount + EXCLUDED.amount,
                updated_at = EXCLUDED.updated_at
            RETURNING *"#,
        )
        .bind(buyer_id)
        .bind(token_id)
        .bind(bought)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        insert_ledger(&mut tx, entries, now).await?;
        let buyer = save_player(&mut tx, &buyer, now).await?;
        tx.commit().await?;
        Ok((token, holding, buyer))
    }

    async fn list_holdings(&self, player_id: Uuid) -> StoreResult<Vec<TokenHoldingEntity>> {
        let rows = sqlx::query_as::<_, TokenHoldingEntity>(
            "SELECT * FROM token_holdings WHERE player_id = $1 AND amount > 0 ORDER BY amount DESC",
        )
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
