//! Movement Token Service
//!
//! Community tokens bought with power tokens. Each purchase is charged at
//! the pre-impact price and then moves the price up by the impact formula.

use chrono::Utc;
use pp_core::logging::operations;
use pp_core::{purchase_cost, validate_amount, GameConfig, PriceQuote, TransactionKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::entities::{MovementTokenEntity, NewMovementToken, PlayerEntity, TokenHoldingEntity};
use crate::error::{StoreError, StoreResult};
use crate::repos::Store;

pub const MIN_SYMBOL_LEN: usize = 2;
pub const MAX_SYMBOL_LEN: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPurchase {
    pub quote: PriceQuote,
    pub token: MovementTokenEntity,
    pub holding: TokenHoldingEntity,
    pub buyer: PlayerEntity,
}

pub struct MovementTokenService {
    store: Arc<dyn Store>,
    config: GameConfig,
}

impl MovementTokenService {
    pub fn new(store: Arc<dyn Store>, config: GameConfig) -> Self {
        Self { store, config }
    }

    pub async fn create(&self, new: NewMovementToken) -> StoreResult<MovementTokenEntity> {
        let symbol = new.symbol.trim().to_uppercase();
        if !(MIN_SYMBOL_LEN..=MAX_SYMBOL_LEN).contains(&symbol.len())
            || !symbol.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(StoreError::validation(format!(
                "symbol must be {} to {} letters or digits",
                MIN_SYMBOL_LEN, MAX_SYMBOL_LEN
            )));
        }
        if new.name.trim().is_empty() {
            return Err(StoreError::validation("token name must not be empty"));
        }
        validate_amount(new.total_supply)?;
        if new.initial_price <= Decimal::ZERO {
            return Err(StoreError::validation("initial price must be positive"));
        }
        // the whole supply must be purchasable at the opening price
        purchase_cost(new.initial_price, new.total_supply)?;

        let token = self
            .store
            .create_token(NewMovementToken {
                symbol,
                name: new.name.trim().to_string(),
                ..new
            })
            .await?;
        info!(player_id = %token.creator_id, symbol = %token.symbol, "Movement token created");
        Ok(token)
    }

    pub async fn get(&self, id: Uuid) -> StoreResult<MovementTokenEntity> {
        self.store
            .get_token(id)
            .await?
            .ok_or_else(|| StoreError::not_found("MovementToken", id))
    }

    pub async fn list(&self, limit: Option<i64>) -> StoreResult<Vec<MovementTokenEntity>> {
        self.store.list_tokens(self.config.page_size(limit)).await
    }

    /// Quote without buying
    pub async fn quote(&self, id: Uuid, amount: i64) -> StoreResult<PriceQuote> {
        validate_amount(amount)?;
        let token = self.get(id).await?;
        Ok(PriceQuote::for_purchase(
            token.price,
            amount,
            token.total_supply,
            token.circulating_supply,
        )?)
    }

    pub async fn purchase(&self, id: Uuid, buyer_id: Uuid, amount: i64) -> StoreResult<TokenPurchase> {
        validate_amount(amount)?;
        let now = Utc::now();
        let mut quoted: Option<PriceQuote> = None;

        let (token, holding, buyer) = self
            .store
            .purchase_token(
                id,
                buyer_id,
                Box::new(|token, p| {
                    let quote = PriceQuote::for_purchase(
                        token.price,
                        amount,
                        token.total_supply,
                        token.circulating_supply,
                    )?;
                    let entry = p.debit_tokens(
                        quote.cost_tokens,
                        TransactionKind::MovementToken,
                        format!("Bought {} {}", amount, token.symbol),
                    )?;
                    token.circulating_supply += amount;
                    token.price = quote.new_price;
                    token.market_cap = quote.new_market_cap;
                    p.touch(now);
                    quoted = Some(quote);
                    Ok(vec![entry])
                }),
            )
            .await?;

        let quote = quoted.ok_or_else(|| StoreError::Database("token purchase did not run".to_string()))?;
        info!(
            player_id = %buyer_id,
            operation = operations::MOVEMENT_TOKEN_PURCHASE,
            amount = quote.cost_tokens,
            symbol = %token.symbol,
            new_price = %token.price,
            "Movement token purchased"
        );
        Ok(TokenPurchase {
            quote,
            token,
            holding,
            buyer,
        })
    }

    pub async fn holdings(&self, player_id: Uuid) -> StoreResult<Vec<TokenHoldingEntity>> {
        self.store.list_holdings(player_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{funded_player, memory_store};
    use pp_core::CoreError;
    use rust_decimal_macros::dec;

    fn new_token(creator_id: Uuid, symbol: &str) -> NewMovementToken {
        NewMovementToken {
            symbol: symbol.to_string(),
            name: "Clean Rivers".to_string(),
            description: "River cleanup movement".to_string(),
            creator_id,
            total_supply: 1000,
            initial_price: dec!(2.00),
        }
    }

    #[tokio::test]
    async fn test_purchase_charges_pre_impact_price_and_moves_price() {
        let store = memory_store();
        let tokens = MovementTokenService::new(store.clone(), GameConfig::default());
        let creator = funded_player(&store, 1, 0).await;
        let buyer = funded_player(&store, 2, 1000).await;
        let token = tokens.create(new_token(creator.id, "river")).await.unwrap();
        assert_eq!(token.symbol, "RIVER");
        assert_eq!(token.circulating_supply, 0);

        let bought = tokens.purchase(token.id, buyer.id, 100).await.unwrap();
        assert_eq!(bought.quote.cost_tokens, 200);
        assert_eq!(bought.token.price, dec!(2.02));
        assert_eq!(bought.token.market_cap, dec!(2020));
        assert_eq!(bought.holding.amount, 100);
        assert_eq!(bought.buyer.power_tokens, 800);

        let again = tokens.purchase(token.id, buyer.id, 10).await.unwrap();
        // 10 * 2.02 = 20.2, rounded up
        assert_eq!(again.quote.cost_tokens, 21);
        assert_eq!(again.holding.amount, 110);
        assert_eq!(tokens.holdings(buyer.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_purchase_beyond_supply_rejected() {
        let store = memory_store();
        let tokens = MovementTokenService::new(store.clone(), GameConfig::default());
        let buyer = funded_player(&store, 1, 100_000).await;
        let token = tokens.create(new_token(buyer.id, "CAP")).await.unwrap();

        assert!(matches!(
            tokens.purchase(token.id, buyer.id, 1001).await,
            Err(StoreError::Rule(CoreError::SupplyExceeded { .. }))
        ));
        assert_eq!(tokens.get(token.id).await.unwrap().circulating_supply, 0);
    }

    #[tokio::test]
    async fn test_duplicate_symbol_conflicts() {
        let store = memory_store();
        let tokens = MovementTokenService::new(store.clone(), GameConfig::default());
        let creator = Uuid::new_v4();
        tokens.create(new_token(creator, "VOTE")).await.unwrap();
        assert!(matches!(
            tokens.create(new_token(creator, "vote")).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(matches!(
            tokens.create(new_token(creator, "V")).await,
            Err(StoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_oversized_token_rejected_without_panicking() {
        let store = memory_store();
        let tokens = MovementTokenService::new(store.clone(), GameConfig::default());
        let creator = Uuid::new_v4();
        let oversized = NewMovementToken {
            total_supply: i64::MAX,
            initial_price: dec!(100000000000),
            ..new_token(creator, "HUGE")
        };

        let handle = tokio::spawn({
            let tokens = MovementTokenService::new(store.clone(), GameConfig::default());
            async move { tokens.create(oversized).await }
        });
        let result = handle.await.expect("create must not panic");
        assert!(matches!(result, Err(StoreError::Rule(CoreError::InvalidAmount(_)))));

        // store lock is still usable
        assert!(tokens.list(None).await.unwrap().is_empty());
        tokens.create(new_token(creator, "OK")).await.unwrap();
    }
}
