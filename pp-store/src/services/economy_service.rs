//! Economy Service
//!
//! Power token earn/spend/transfer, transaction history, the shop and
//! admin grants.

use chrono::Utc;
use pp_core::logging::operations;
use pp_core::{
    validate_amount, CoreError, Currency, DiamondTransactionKind, GameConfig, ShopEffect,
    TransactionKind,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::entities::{
    NewShopItem, PlayerEntity, ShopItemEntity, ShopPurchaseEntity, TokenTransactionEntity,
};
use crate::error::{StoreError, StoreResult};
use crate::repos::Store;
use crate::services::badges::evaluate_badges;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balance {
    pub player_id: Uuid,
    pub power_tokens: i64,
    pub diamonds: i64,
    pub diamonds_staked: i64,
    pub influence: i64,
}

impl From<&PlayerEntity> for Balance {
    fn from(p: &PlayerEntity) -> Self {
        Self {
            player_id: p.id,
            power_tokens: p.power_tokens,
            diamonds: p.diamonds,
            diamonds_staked: p.diamonds_staked,
            influence: p.influence,
        }
    }
}

/// Balances of both sides after a committed transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub amount: i64,
    pub sender: Balance,
    pub recipient: Balance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopPurchaseOutcome {
    pub purchase: ShopPurchaseEntity,
    pub player: PlayerEntity,
}

/// Economy Service
pub struct EconomyService {
    store: Arc<dyn Store>,
    config: GameConfig,
}

impl EconomyService {
    pub fn new(store: Arc<dyn Store>, config: GameConfig) -> Self {
        Self { store, config }
    }

    pub async fn balance(&self, player_id: Uuid) -> StoreResult<Balance> {
        let player = self
            .store
            .get_player(player_id)
            .await?
            .ok_or_else(|| StoreError::not_found("Player", player_id))?;
        Ok(Balance::from(&player))
    }

    pub async fn earn(&self, player_id: Uuid, amount: i64, description: &str) -> StoreResult<Balance> {
        validate_amount(amount)?;
        let description = description_or(description, "Earned");
        let player = self
            .store
            .mutate_player(
                player_id,
                Box::new(move |p| Ok(vec![p.credit_tokens(amount, TransactionKind::Earn, description)?])),
            )
            .await?;
        info!(player_id = %player_id, operation = operations::EARN, amount, "Tokens earned");
        evaluate_badges(self.store.as_ref(), &player).await?;
        Ok(Balance::from(&player))
    }

    pub async fn spend(&self, player_id: Uuid, amount: i64, description: &str) -> StoreResult<Balance> {
        validate_amount(amount)?;
        let description = description_or(description, "Spent");
        let player = self
            .store
            .mutate_player(
                player_id,
                Box::new(move |p| Ok(vec![p.debit_tokens(amount, TransactionKind::Spend, description)?])),
            )
            .await?;
        info!(player_id = %player_id, operation = operations::SPEND, amount, "Tokens spent");
        Ok(Balance::from(&player))
    }

    /// Move tokens between players in one unit of work
    ///
    /// The sender's balance is checked inside the locked mutation, so two
    /// concurrent transfers can never overdraw it together.
    pub async fn transfer(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        amount: i64,
        description: &str,
    ) -> StoreResult<TransferOutcome> {
        validate_amount(amount)?;
        if sender_id == recipient_id {
            return Err(StoreError::validation("cannot transfer to yourself"));
        }
        let description = description_or(description, "Transfer");

        let (sender, recipient) = self
            .store
            .mutate_pair(
                sender_id,
                recipient_id,
                Box::new(move |from, to| {
                    let out = from
                        .debit_tokens(amount, TransactionKind::TransferOut, description.clone())?
                        .with_counterparty(to.id);
                    let incoming = to
                        .credit_tokens(amount, TransactionKind::TransferIn, description)?
                        .with_counterparty(from.id);
                    Ok(vec![out, incoming])
                }),
            )
            .await?;

        info!(
            player_id = %sender_id,
            operation = operations::TRANSFER,
            amount,
            recipient_id = %recipient_id,
            "Tokens transferred"
        );
        Ok(TransferOutcome {
            amount,
            sender: Balance::from(&sender),
            recipient: Balance::from(&recipient),
        })
    }

    pub async fn history(
        &self,
        player_id: Uuid,
        limit: Option<i64>,
    ) -> StoreResult<Vec<TokenTransactionEntity>> {
        self.store
            .list_token_transactions(player_id, self.config.page_size(limit))
            .await
    }

    // ==================== shop ====================

    pub async fn list_shop(&self) -> StoreResult<Vec<ShopItemEntity>> {
        self.store.list_items(true).await
    }

    pub async fn create_shop_item(&self, new: NewShopItem) -> StoreResult<ShopItemEntity> {
        Currency::parse(&new.currency)?;
        ShopEffect::parse(&new.effect)?;
        if new.name.trim().is_empty() {
            return Err(StoreError::validation("item name must not be empty"));
        }
        validate_amount(new.price)?;
        if new.stock.map_or(false, |s| s < 0) || new.effect_value < 0 {
            return Err(StoreError::validation("stock and effect value must not be negative"));
        }
        self.store.create_item(new).await
    }

    /// Buy `quantity` of an item; stock, debit and effect are applied together
    pub async fn purchase_item(
        &self,
        player_id: Uuid,
        item_id: Uuid,
        quantity: i64,
    ) -> StoreResult<ShopPurchaseOutcome> {
        validate_amount(quantity)?;
        let regen = self.config.energy_regen_per_sec;
        let now = Utc::now();

        let (purchase, player) = self
            .store
            .purchase_item(
                player_id,
                item_id,
                quantity,
                Box::new(move |item, p| {
                    if !item.is_active {
                        return Err(StoreError::not_found("ShopItem", item.id));
                    }
                    if let Some(stock) = item.stock {
                        if stock < quantity {
                            return Err(CoreError::SupplyExceeded {
                                requested: quantity,
                                remaining: stock,
                            }
                            .into());
                        }
                        item.stock = Some(stock - quantity);
                    }

                    let total = item
                        .price
                        .checked_mul(quantity)
                        .ok_or_else(|| StoreError::validation("purchase total overflows"))?;
                    let description = format!("Shop: {} x{}", item.name, quantity);
                    let mut entries = Vec::with_capacity(2);
                    match Currency::parse(&item.currency)? {
                        Currency::PowerTokens => {
                            entries.push(p.debit_tokens(total, TransactionKind::Shop, description)?);
                        }
                        Currency::Diamonds => {
                            entries.push(p.debit_diamonds(
                                total,
                                DiamondTransactionKind::Shop,
                                description,
                            )?);
                            let tier = p.tier();
                            let cashback = tier.benefits().cashback_for(total);
                            if cashback > 0 {
                                entries.push(p.credit_diamonds(
                                    cashback,
                                    DiamondTransactionKind::Cashback,
                                    format!("{} tier cashback", tier.as_str()),
                                )?);
                            }
                        }
                    }

                    let magnitude = item.effect_value.saturating_mul(quantity);
                    match ShopEffect::parse(&item.effect)? {
                        ShopEffect::EnergyRefill => {
                            p.energy = p.effective_max_energy();
                            p.energy_updated_at = now;
                        }
                        ShopEffect::EnergyCapacity => {
                            // bank regenerated energy before the cap moves
                            let energy = p.energy_at(now, regen);
                            p.energy = energy.current;
                            p.energy_updated_at = now;
                            p.max_energy = p.max_energy.saturating_add(magnitude);
                        }
                        ShopEffect::Influence => {
                            p.influence = p.influence.saturating_add(magnitude);
                        }
                        ShopEffect::Cosmetic => {}
                    }
                    p.touch(now);
                    Ok(entries)
                }),
            )
            .await?;

        info!(
            player_id = %player_id,
            operation = operations::SHOP_PURCHASE,
            amount = purchase.total_price,
            item_id = %item_id,
            "Shop item purchased"
        );
        Ok(ShopPurchaseOutcome { purchase, player })
    }

    // ==================== admin ====================

    /// Credit tokens and/or diamonds to a player
    pub async fn admin_grant(
        &self,
        player_id: Uuid,
        tokens: i64,
        diamonds: i64,
        reason: &str,
    ) -> StoreResult<Balance> {
        if tokens < 0 || diamonds < 0 || (tokens == 0 && diamonds == 0) {
            return Err(StoreError::validation("grant must credit a positive amount"));
        }
        let reason = description_or(reason, "Admin grant");
        let player = self
            .store
            .mutate_player(
                player_id,
                Box::new(move |p| {
                    let mut entries = Vec::new();
                    if tokens > 0 {
                        entries.push(p.credit_tokens(tokens, TransactionKind::AdminGrant, reason.clone())?);
                    }
                    if diamonds > 0 {
                        entries.push(p.credit_diamonds(diamonds, DiamondTransactionKind::Grant, reason)?);
                    }
                    Ok(entries)
                }),
            )
            .await?;
        info!(player_id = %player_id, tokens, diamonds, "Admin grant applied");
        Ok(Balance::from(&player))
    }
}

fn description_or(description: &str, fallback: &str) -> String {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{funded_player, grant_diamonds, memory_store};

    fn service(store: Arc<dyn Store>) -> EconomyService {
        EconomyService::new(store, GameConfig::default())
    }

    #[tokio::test]
    async fn test_earn_and_spend() {
        let store = memory_store();
        let economy = service(store.clone());
        let player = funded_player(&store, 1, 0).await;

        economy.earn(player.id, 150, "").await.unwrap();
        let balance = economy.spend(player.id, 50, "coffee").await.unwrap();
        assert_eq!(balance.power_tokens, 100);

        let history = economy.history(player.id, None).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].amount, -50);
        assert_eq!(history[0].balance_after, 100);
    }

    #[tokio::test]
    async fn test_spend_more_than_balance_fails() {
        let store = memory_store();
        let economy = service(store.clone());
        let player = funded_player(&store, 1, 10).await;

        let err = economy.spend(player.id, 11, "").await.unwrap_err();
        assert!(matches!(err, StoreError::Rule(CoreError::InsufficientFunds { .. })));
        assert_eq!(economy.balance(player.id).await.unwrap().power_tokens, 10);
    }

    #[tokio::test]
    async fn test_zero_amount_rejected() {
        let store = memory_store();
        let economy = service(store.clone());
        let player = funded_player(&store, 1, 10).await;
        assert!(matches!(
            economy.earn(player.id, 0, "").await,
            Err(StoreError::Rule(CoreError::InvalidAmount(_)))
        ));
    }

    #[tokio::test]
    async fn test_transfer_moves_tokens_and_records_counterparty() {
        let store = memory_store();
        let economy = service(store.clone());
        let alice = funded_player(&store, 1, 100).await;
        let bob = funded_player(&store, 2, 0).await;

        let outcome = economy.transfer(alice.id, bob.id, 40, "thanks").await.unwrap();
        assert_eq!(outcome.sender.power_tokens, 60);
        assert_eq!(outcome.recipient.power_tokens, 40);

        let received = economy.history(bob.id, Some(1)).await.unwrap();
        assert_eq!(received[0].kind, "transfer_in");
        assert_eq!(received[0].counterparty_id, Some(alice.id));
    }

    #[tokio::test]
    async fn test_transfer_to_self_rejected() {
        let store = memory_store();
        let economy = service(store.clone());
        let alice = funded_player(&store, 1, 100).await;
        assert!(matches!(
            economy.transfer(alice.id, alice.id, 1, "").await,
            Err(StoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_overdraft_transfers_at_most_one_succeeds() {
        let store = memory_store();
        let economy = Arc::new(service(store.clone()));
        let alice = funded_player(&store, 1, 100).await;
        let bob = funded_player(&store, 2, 0).await;
        let carol = funded_player(&store, 3, 0).await;

        let a = {
            let economy = economy.clone();
            tokio::spawn(async move { economy.transfer(alice.id, bob.id, 80, "").await })
        };
        let b = {
            let economy = economy.clone();
            tokio::spawn(async move { economy.transfer(alice.id, carol.id, 80, "").await })
        };
        let results = [a.await.unwrap(), b.await.unwrap()];

        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(succeeded, 1);
        assert_eq!(economy.balance(alice.id).await.unwrap().power_tokens, 20);
        let credited = economy.balance(bob.id).await.unwrap().power_tokens
            + economy.balance(carol.id).await.unwrap().power_tokens;
        assert_eq!(credited, 80);
    }

    #[tokio::test]
    async fn test_shop_purchase_debits_and_applies_effect() {
        let store = memory_store();
        let economy = service(store.clone());
        let player = funded_player(&store, 1, 500).await;
        let item = economy
            .create_shop_item(NewShopItem {
                name: "Megaphone".to_string(),
                description: "More influence".to_string(),
                currency: "power_tokens".to_string(),
                price: 100,
                stock: Some(3),
                effect: "influence".to_string(),
                effect_value: 5,
            })
            .await
            .unwrap();

        let outcome = economy.purchase_item(player.id, item.id, 2).await.unwrap();
        assert_eq!(outcome.purchase.total_price, 200);
        assert_eq!(outcome.player.power_tokens, 300);
        assert_eq!(outcome.player.influence, 10);

        let err = economy.purchase_item(player.id, item.id, 2).await.unwrap_err();
        assert!(matches!(err, StoreError::Rule(CoreError::SupplyExceeded { .. })));
        assert_eq!(economy.balance(player.id).await.unwrap().power_tokens, 300);
    }

    #[tokio::test]
    async fn test_shop_purchase_in_diamonds() {
        let store = memory_store();
        let economy = service(store.clone());
        let player = funded_player(&store, 1, 0).await;
        grant_diamonds(&store, player.id, 50).await;
        let item = economy
            .create_shop_item(NewShopItem {
                name: "Battery".to_string(),
                description: "Bigger energy tank".to_string(),
                currency: "diamonds".to_string(),
                price: 30,
                stock: None,
                effect: "energy_capacity".to_string(),
                effect_value: 250,
            })
            .await
            .unwrap();

        let outcome = economy.purchase_item(player.id, item.id, 1).await.unwrap();
        assert_eq!(outcome.player.diamonds, 20);
        assert_eq!(outcome.player.max_energy, 1250);
    }

    #[tokio::test]
    async fn test_admin_grant_credits_both_currencies() {
        let store = memory_store();
        let economy = service(store.clone());
        let player = funded_player(&store, 1, 0).await;

        let balance = economy.admin_grant(player.id, 10, 5, "event").await.unwrap();
        assert_eq!(balance.power_tokens, 10);
        assert_eq!(balance.diamonds, 5);
        assert!(economy.admin_grant(player.id, 0, 0, "").await.is_err());
    }

    #[tokio::test]
    async fn test_grant_overflow_keeps_ledger_consistent() {
        let store = memory_store();
        let economy = service(store.clone());
        let player = funded_player(&store, 1, 0).await;

        economy.admin_grant(player.id, i64::MAX, i64::MAX, "max").await.unwrap();
        let err = economy.admin_grant(player.id, 1, 0, "one more").await.unwrap_err();
        assert!(matches!(err, StoreError::Rule(CoreError::InvalidAmount(_))));

        let history = economy.history(player.id, None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].amount, i64::MAX);
        assert_eq!(history[0].balance_after, i64::MAX);
        assert_eq!(economy.balance(player.id).await.unwrap().power_tokens, i64::MAX);
    }
}
