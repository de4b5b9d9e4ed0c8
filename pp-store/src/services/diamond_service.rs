//! Diamond Service
//!
//! Diamonds are bought with an on-chain payment, spent in-app, and staked
//! to climb the tier ladder. Every movement writes one diamond ledger row.

use pp_core::logging::operations;
use pp_core::{
    diamonds_for_payment, validate_amount, CoreError, DiamondTier, DiamondTransactionKind,
    GameConfig, TierBenefits,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::entities::{BadgeEntity, DiamondTransactionEntity, PlayerEntity};
use crate::error::{StoreError, StoreResult};
use crate::repos::Store;
use crate::services::badges::evaluate_badges;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiamondPurchase {
    pub diamonds_credited: i64,
    pub tier_changed: Option<(DiamondTier, DiamondTier)>,
    pub new_badges: Vec<BadgeEntity>,
    pub player: PlayerEntity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeOutcome {
    pub amount: i64,
    pub diamonds: i64,
    pub diamonds_staked: i64,
    pub tier: DiamondTier,
    pub tier_changed: bool,
    pub new_badges: Vec<BadgeEntity>,
}

/// Diamond balances with the current and next tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiamondSummary {
    pub player_id: Uuid,
    pub diamonds: i64,
    pub diamonds_staked: i64,
    pub tier: DiamondTier,
    pub benefits: TierBenefits,
    pub next_tier: Option<DiamondTier>,
    pub diamonds_to_next_tier: Option<i64>,
}

impl From<&PlayerEntity> for DiamondSummary {
    fn from(p: &PlayerEntity) -> Self {
        let tier = p.tier();
        let next_tier = DiamondTier::ALL.iter().copied().find(|t| *t > tier);
        Self {
            player_id: p.id,
            diamonds: p.diamonds,
            diamonds_staked: p.diamonds_staked,
            tier,
            benefits: tier.benefits(),
            next_tier,
            diamonds_to_next_tier: next_tier.map(|t| t.threshold() - p.diamonds_staked),
        }
    }
}

/// Diamond Service
pub struct DiamondService {
    store: Arc<dyn Store>,
    config: GameConfig,
}

impl DiamondService {
    pub fn new(store: Arc<dyn Store>, config: GameConfig) -> Self {
        Self { store, config }
    }

    /// Credit diamonds for a confirmed payment of `payment_amount` TON
    pub async fn purchase(
        &self,
        player_id: Uuid,
        payment_amount: Decimal,
        tx_hash: &str,
    ) -> StoreResult<DiamondPurchase> {
        let diamonds = diamonds_for_payment(payment_amount)?;
        let tx_hash = tx_hash.to_string();

        let mut tier_changed = None;
        let player = self
            .store
            .mutate_player(
                player_id,
                Box::new(|p| {
                    let entry = p
                        .credit_diamonds(
                            diamonds,
                            DiamondTransactionKind::Purchase,
                            format!("Purchased with {} TON", payment_amount),
                        )?
                        .with_payment(tx_hash, payment_amount);
                    tier_changed = p.refresh_tier();
                    Ok(vec![entry])
                }),
            )
            .await?;

        info!(
            player_id = %player_id,
            operation = operations::DIAMOND_PURCHASE,
            amount = diamonds,
            payment = %payment_amount,
            "Diamonds purchased"
        );
        let new_badges = evaluate_badges(self.store.as_ref(), &player).await?;
        Ok(DiamondPurchase {
            diamonds_credited: diamonds,
            tier_changed,
            new_badges,
            player,
        })
    }

    /// Spend exactly `amount` diamonds
    pub async fn spend(&self, player_id: Uuid, amount: i64, reason: &str) -> StoreResult<PlayerEntity> {
        validate_amount(amount)?;
        let reason = if reason.trim().is_empty() {
            "Diamond spend".to_string()
        } else {
            reason.trim().to_string()
        };
        let player = self
            .store
            .mutate_player(
                player_id,
                Box::new(move |p| {
                    Ok(vec![p.debit_diamonds(amount, DiamondTransactionKind::Spend, reason)?])
                }),
            )
            .await?;
        info!(player_id = %player_id, operation = operations::DIAMOND_SPEND, amount, "Diamonds spent");
        Ok(player)
    }

    /// Lock diamonds into the stake; `tx_hash` is the gateway receipt
    pub async fn stake(
        &self,
        player_id: Uuid,
        amount: i64,
        tx_hash: Option<String>,
    ) -> StoreResult<StakeOutcome> {
        validate_amount(amount)?;
        let mut tier_changed = false;
        let player = self
            .store
            .mutate_player(
                player_id,
                Box::new(|p| {
                    let mut entry = p.debit_diamonds(
                        amount,
                        DiamondTransactionKind::Stake,
                        format!("Staked {} diamonds", amount),
                    )?;
                    if let Some(hash) = tx_hash {
                        entry = entry.with_tx_hash(hash);
                    }
                    p.diamonds_staked += amount;
                    tier_changed = p.refresh_tier().is_some();
                    Ok(vec![entry])
                }),
            )
            .await?;

        info!(
            player_id = %player_id,
            operation = operations::STAKE,
            amount,
            tier = %player.diamond_tier,
            "Diamonds staked"
        );
        self.stake_outcome(amount, tier_changed, player).await
    }

    /// Release staked diamonds back to the spendable balance
    pub async fn unstake(
        &self,
        player_id: Uuid,
        amount: i64,
        tx_hash: Option<String>,
    ) -> StoreResult<StakeOutcome> {
        validate_amount(amount)?;
        let mut tier_changed = false;
        let player = self
            .store
            .mutate_player(
                player_id,
                Box::new(|p| {
                    if amount > p.diamonds_staked {
                        return Err(CoreError::InsufficientFunds {
                            currency: "staked_diamonds".to_string(),
                            required: amount,
                            available: p.diamonds_staked,
                        }
                        .into());
                    }
                    p.diamonds_staked -= amount;
                    let mut entry = p.credit_diamonds(
                        amount,
                        DiamondTransactionKind::Unstake,
                        format!("Unstaked {} diamonds", amount),
                    )?;
                    if let Some(hash) = tx_hash {
                        entry = entry.with_tx_hash(hash);
                    }
                    tier_changed = p.refresh_tier().is_some();
                    Ok(vec![entry])
                }),
            )
            .await?;

        info!(
            player_id = %player_id,
            operation = operations::UNSTAKE,
            amount,
            tier = %player.diamond_tier,
            "Diamonds unstaked"
        );
        self.stake_outcome(amount, tier_changed, player).await
    }

    async fn stake_outcome(
        &self,
        amount: i64,
        tier_changed: bool,
        player: PlayerEntity,
    ) -> StoreResult<StakeOutcome> {
        let new_badges = if tier_changed {
            evaluate_badges(self.store.as_ref(), &player).await?
        } else {
            Vec::new()
        };
        Ok(StakeOutcome {
            amount,
            diamonds: player.diamonds,
            diamonds_staked: player.diamonds_staked,
            tier: player.tier(),
            tier_changed,
            new_badges,
        })
    }

    pub fn tiers(&self) -> Vec<TierBenefits> {
        DiamondTier::ALL.iter().map(DiamondTier::benefits).collect()
    }

    pub async fn summary(&self, player_id: Uuid) -> StoreResult<DiamondSummary> {
        let player = self
            .store
            .get_player(player_id)
            .await?
            .ok_or_else(|| StoreError::not_found("Player", player_id))?;
        Ok(DiamondSummary::from(&player))
    }

    pub async fn history(
        &self,
        player_id: Uuid,
        limit: Option<i64>,
    ) -> StoreResult<Vec<DiamondTransactionEntity>> {
        self.store
            .list_diamond_transactions(player_id, self.config.page_size(limit))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{funded_player, grant_diamonds, memory_store};
    use rust_decimal_macros::dec;

    fn service(store: Arc<dyn Store>) -> DiamondService {
        DiamondService::new(store, GameConfig::default())
    }

    #[tokio::test]
    async fn test_purchase_credits_hundred_per_ton_and_checks_tier() {
        let store = memory_store();
        let diamonds = service(store.clone());
        let player = funded_player(&store, 1, 0).await;

        let outcome = diamonds.purchase(player.id, dec!(2.5), "0xabc").await.unwrap();
        assert_eq!(outcome.diamonds_credited, 250);
        assert_eq!(outcome.player.diamonds, 250);
        // purchased diamonds are not staked, so the tier stays put
        assert!(outcome.tier_changed.is_none());

        let history = diamonds.history(player.id, None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, "purchase");
        assert_eq!(history[0].tx_hash.as_deref(), Some("0xabc"));
        assert_eq!(history[0].payment_amount, Some(dec!(2.5)));
    }

    #[tokio::test]
    async fn test_purchase_too_small_rejected() {
        let store = memory_store();
        let diamonds = service(store.clone());
        let player = funded_player(&store, 1, 0).await;
        assert!(matches!(
            diamonds.purchase(player.id, dec!(0.001), "0x1").await,
            Err(StoreError::Rule(CoreError::InvalidAmount(_)))
        ));
    }

    #[tokio::test]
    async fn test_spend_decreases_by_exact_amount_with_one_row() {
        let store = memory_store();
        let diamonds = service(store.clone());
        let player = funded_player(&store, 1, 0).await;
        grant_diamonds(&store, player.id, 300).await;
        let rows_before = diamonds.history(player.id, None).await.unwrap().len();

        let after = diamonds.spend(player.id, 120, "boost").await.unwrap();
        assert_eq!(after.diamonds, 180);

        let history = diamonds.history(player.id, None).await.unwrap();
        assert_eq!(history.len(), rows_before + 1);
        assert_eq!(history[0].amount, -120);
        assert_eq!(history[0].balance_after, 180);
    }

    #[tokio::test]
    async fn test_spend_more_than_balance_changes_nothing() {
        let store = memory_store();
        let diamonds = service(store.clone());
        let player = funded_player(&store, 1, 0).await;
        grant_diamonds(&store, player.id, 10).await;

        assert!(diamonds.spend(player.id, 11, "").await.is_err());
        assert_eq!(diamonds.summary(player.id).await.unwrap().diamonds, 10);
        assert_eq!(diamonds.history(player.id, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stake_and_unstake_move_tier() {
        let store = memory_store();
        let diamonds = service(store.clone());
        let player = funded_player(&store, 1, 0).await;
        grant_diamonds(&store, player.id, 1_500).await;

        let staked = diamonds
            .stake(player.id, 1_000, Some("0xstake".to_string()))
            .await
            .unwrap();
        assert_eq!(staked.tier, DiamondTier::Silver);
        assert!(staked.tier_changed);
        assert_eq!(staked.diamonds, 500);
        assert_eq!(staked.diamonds_staked, 1_000);

        let summary = diamonds.summary(player.id).await.unwrap();
        assert_eq!(summary.next_tier, Some(DiamondTier::Gold));
        assert_eq!(summary.diamonds_to_next_tier, Some(4_000));

        let unstaked = diamonds.unstake(player.id, 950, None).await.unwrap();
        assert_eq!(unstaked.tier, DiamondTier::None);
        assert_eq!(unstaked.diamonds, 1_450);

        assert!(matches!(
            diamonds.unstake(player.id, 51, None).await,
            Err(StoreError::Rule(CoreError::InsufficientFunds { .. }))
        ));
    }

    #[test]
    fn test_tiers_listed_in_order() {
        let diamonds = service(memory_store());
        let tiers = diamonds.tiers();
        assert_eq!(tiers.len(), 6);
        assert!(tiers.windows(2).all(|w| w[0].threshold < w[1].threshold));
    }
}
