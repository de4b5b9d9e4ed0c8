//! Payment Bridge
//!
//! The diamond contract seen from the API. [`PaymentGateway`] mirrors the
//! contract ABI (`processPayment`, `stakeTokens`, `unstakeTokens`,
//! `getUserStats`, `getDiamondTierBenefits`). Any failure on the chain side
//! surfaces as a [`BridgeError`]; callers do not see whether it was the
//! network or a revert.
//!
//! [`SimulatedGateway`] keeps per-wallet state in memory and hands out
//! synthetic transaction hashes. It is the only gateway shipped.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pp_core::{diamonds_for_payment, DiamondTier, TierBenefits};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Bridge failure
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Contract could not be reached
    #[error("Bridge unavailable: {0}")]
    Unavailable(String),

    /// Contract call failed
    #[error("Bridge call failed: {0}")]
    CallFailed(String),
}

pub type BridgeResult<T> = Result<T, BridgeError>;

/// Receipt of a confirmed contract call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub wallet: String,
    pub confirmed_at: DateTime<Utc>,
}

/// Receipt of `processPayment`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    #[serde(flatten)]
    pub tx: TxReceipt,
    pub amount: Decimal,
    /// Diamonds the contract minted for the payment
    pub diamonds: i64,
}

/// `getUserStats` result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainUserStats {
    pub wallet: String,
    pub total_paid: Decimal,
    pub diamonds_minted: i64,
    pub staked: i64,
    pub tier: DiamondTier,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Contract address or label
    fn contract(&self) -> &str;

    async fn process_payment(&self, wallet: &str, amount: Decimal) -> BridgeResult<PaymentReceipt>;

    async fn stake_tokens(&self, wallet: &str, amount: i64) -> BridgeResult<TxReceipt>;

    async fn unstake_tokens(&self, wallet: &str, amount: i64) -> BridgeResult<TxReceipt>;

    async fn get_user_stats(&self, wallet: &str) -> BridgeResult<ChainUserStats>;

    async fn get_diamond_tier_benefits(&self, tier: DiamondTier) -> BridgeResult<TierBenefits>;
}

/// In-process stand-in for the diamond contract
pub struct SimulatedGateway {
    contract: String,
    wallets: RwLock<HashMap<String, ChainUserStats>>,
    nonce: AtomicU64,
    fail_mode: AtomicBool,
}

impl SimulatedGateway {
    pub fn new(contract: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
            wallets: RwLock::new(HashMap::new()),
            nonce: AtomicU64::new(1),
            fail_mode: AtomicBool::new(false),
        }
    }

    /// Make every call fail with [`BridgeError::Unavailable`]
    pub fn set_fail_mode(&self, fail: bool) {
        self.fail_mode.store(fail, Ordering::SeqCst);
    }

    fn check_available(&self) -> BridgeResult<()> {
        if self.fail_mode.load(Ordering::SeqCst) {
            return Err(BridgeError::Unavailable(format!("contract {} not responding", self.contract)));
        }
        Ok(())
    }

    fn receipt(&self, wallet: &str) -> TxReceipt {
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        TxReceipt {
            tx_hash: format!("0x{:016x}{}", nonce, Uuid::new_v4().simple()),
            wallet: wallet.to_string(),
            confirmed_at: Utc::now(),
        }
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new("simulated")
    }
}

fn require_wallet(wallet: &str) -> BridgeResult<()> {
    if wallet.trim().is_empty() {
        return Err(BridgeError::CallFailed("wallet address is empty".to_string()));
    }
    Ok(())
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    fn contract(&self) -> &str {
        &self.contract
    }

    async fn process_payment(&self, wallet: &str, amount: Decimal) -> BridgeResult<PaymentReceipt> {
        self.check_available()?;
        require_wallet(wallet)?;
        let diamonds = diamonds_for_payment(amount).map_err(|e| BridgeError::CallFailed(e.to_string()))?;

        let mut wallets = self.wallets.write().await;
        let stats = wallets.entry(wallet.to_string()).or_insert_with(|| ChainUserStats {
            wallet: wallet.to_string(),
            ..Default::default()
        });
        stats.total_paid += amount;
        stats.diamonds_minted += diamonds;

        let tx = self.receipt(wallet);
        info!(wallet, tx_hash = %tx.tx_hash, %amount, diamonds, "Simulated payment processed");
        Ok(PaymentReceipt { tx, amount, diamonds })
    }

    async fn stake_tokens(&self, wallet: &str, amount: i64) -> BridgeResult<TxReceipt> {
        self.check_available()?;
        require_wallet(wallet)?;
        if amount <= 0 {
            return Err(BridgeError::CallFailed("stake amount must be positive".to_string()));
        }

        let mut wallets = self.wallets.write().await;
        let stats = wallets.entry(wallet.to_string()).or_insert_with(|| ChainUserStats {
            wallet: wallet.to_string(),
            ..Default::default()
        });
        stats.staked += amount;
        stats.tier = DiamondTier::for_staked(stats.staked);

        let tx = self.receipt(wallet);
        debug!(wallet, tx_hash = %tx.tx_hash, amount, "Simulated stake");
        Ok(tx)
    }

    async fn unstake_tokens(&self, wallet: &str, amount: i64) -> BridgeResult<TxReceipt> {
        self.check_available()?;
        require_wallet(wallet)?;
        if amount <= 0 {
            return Err(BridgeError::CallFailed("unstake amount must be positive".to_string()));
        }

        // The ledger is authoritative for staked balances; chain state may
        // lag it after a restart, so it only saturates here.
        let mut wallets = self.wallets.write().await;
        if let Some(stats) = wallets.get_mut(wallet) {
            stats.staked = (stats.staked - amount).max(0);
            stats.tier = DiamondTier::for_staked(stats.staked);
        }

        let tx = self.receipt(wallet);
        debug!(wallet, tx_hash = %tx.tx_hash, amount, "Simulated unstake");
        Ok(tx)
    }

    async fn get_user_stats(&self, wallet: &str) -> BridgeResult<ChainUserStats> {
        self.check_available()?;
        let wallets = self.wallets.read().await;
        Ok(wallets.get(wallet).cloned().unwrap_or_else(|| ChainUserStats {
            wallet: wallet.to_string(),
            ..Default::default()
        }))
    }

    async fn get_diamond_tier_benefits(&self, tier: DiamondTier) -> BridgeResult<TierBenefits> {
        self.check_available()?;
        Ok(tier.benefits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_payment_mints_diamonds() {
        let gateway = SimulatedGateway::default();
        let receipt = gateway.process_payment("EQwallet", dec!(1.5)).await.unwrap();
        assert_eq!(receipt.diamonds, 150);
        assert!(receipt.tx.tx_hash.starts_with("0x"));

        let stats = gateway.get_user_stats("EQwallet").await.unwrap();
        assert_eq!(stats.total_paid, dec!(1.5));
        assert_eq!(stats.diamonds_minted, 150);
    }

    #[tokio::test]
    async fn test_stake_and_unstake_track_tier() {
        let gateway = SimulatedGateway::default();
        gateway.stake_tokens("EQwallet", 1_000).await.unwrap();
        assert_eq!(gateway.get_user_stats("EQwallet").await.unwrap().tier, DiamondTier::Silver);

        gateway.unstake_tokens("EQwallet", 950).await.unwrap();
        let stats = gateway.get_user_stats("EQwallet").await.unwrap();
        assert_eq!(stats.staked, 50);
        assert_eq!(stats.tier, DiamondTier::None);
    }

    #[tokio::test]
    async fn test_tx_hashes_are_unique() {
        let gateway = SimulatedGateway::default();
        let a = gateway.stake_tokens("EQwallet", 1).await.unwrap();
        let b = gateway.stake_tokens("EQwallet", 1).await.unwrap();
        assert_ne!(a.tx_hash, b.tx_hash);
    }

    #[tokio::test]
    async fn test_fail_mode() {
        let gateway = SimulatedGateway::default();
        gateway.set_fail_mode(true);
        assert!(matches!(
            gateway.stake_tokens("EQwallet", 10).await,
            Err(BridgeError::Unavailable(_))
        ));
        gateway.set_fail_mode(false);
        assert!(gateway.get_diamond_tier_benefits(DiamondTier::Gold).await.is_ok());
    }

    #[tokio::test]
    async fn test_rejects_empty_wallet() {
        let gateway = SimulatedGateway::default();
        assert!(matches!(
            gateway.process_payment(" ", dec!(1)).await,
            Err(BridgeError::CallFailed(_))
        ));
    }
}
