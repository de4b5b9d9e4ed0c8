//! Player entity and balance mutation helpers

use chrono::{DateTime, NaiveDate, Utc};
use pp_core::{
    apply_experience, regenerate, CoreError, CoreResult, DiamondTier, DiamondTransactionKind,
    EnergyState, LeaderboardStats, LevelChange, TransactionKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ledger::{LedgerEntry, NewDiamondTransaction, NewTokenTransaction};

/// Player row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlayerEntity {
    pub id: Uuid,
    pub telegram_id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub referral_code: String,
    pub referred_by: Option<Uuid>,
    pub level: i32,
    pub experience: i64,
    pub influence: i64,
    pub power_tokens: i64,
    pub diamonds: i64,
    pub diamonds_staked: i64,
    pub diamond_tier: String,
    pub wallet_address: Option<String>,
    pub energy: i64,
    pub max_energy: i64,
    pub energy_updated_at: DateTime<Utc>,
    pub total_taps: i64,
    pub last_daily_login: Option<NaiveDate>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

/// Data needed to register a player
#[derive(Debug, Clone)]
pub struct NewPlayer {
    pub id: Uuid,
    pub telegram_id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub referral_code: String,
    pub max_energy: i64,
}

/// Editable profile fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub wallet_address: Option<String>,
}

impl PlayerEntity {
    /// Fresh row for a new player
    pub fn new(new: NewPlayer, now: DateTime<Utc>) -> Self {
        Self {
            id: new.id,
            telegram_id: new.telegram_id,
            username: new.username,
            display_name: new.display_name,
            referral_code: new.referral_code,
            referred_by: None,
            level: 1,
            experience: 0,
            influence: 0,
            power_tokens: 0,
            diamonds: 0,
            diamonds_staked: 0,
            diamond_tier: DiamondTier::None.as_str().to_string(),
            wallet_address: None,
            energy: new.max_energy,
            max_energy: new.max_energy,
            energy_updated_at: now,
            total_taps: 0,
            last_daily_login: None,
            is_admin: false,
            created_at: now,
            updated_at: now,
            last_active_at: now,
        }
    }

    pub fn tier(&self) -> DiamondTier {
        DiamondTier::parse(&self.diamond_tier).unwrap_or_default()
    }

    pub fn apply_profile(&mut self, update: &ProfileUpdate) {
        if let Some(username) = &update.username {
            self.username = username.clone();
        }
        if let Some(display_name) = &update.display_name {
            self.display_name = Some(display_name.clone());
        }
        if let Some(wallet) = &update.wallet_address {
            self.wallet_address = Some(wallet.clone());
        }
    }

    /// Mark activity and bump `updated_at`
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.last_active_at = now;
    }

    /// Add power tokens and return the ledger row
    pub fn credit_tokens(
        &mut self,
        amount: i64,
        kind: TransactionKind,
        description: impl Into<String>,
    ) -> CoreResult<LedgerEntry> {
        self.power_tokens = checked_credit(self.power_tokens, amount)?;
        Ok(LedgerEntry::Token(NewTokenTransaction {
            player_id: self.id,
            kind,
            amount,
            balance_after: self.power_tokens,
            counterparty_id: None,
            description: description.into(),
        }))
    }

    /// Remove power tokens, refusing to go negative
    pub fn debit_tokens(
        &mut self,
        amount: i64,
        kind: TransactionKind,
        description: impl Into<String>,
    ) -> CoreResult<LedgerEntry> {
        if amount > self.power_tokens {
            return Err(CoreError::insufficient_tokens(amount, self.power_tokens));
        }
        self.power_tokens -= amount;
        Ok(LedgerEntry::Token(NewTokenTransaction {
            player_id: self.id,
            kind,
            amount: -amount,
            balance_after: self.power_tokens,
            counterparty_id: None,
            description: description.into(),
        }))
    }

    pub fn credit_diamonds(
        &mut self,
        amount: i64,
        kind: DiamondTransactionKind,
        description: impl Into<String>,
    ) -> CoreResult<LedgerEntry> {
        self.diamonds = checked_credit(self.diamonds, amount)?;
        Ok(LedgerEntry::Diamond(NewDiamondTransaction {
            player_id: self.id,
            kind,
            amount,
            balance_after: self.diamonds,
            tx_hash: None,
            payment_amount: None,
            description: description.into(),
        }))
    }

    pub fn debit_diamonds(
        &mut self,
        amount: i64,
        kind: DiamondTransactionKind,
        description: impl Into<String>,
    ) -> CoreResult<LedgerEntry> {
        if amount > self.diamonds {
            return Err(CoreError::insufficient_diamonds(amount, self.diamonds));
        }
        self.diamonds -= amount;
        Ok(LedgerEntry::Diamond(NewDiamondTransaction {
            player_id: self.id,
            kind,
            amount: -amount,
            balance_after: self.diamonds,
            tx_hash: None,
            payment_amount: None,
            description: description.into(),
        }))
    }

    /// Grant experience; any level-up bonus is credited and returned as a ledger row
    pub fn grant_experience(&mut self, gained: i64) -> CoreResult<(LevelChange, Option<LedgerEntry>)> {
        let change = apply_experience(self.experience, gained);
        self.experience = change.experience;
        self.level = change.new_level;

        let bonus = if change.leveled_up() {
            Some(self.credit_tokens(
                change.bonus_tokens,
                TransactionKind::LevelBonus,
                format!("Reached level {}", change.new_level),
            )?)
        } else {
            None
        };
        Ok((change, bonus))
    }

    /// Credit a reward of tokens and experience, returning every ledger row written
    pub fn reward(
        &mut self,
        tokens: i64,
        experience: i64,
        kind: TransactionKind,
        description: impl Into<String>,
    ) -> CoreResult<Vec<LedgerEntry>> {
        let mut entries = Vec::with_capacity(2);
        if tokens > 0 {
            entries.push(self.credit_tokens(tokens, kind, description)?);
        }
        if experience > 0 {
            let (_, bonus) = self.grant_experience(experience)?;
            entries.extend(bonus);
        }
        Ok(entries)
    }

    /// Recompute the tier from staked diamonds; returns (old, new) when it changed
    pub fn refresh_tier(&mut self) -> Option<(DiamondTier, DiamondTier)> {
        let old = self.tier();
        let new = DiamondTier::for_staked(self.diamonds_staked);
        if old == new {
            return None;
        }
        self.diamond_tier = new.as_str().to_string();
        Some((old, new))
    }

    /// Energy available at `now`, with the tier bonus applied to the cap
    pub fn energy_at(&self, now: DateTime<Utc>, regen_per_sec: i64) -> EnergyState {
        let max = self.effective_max_energy();
        regenerate(self.energy, max, self.energy_updated_at, now, regen_per_sec)
    }

    pub fn effective_max_energy(&self) -> i64 {
        self.max_energy + self.tier().benefits().bonus_energy
    }
}

impl LeaderboardStats for PlayerEntity {
    fn power_tokens(&self) -> i64 {
        self.power_tokens
    }
    fn level(&self) -> i32 {
        self.level
    }
    fn experience(&self) -> i64 {
        self.experience
    }
    fn influence(&self) -> i64 {
        self.influence
    }
    fn diamonds(&self) -> i64 {
        self.diamonds
    }
}

fn checked_credit(balance: i64, amount: i64) -> CoreResult<i64> {
    balance.checked_add(amount).ok_or_else(|| {
        CoreError::InvalidAmount(format!("crediting {} overflows balance {}", amount, balance))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> PlayerEntity {
        PlayerEntity::new(
            NewPlayer {
                id: Uuid::new_v4(),
                telegram_id: 42,
                username: "alice".to_string(),
                display_name: None,
                referral_code: "ABCDEF12".to_string(),
                max_energy: 1000,
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_new_player_defaults() {
        let p = player();
        assert_eq!(p.level, 1);
        assert_eq!(p.energy, 1000);
        assert_eq!(p.tier(), DiamondTier::None);
    }

    #[test]
    fn test_debit_refuses_overdraft() {
        let mut p = player();
        p.credit_tokens(10, TransactionKind::Earn, "seed").unwrap();
        let err = p.debit_tokens(11, TransactionKind::Spend, "too much").unwrap_err();
        assert_eq!(err, CoreError::insufficient_tokens(11, 10));
        assert_eq!(p.power_tokens, 10);
    }

    #[test]
    fn test_debit_records_negative_amount() {
        let mut p = player();
        p.credit_tokens(10, TransactionKind::Earn, "seed").unwrap();
        let entry = p.debit_tokens(4, TransactionKind::Spend, "coffee").unwrap();
        match entry {
            LedgerEntry::Token(tx) => {
                assert_eq!(tx.amount, -4);
                assert_eq!(tx.balance_after, 6);
            }
            LedgerEntry::Diamond(_) => panic!("expected token entry"),
        }
    }

    #[test]
    fn test_grant_experience_pays_bonus() {
        let mut p = player();
        p.experience = 399;
        let (change, bonus) = p.grant_experience(1).unwrap();
        assert_eq!(change.new_level, 3);
        assert_eq!(p.level, 3);
        assert_eq!(p.power_tokens, 30);
        assert!(bonus.is_some());
    }

    #[test]
    fn test_reward_collects_entries() {
        let mut p = player();
        let entries = p.reward(50, 100, TransactionKind::Mission, "mission").unwrap();
        // token reward plus level 2 bonus
        assert_eq!(entries.len(), 2);
        assert_eq!(p.power_tokens, 70);
        assert_eq!(p.level, 2);
    }

    #[test]
    fn test_credit_overflow_leaves_balance_untouched() {
        let mut p = player();
        p.power_tokens = i64::MAX - 5;
        let err = p.credit_tokens(10, TransactionKind::Earn, "too much").unwrap_err();
        assert!(matches!(err, CoreError::InvalidAmount(_)));
        assert_eq!(p.power_tokens, i64::MAX - 5);

        p.diamonds = i64::MAX;
        assert!(p.credit_diamonds(1, DiamondTransactionKind::Grant, "one more").is_err());
        assert_eq!(p.diamonds, i64::MAX);

        match p.credit_tokens(5, TransactionKind::Earn, "exact").unwrap() {
            LedgerEntry::Token(tx) => {
                assert_eq!(tx.amount, 5);
                assert_eq!(tx.balance_after, i64::MAX);
            }
            LedgerEntry::Diamond(_) => panic!("expected token entry"),
        }
    }

    #[test]
    fn test_refresh_tier() {
        let mut p = player();
        p.diamonds_staked = 1_000;
        assert_eq!(
            p.refresh_tier(),
            Some((DiamondTier::None, DiamondTier::Silver))
        );
        assert_eq!(p.refresh_tier(), None);
        assert_eq!(p.effective_max_energy(), 1_250);
    }
}
