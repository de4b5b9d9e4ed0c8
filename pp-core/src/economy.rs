//! Token economy primitives

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Diamonds credited per unit of payment currency
pub const DIAMONDS_PER_TON: i64 = 100;

/// Length of generated referral codes
pub const REFERRAL_CODE_LEN: usize = 8;

/// Reason a power token ledger row was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Earn,
    Spend,
    TransferIn,
    TransferOut,
    Tap,
    Mission,
    LevelBonus,
    Shop,
    MarketplaceSale,
    MarketplacePurchase,
    TipSent,
    TipReceived,
    Referral,
    MovementToken,
    Habit,
    Course,
    Competition,
    AdminGrant,
    DailyLogin,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Earn => "earn",
            Self::Spend => "spend",
            Self::TransferIn => "transfer_in",
            Self::TransferOut => "transfer_out",
            Self::Tap => "tap",
            Self::Mission => "mission",
            Self::LevelBonus => "level_bonus",
            Self::Shop => "shop",
            Self::MarketplaceSale => "marketplace_sale",
            Self::MarketplacePurchase => "marketplace_purchase",
            Self::TipSent => "tip_sent",
            Self::TipReceived => "tip_received",
            Self::Referral => "referral",
            Self::MovementToken => "movement_token",
            Self::Habit => "habit",
            Self::Course => "course",
            Self::Competition => "competition",
            Self::AdminGrant => "admin_grant",
            Self::DailyLogin => "daily_login",
        }
    }

    pub fn parse(s: &str) -> CoreResult<Self> {
        let kind = match s {
            "earn" => Self::Earn,
            "spend" => Self::Spend,
            "transfer_in" => Self::TransferIn,
            "transfer_out" => Self::TransferOut,
            "tap" => Self::Tap,
            "mission" => Self::Mission,
            "level_bonus" => Self::LevelBonus,
            "shop" => Self::Shop,
            "marketplace_sale" => Self::MarketplaceSale,
            "marketplace_purchase" => Self::MarketplacePurchase,
            "tip_sent" => Self::TipSent,
            "tip_received" => Self::TipReceived,
            "referral" => Self::Referral,
            "movement_token" => Self::MovementToken,
            "habit" => Self::Habit,
            "course" => Self::Course,
            "competition" => Self::Competition,
            "admin_grant" => Self::AdminGrant,
            "daily_login" => Self::DailyLogin,
            other => {
                return Err(CoreError::validation(format!(
                    "Unknown transaction kind: {}",
                    other
                )))
            }
        };
        Ok(kind)
    }

    /// Whether rows of this kind add to the balance
    pub fn is_credit(&self) -> bool {
        !matches!(
            self,
            Self::Spend
                | Self::TransferOut
                | Self::Shop
                | Self::MarketplacePurchase
                | Self::TipSent
                | Self::MovementToken
        )
    }
}

/// Reason a diamond ledger row was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiamondTransactionKind {
    Purchase,
    Spend,
    Stake,
    Unstake,
    Cashback,
    Shop,
    Grant,
}

impl DiamondTransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Spend => "spend",
            Self::Stake => "stake",
            Self::Unstake => "unstake",
            Self::Cashback => "cashback",
            Self::Shop => "shop",
            Self::Grant => "grant",
        }
    }

    pub fn parse(s: &str) -> CoreResult<Self> {
        match s {
            "purchase" => Ok(Self::Purchase),
            "spend" => Ok(Self::Spend),
            "stake" => Ok(Self::Stake),
            "unstake" => Ok(Self::Unstake),
            "cashback" => Ok(Self::Cashback),
            "shop" => Ok(Self::Shop),
            "grant" => Ok(Self::Grant),
            other => Err(CoreError::validation(format!(
                "Unknown diamond transaction kind: {}",
                other
            ))),
        }
    }
}

/// Reject zero and negative amounts
pub fn validate_amount(amount: i64) -> CoreResult<i64> {
    if amount <= 0 {
        return Err(CoreError::InvalidAmount(format!(
            "amount must be positive, got {}",
            amount
        )));
    }
    Ok(amount)
}

/// Diamonds credited for a payment of `amount` (whole diamonds, rounded down)
pub fn diamonds_for_payment(amount: Decimal) -> CoreResult<i64> {
    if amount <= Decimal::ZERO {
        return Err(CoreError::InvalidAmount(format!(
            "payment amount must be positive, got {}",
            amount
        )));
    }

    let diamonds = amount
        .checked_mul(Decimal::from(DIAMONDS_PER_TON))
        .ok_or_else(|| CoreError::InvalidAmount("payment amount overflows".to_string()))?
        .floor()
        .to_i64()
        .ok_or_else(|| CoreError::InvalidAmount("payment amount overflows".to_string()))?;

    if diamonds == 0 {
        return Err(CoreError::InvalidAmount(
            "payment too small to earn a diamond".to_string(),
        ));
    }
    Ok(diamonds)
}

/// Deterministic referral code for a player id
pub fn referral_code_for(player_id: &Uuid) -> String {
    let digest = Sha256::digest(player_id.as_bytes());
    hex::encode_upper(digest)[..REFERRAL_CODE_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_amount() {
        assert_eq!(validate_amount(5).unwrap(), 5);
        assert!(validate_amount(0).is_err());
        assert!(validate_amount(-3).is_err());
    }

    #[test]
    fn test_diamonds_for_payment() {
        assert_eq!(diamonds_for_payment(dec!(1)).unwrap(), 100);
        assert_eq!(diamonds_for_payment(dec!(2.5)).unwrap(), 250);
        assert_eq!(diamonds_for_payment(dec!(0.019)).unwrap(), 1);
        assert!(diamonds_for_payment(dec!(0.001)).is_err());
        assert!(diamonds_for_payment(dec!(-1)).is_err());
    }

    #[test]
    fn test_diamonds_for_huge_payment_is_rejected() {
        let err = diamonds_for_payment(dec!(1000000000000000000000000000)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidAmount(_)));

        // fits in Decimal but not in i64
        assert!(diamonds_for_payment(dec!(100000000000000000000)).is_err());
    }

    #[test]
    fn test_transaction_kind_names() {
        for kind in [
            TransactionKind::Earn,
            TransactionKind::TransferOut,
            TransactionKind::LevelBonus,
            TransactionKind::DailyLogin,
        ] {
            assert_eq!(TransactionKind::parse(kind.as_str()).unwrap(), kind);
        }
        assert!(TransactionKind::parse("bribe").is_err());
    }

    #[test]
    fn test_credit_direction() {
        assert!(TransactionKind::Earn.is_credit());
        assert!(TransactionKind::TipReceived.is_credit());
        assert!(!TransactionKind::TipSent.is_credit());
        assert!(!TransactionKind::Spend.is_credit());
    }

    #[test]
    fn test_referral_code_is_stable() {
        let id = Uuid::new_v4();
        let code = referral_code_for(&id);
        assert_eq!(code.len(), REFERRAL_CODE_LEN);
        assert_eq!(code, referral_code_for(&id));
        assert!(code.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }
}
