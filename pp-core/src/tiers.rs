//! Diamond tiers
//!
//! A player's tier is decided by how many diamonds they have staked.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Staking-threshold rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiamondTier {
    #[default]
    None,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

/// What a tier unlocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBenefits {
    pub tier: DiamondTier,
    /// Minimum staked diamonds
    pub threshold: i64,
    /// Cashback on diamond spend, in basis points
    pub cashback_bps: i64,
    /// Tap reward multiplier, in percent (100 = 1x)
    pub tap_multiplier_pct: i64,
    /// Extra max energy
    pub bonus_energy: i64,
    /// Badge code awarded on reaching the tier
    pub badge: Option<String>,
}

impl DiamondTier {
    pub const ALL: [DiamondTier; 6] = [
        DiamondTier::None,
        DiamondTier::Bronze,
        DiamondTier::Silver,
        DiamondTier::Gold,
        DiamondTier::Platinum,
        DiamondTier::Diamond,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Platinum => "platinum",
            Self::Diamond => "diamond",
        }
    }

    pub fn parse(s: &str) -> CoreResult<Self> {
        match s {
            "none" => Ok(Self::None),
            "bronze" => Ok(Self::Bronze),
            "silver" => Ok(Self::Silver),
            "gold" => Ok(Self::Gold),
            "platinum" => Ok(Self::Platinum),
            "diamond" => Ok(Self::Diamond),
            _ => Err(CoreError::validation(format!("Unknown diamond tier: {}", s))),
        }
    }

    /// Rank used when comparing against badge thresholds
    pub fn rank(&self) -> i64 {
        *self as i64
    }

    /// Minimum staked diamonds for this tier
    pub fn threshold(&self) -> i64 {
        match self {
            Self::None => 0,
            Self::Bronze => 100,
            Self::Silver => 1_000,
            Self::Gold => 5_000,
            Self::Platinum => 20_000,
            Self::Diamond => 100_000,
        }
    }

    /// Highest tier whose threshold `staked` meets
    pub fn for_staked(staked: i64) -> Self {
        Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|tier| staked >= tier.threshold())
            .unwrap_or(Self::None)
    }

    pub fn benefits(&self) -> TierBenefits {
        let (cashback_bps, tap_multiplier_pct, bonus_energy) = match self {
            Self::None => (0, 100, 0),
            Self::Bronze => (100, 110, 100),
            Self::Silver => (200, 125, 250),
            Self::Gold => (350, 150, 500),
            Self::Platinum => (500, 175, 1_000),
            Self::Diamond => (750, 200, 2_000),
        };

        TierBenefits {
            tier: *self,
            threshold: self.threshold(),
            cashback_bps,
            tap_multiplier_pct,
            bonus_energy,
            badge: match self {
                Self::None => None,
                other => Some(format!("tier_{}", other.as_str())),
            },
        }
    }
}

impl TierBenefits {
    /// Diamonds returned on a spend of `amount`
    pub fn cashback_for(&self, amount: i64) -> i64 {
        amount.max(0) * self.cashback_bps / 10_000
    }

    /// Tokens earned for `base` after the tap multiplier
    pub fn apply_tap_multiplier(&self, base: i64) -> i64 {
        base * self.tap_multiplier_pct / 100
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(DiamondTier::for_staked(0), DiamondTier::None);
        assert_eq!(DiamondTier::for_staked(99), DiamondTier::None);
        assert_eq!(DiamondTier::for_staked(100), DiamondTier::Bronze);
        assert_eq!(DiamondTier::for_staked(4_999), DiamondTier::Silver);
        assert_eq!(DiamondTier::for_staked(5_000), DiamondTier::Gold);
        assert_eq!(DiamondTier::for_staked(1_000_000), DiamondTier::Diamond);
    }

    #[test]
    fn test_tiers_are_ordered() {
        assert!(DiamondTier::Gold > DiamondTier::Silver);
        assert_eq!(DiamondTier::Diamond.rank(), 5);
    }

    #[test]
    fn test_cashback() {
        let gold = DiamondTier::Gold.benefits();
        assert_eq!(gold.cashback_for(1_000), 35);
        assert_eq!(DiamondTier::None.benefits().cashback_for(1_000), 0);
    }

    #[test]
    fn test_tap_multiplier() {
        let silver = DiamondTier::Silver.benefits();
        assert_eq!(silver.apply_tap_multiplier(100), 125);
        assert_eq!(DiamondTier::None.benefits().apply_tap_multiplier(7), 7);
    }

    #[test]
    fn test_badge_codes() {
        assert_eq!(DiamondTier::None.benefits().badge, None);
        assert_eq!(
            DiamondTier::Platinum.benefits().badge.as_deref(),
            Some("tier_platinum")
        );
    }
}
