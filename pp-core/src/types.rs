//! Shared domain enums
//!
//! These are persisted as TEXT columns, so each enum carries an `as_str` /
//! `parse` pair that the store layer uses when reading rows back.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Metric a leaderboard is ranked by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardMetric {
    #[default]
    PowerTokens,
    Level,
    Experience,
    Influence,
    Diamonds,
}

impl LeaderboardMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PowerTokens => "power_tokens",
            Self::Level => "level",
            Self::Experience => "experience",
            Self::Influence => "influence",
            Self::Diamonds => "diamonds",
        }
    }

    pub fn parse(s: &str) -> CoreResult<Self> {
        match s {
            "power_tokens" | "tokens" => Ok(Self::PowerTokens),
            "level" => Ok(Self::Level),
            "experience" => Ok(Self::Experience),
            "influence" => Ok(Self::Influence),
            "diamonds" => Ok(Self::Diamonds),
            _ => Err(CoreError::validation(format!("Unknown leaderboard metric: {}", s))),
        }
    }

    /// The value a player is ranked by
    pub fn value_of<S: LeaderboardStats + ?Sized>(&self, stats: &S) -> i64 {
        match self {
            Self::PowerTokens => stats.power_tokens(),
            Self::Level => i64::from(stats.level()),
            Self::Experience => stats.experience(),
            Self::Influence => stats.influence(),
            Self::Diamonds => stats.diamonds(),
        }
    }
}

/// Anything that can be placed on a leaderboard
pub trait LeaderboardStats {
    fn power_tokens(&self) -> i64;
    fn level(&self) -> i32;
    fn experience(&self) -> i64;
    fn influence(&self) -> i64;
    fn diamonds(&self) -> i64;
}

/// How often a mission can be claimed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionCadence {
    Once,
    Daily,
    Weekly,
}

impl MissionCadence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Once => "once",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    pub fn parse(s: &str) -> CoreResult<Self> {
        match s {
            "once" => Ok(Self::Once),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            _ => Err(CoreError::validation(format!("Unknown mission cadence: {}", s))),
        }
    }

    /// Key identifying the claim period a date falls into
    pub fn period_key(&self, date: chrono::NaiveDate) -> String {
        use chrono::Datelike;
        match self {
            Self::Once => "once".to_string(),
            Self::Daily => date.format("%Y-%m-%d").to_string(),
            Self::Weekly => {
                let week = date.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
        }
    }
}

/// Currency a shop item is priced in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    PowerTokens,
    Diamonds,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PowerTokens => "power_tokens",
            Self::Diamonds => "diamonds",
        }
    }

    pub fn parse(s: &str) -> CoreResult<Self> {
        match s {
            "power_tokens" => Ok(Self::PowerTokens),
            "diamonds" => Ok(Self::Diamonds),
            _ => Err(CoreError::validation(format!("Unknown currency: {}", s))),
        }
    }
}

/// What a shop item does when bought
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopEffect {
    /// Restores energy to max
    EnergyRefill,
    /// Raises max energy by the item's magnitude
    EnergyCapacity,
    /// Adds influence
    Influence,
    /// Cosmetic only
    Cosmetic,
}

impl ShopEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnergyRefill => "energy_refill",
            Self::EnergyCapacity => "energy_capacity",
            Self::Influence => "influence",
            Self::Cosmetic => "cosmetic",
        }
    }

    pub fn parse(s: &str) -> CoreResult<Self> {
        match s {
            "energy_refill" => Ok(Self::EnergyRefill),
            "energy_capacity" => Ok(Self::EnergyCapacity),
            "influence" => Ok(Self::Influence),
            "cosmetic" => Ok(Self::Cosmetic),
            _ => Err(CoreError::validation(format!("Unknown shop effect: {}", s))),
        }
    }
}

/// Condition a badge is awarded on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeRequirement {
    Level,
    PowerTokens,
    TotalTaps,
    Referrals,
    HabitStreak,
    DiamondTier,
}

impl BadgeRequirement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Level => "level",
            Self::PowerTokens => "power_tokens",
            Self::TotalTaps => "total_taps",
            Self::Referrals => "referrals",
            Self::HabitStreak => "habit_streak",
            Self::DiamondTier => "diamond_tier",
        }
    }

    pub fn parse(s: &str) -> CoreResult<Self> {
        match s {
            "level" => Ok(Self::Level),
            "power_tokens" => Ok(Self::PowerTokens),
            "total_taps" => Ok(Self::TotalTaps),
            "referrals" => Ok(Self::Referrals),
            "habit_streak" => Ok(Self::HabitStreak),
            "diamond_tier" => Ok(Self::DiamondTier),
            _ => Err(CoreError::validation(format!("Unknown badge requirement: {}", s))),
        }
    }
}

/// Lifecycle of a competition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionStatus {
    Upcoming,
    Active,
    Ended,
    Finalized,
}

impl CompetitionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Active => "active",
            Self::Ended => "ended",
            Self::Finalized => "finalized",
        }
    }

    /// Status derived from the competition window, unless already finalized
    pub fn at(
        starts_at: chrono::DateTime<chrono::Utc>,
        ends_at: chrono::DateTime<chrono::Utc>,
        finalized: bool,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        if finalized {
            Self::Finalized
        } else if now < starts_at {
            Self::Upcoming
        } else if now < ends_at {
            Self::Active
        } else {
            Self::Ended
        }
    }
}

/// Marketplace listing status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Active,
    Sold,
    Cancelled,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Sold => "sold",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> CoreResult<Self> {
        match s {
            "active" => Ok(Self::Active),
            "sold" => Ok(Self::Sold),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(CoreError::validation(format!("Unknown listing status: {}", s))),
        }
    }
}

/// Tip or gift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TipKind {
    #[default]
    Tip,
    Gift,
}

impl TipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tip => "tip",
            Self::Gift => "gift",
        }
    }

    pub fn parse(s: &str) -> CoreResult<Self> {
        match s {
            "tip" => Ok(Self::Tip),
            "gift" => Ok(Self::Gift),
            _ => Err(CoreError::validation(format!("Unknown tip kind: {}", s))),
        }
    }
}

/// Membership role inside a community
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunityRole {
    Owner,
    Member,
}

impl CommunityRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Member => "member",
        }
    }

    pub fn parse(s: &str) -> CoreResult<Self> {
        match s {
            "owner" => Ok(Self::Owner),
            "member" => Ok(Self::Member),
            _ => Err(CoreError::validation(format!("Unknown community role: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    struct Stats;

    impl LeaderboardStats for Stats {
        fn power_tokens(&self) -> i64 {
            100
        }
        fn level(&self) -> i32 {
            3
        }
        fn experience(&self) -> i64 {
            450
        }
        fn influence(&self) -> i64 {
            7
        }
        fn diamonds(&self) -> i64 {
            12
        }
    }

    #[test]
    fn test_metric_value_of() {
        assert_eq!(LeaderboardMetric::PowerTokens.value_of(&Stats), 100);
        assert_eq!(LeaderboardMetric::Level.value_of(&Stats), 3);
        assert_eq!(LeaderboardMetric::Experience.value_of(&Stats), 450);
        assert_eq!(LeaderboardMetric::Influence.value_of(&Stats), 7);
        assert_eq!(LeaderboardMetric::Diamonds.value_of(&Stats), 12);
    }

    #[test]
    fn test_metric_round_trip_names() {
        for metric in [
            LeaderboardMetric::PowerTokens,
            LeaderboardMetric::Level,
            LeaderboardMetric::Experience,
            LeaderboardMetric::Influence,
            LeaderboardMetric::Diamonds,
        ] {
            assert_eq!(LeaderboardMetric::parse(metric.as_str()).unwrap(), metric);
        }
        assert_eq!(
            LeaderboardMetric::parse("tokens").unwrap(),
            LeaderboardMetric::PowerTokens
        );
        assert!(LeaderboardMetric::parse("karma").is_err());
    }

    #[test]
    fn test_period_keys() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(MissionCadence::Once.period_key(date), "once");
        assert_eq!(MissionCadence::Daily.period_key(date), "2024-03-05");
        assert_eq!(MissionCadence::Weekly.period_key(date), "2024-W10");
    }

    #[test]
    fn test_competition_status_window() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap();
        let during = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();

        assert_eq!(CompetitionStatus::at(start, end, false, before), CompetitionStatus::Upcoming);
        assert_eq!(CompetitionStatus::at(start, end, false, during), CompetitionStatus::Active);
        assert_eq!(CompetitionStatus::at(start, end, false, end), CompetitionStatus::Ended);
        assert_eq!(CompetitionStatus::at(start, end, true, during), CompetitionStatus::Finalized);
    }
}
