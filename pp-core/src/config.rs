//! Game tunables

use serde::{Deserialize, Serialize};
use std::env;

/// Rewards and limits used by the game loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Default max energy for new players
    pub max_energy: i64,
    /// Energy regenerated per second
    pub energy_regen_per_sec: i64,
    /// Power tokens earned per tap before tier multiplier
    pub tokens_per_tap: i64,
    /// Experience earned per tap
    pub experience_per_tap: i64,
    /// Taps accepted in one request
    pub max_taps_per_request: i64,
    /// Reward for the first login of a day
    pub daily_login_reward: i64,
    /// Reward paid to the referrer
    pub referrer_reward: i64,
    /// Reward paid to the new player
    pub referee_reward: i64,
    /// Experience per completed lesson
    pub lesson_experience: i64,
    /// Max chat message length
    pub max_message_len: usize,
    /// Default page size for history queries
    pub default_page_size: i64,
    /// Max page size for history queries
    pub max_page_size: i64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_energy: 1000,
            energy_regen_per_sec: 1,
            tokens_per_tap: 1,
            experience_per_tap: 1,
            max_taps_per_request: 500,
            daily_login_reward: 100,
            referrer_reward: 500,
            referee_reward: 250,
            lesson_experience: 25,
            max_message_len: 1000,
            default_page_size: 50,
            max_page_size: 200,
        }
    }
}

impl GameConfig {
    /// Load from environment variables, falling back to defaults
    ///
    /// Environment variables:
    /// - PP_MAX_ENERGY
    /// - PP_ENERGY_REGEN_PER_SEC
    /// - PP_TOKENS_PER_TAP
    /// - PP_DAILY_LOGIN_REWARD
    /// - PP_REFERRER_REWARD
    /// - PP_REFEREE_REWARD
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_energy: env_i64("PP_MAX_ENERGY", defaults.max_energy),
            energy_regen_per_sec: env_i64("PP_ENERGY_REGEN_PER_SEC", defaults.energy_regen_per_sec),
            tokens_per_tap: env_i64("PP_TOKENS_PER_TAP", defaults.tokens_per_tap),
            daily_login_reward: env_i64("PP_DAILY_LOGIN_REWARD", defaults.daily_login_reward),
            referrer_reward: env_i64("PP_REFERRER_REWARD", defaults.referrer_reward),
            referee_reward: env_i64("PP_REFEREE_REWARD", defaults.referee_reward),
            ..defaults
        }
    }

    /// Clamp a requested page size into the allowed range
    pub fn page_size(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size)
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.max_energy, 1000);
        assert_eq!(config.referrer_reward, 500);
    }

    #[test]
    fn test_page_size_clamped() {
        let config = GameConfig::default();
        assert_eq!(config.page_size(None), 50);
        assert_eq!(config.page_size(Some(0)), 1);
        assert_eq!(config.page_size(Some(10_000)), 200);
    }
}
