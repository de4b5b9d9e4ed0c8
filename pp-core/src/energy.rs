//! Tap energy
//!
//! Energy is stored as a snapshot (`stored` at `updated_at`) and regenerates
//! linearly up to the player's maximum.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Energy snapshot after regeneration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyState {
    pub current: i64,
    pub max: i64,
    pub updated_at: DateTime<Utc>,
}

/// Energy available at `now`
pub fn regenerate(
    stored: i64,
    max: i64,
    updated_at: DateTime<Utc>,
    now: DateTime<Utc>,
    per_second: i64,
) -> EnergyState {
    let elapsed = (now - updated_at).num_seconds().max(0);
    let current = stored
        .max(0)
        .saturating_add(elapsed.saturating_mul(per_second.max(0)))
        .min(max);

    EnergyState {
        current,
        max,
        updated_at: now,
    }
}

/// Number of taps that can be applied out of `requested`
pub fn spend_energy(available: i64, requested: i64) -> CoreResult<i64> {
    if requested <= 0 {
        return Err(CoreError::InvalidAmount(format!(
            "tap count must be positive, got {}",
            requested
        )));
    }
    if available <= 0 {
        return Err(CoreError::InsufficientEnergy { available });
    }
    Ok(requested.min(available))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_regenerate_linear() {
        let t0 = Utc::now();
        let state = regenerate(10, 1000, t0, t0 + Duration::seconds(30), 1);
        assert_eq!(state.current, 40);
        assert_eq!(state.updated_at, t0 + Duration::seconds(30));
    }

    #[test]
    fn test_regenerate_capped() {
        let t0 = Utc::now();
        let state = regenerate(990, 1000, t0, t0 + Duration::hours(1), 1);
        assert_eq!(state.current, 1000);
    }

    #[test]
    fn test_clock_skew_does_not_drain() {
        let t0 = Utc::now();
        let state = regenerate(500, 1000, t0, t0 - Duration::seconds(60), 1);
        assert_eq!(state.current, 500);
    }

    #[test]
    fn test_spend_energy_partial() {
        assert_eq!(spend_energy(5, 10).unwrap(), 5);
        assert_eq!(spend_energy(50, 10).unwrap(), 10);
    }

    #[test]
    fn test_spend_energy_empty() {
        assert!(matches!(
            spend_energy(0, 1),
            Err(CoreError::InsufficientEnergy { available: 0 })
        ));
        assert!(matches!(spend_energy(10, 0), Err(CoreError::InvalidAmount(_))));
    }
}
