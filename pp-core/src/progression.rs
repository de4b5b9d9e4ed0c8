//! Player progression
//!
//! Level is a pure function of experience:
//!
//! ```text
//! level = floor(sqrt(experience / 100)) + 1
//! ```
//!
//! Every level reached grants a flat `level * 10` power token bonus.

use serde::{Deserialize, Serialize};

/// Outcome of granting experience
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelChange {
    pub old_level: i32,
    pub new_level: i32,
    /// Experience after the grant
    pub experience: i64,
    /// Tokens owed for every level crossed
    pub bonus_tokens: i64,
}

impl LevelChange {
    pub fn leveled_up(&self) -> bool {
        self.new_level > self.old_level
    }

    pub fn levels_gained(&self) -> i32 {
        self.new_level - self.old_level
    }
}

/// Integer square root (floor)
fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    let mut x = (n as f64).sqrt() as u64;
    // f64 can be off by one for large inputs
    while x * x > n {
        x -= 1;
    }
    while (x + 1) * (x + 1) <= n {
        x += 1;
    }
    x
}

/// Level for a given amount of experience
///
/// `floor(sqrt(floor(x))) == floor(sqrt(x))` for non-negative `x`, so the
/// division can be done in integers.
pub fn level_for_experience(experience: i64) -> i32 {
    let exp = experience.max(0) as u64;
    (isqrt(exp / 100) + 1) as i32
}

/// Minimum experience needed to be at `level`
pub fn experience_for_level(level: i32) -> i64 {
    let steps = (level.max(1) - 1) as i64;
    steps * steps * 100
}

/// Token bonus for reaching `level`
pub fn level_up_bonus(level: i32) -> i64 {
    level as i64 * 10
}

/// Grant experience and work out the level change
pub fn apply_experience(current_experience: i64, gained: i64) -> LevelChange {
    let old_level = level_for_experience(current_experience);
    let experience = current_experience.saturating_add(gained.max(0));
    let new_level = level_for_experience(experience);

    let bonus_tokens = ((old_level + 1)..=new_level).map(level_up_bonus).sum();

    LevelChange {
        old_level,
        new_level,
        experience,
        bonus_tokens,
    }
}

/// Progress towards the next level as (current, needed) within the level
pub fn level_progress(experience: i64) -> (i64, i64) {
    let level = level_for_experience(experience);
    let floor = experience_for_level(level);
    let next = experience_for_level(level + 1);
    (experience.max(0) - floor, next - floor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_boundaries() {
        assert_eq!(level_for_experience(0), 1);
        assert_eq!(level_for_experience(99), 1);
        assert_eq!(level_for_experience(100), 2);
        assert_eq!(level_for_experience(399), 2);
        assert_eq!(level_for_experience(400), 3);
        assert_eq!(level_for_experience(899), 3);
        assert_eq!(level_for_experience(900), 4);
    }

    #[test]
    fn test_negative_experience_is_level_one() {
        assert_eq!(level_for_experience(-50), 1);
    }

    #[test]
    fn test_experience_for_level_matches_level_fn() {
        for level in 1..50 {
            let exp = experience_for_level(level);
            assert_eq!(level_for_experience(exp), level);
            if exp > 0 {
                assert_eq!(level_for_experience(exp - 1), level - 1);
            }
        }
    }

    #[test]
    fn test_apply_experience_without_level_up() {
        let change = apply_experience(10, 20);
        assert_eq!(change.experience, 30);
        assert!(!change.leveled_up());
        assert_eq!(change.bonus_tokens, 0);
    }

    #[test]
    fn test_apply_experience_single_level_up() {
        let change = apply_experience(399, 1);
        assert_eq!(change.old_level, 2);
        assert_eq!(change.new_level, 3);
        assert_eq!(change.bonus_tokens, 30);
    }

    #[test]
    fn test_apply_experience_multiple_levels() {
        // level 1 -> level 4 crosses 2, 3 and 4
        let change = apply_experience(0, 900);
        assert_eq!(change.new_level, 4);
        assert_eq!(change.levels_gained(), 3);
        assert_eq!(change.bonus_tokens, 20 + 30 + 40);
    }

    #[test]
    fn test_large_experience() {
        let exp = 100 * 1_000_000i64 * 1_000_000;
        assert_eq!(level_for_experience(exp), 1_000_001);
    }

    #[test]
    fn test_level_progress() {
        assert_eq!(level_progress(150), (50, 300));
        assert_eq!(level_progress(0), (0, 100));
    }
}
