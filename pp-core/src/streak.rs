//! Habit streaks
//!
//! A completion on the calendar day after the previous one continues the
//! streak; a gap resets it to 1; a second completion on the same day is
//! rejected.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Result of recording a completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "streak", rename_all = "snake_case")]
pub enum StreakUpdate {
    /// First ever completion
    Started,
    /// Completed the day after the last completion
    Continued(i32),
    /// A day or more was missed
    Reset,
}

impl StreakUpdate {
    /// New streak length
    pub fn streak(&self) -> i32 {
        match self {
            StreakUpdate::Started | StreakUpdate::Reset => 1,
            StreakUpdate::Continued(n) => *n,
        }
    }
}

/// Work out the streak after completing on `today`
pub fn advance_streak(
    last_completed: Option<NaiveDate>,
    current_streak: i32,
    today: NaiveDate,
) -> CoreResult<StreakUpdate> {
    let Some(last) = last_completed else {
        return Ok(StreakUpdate::Started);
    };

    let gap = (today - last).num_days();
    match gap {
        0 => Err(CoreError::AlreadyCompleted(format!(
            "habit already completed on {}",
            today
        ))),
        1 => Ok(StreakUpdate::Continued(current_streak.max(0) + 1)),
        d if d < 0 => Err(CoreError::InvalidState(format!(
            "last completion {} is after {}",
            last, today
        ))),
        _ => Ok(StreakUpdate::Reset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_first_completion() {
        let update = advance_streak(None, 0, day(1)).unwrap();
        assert_eq!(update, StreakUpdate::Started);
        assert_eq!(update.streak(), 1);
    }

    #[test]
    fn test_consecutive_day() {
        let update = advance_streak(Some(day(1)), 4, day(2)).unwrap();
        assert_eq!(update, StreakUpdate::Continued(5));
    }

    #[test]
    fn test_gap_resets() {
        let update = advance_streak(Some(day(1)), 9, day(3)).unwrap();
        assert_eq!(update, StreakUpdate::Reset);
        assert_eq!(update.streak(), 1);
    }

    #[test]
    fn test_same_day_rejected() {
        assert!(matches!(
            advance_streak(Some(day(2)), 3, day(2)),
            Err(CoreError::AlreadyCompleted(_))
        ));
    }

    #[test]
    fn test_month_boundary() {
        let last = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            advance_streak(Some(last), 1, today).unwrap(),
            StreakUpdate::Continued(2)
        );
    }
}
