//! People Power Core
//!
//! Domain types and pure game/economy rules shared by the store and API
//! layers. Nothing in this crate touches I/O.
//!
//! # Modules
//!
//! - [`progression`] - experience to level mapping and level-up bonuses
//! - [`energy`] - tap energy regeneration
//! - [`streak`] - habit streak tracking
//! - [`pricing`] - movement token price impact
//! - [`tiers`] - diamond tiers and their benefits
//! - [`economy`] - transaction kinds, amount validation, referral codes
//! - [`course`] - templated course generator
//! - [`config`] - game tunables

pub mod config;
pub mod course;
pub mod economy;
pub mod energy;
pub mod error;
pub mod logging;
pub mod pricing;
pub mod progression;
pub mod streak;
pub mod tiers;
pub mod types;

pub use config::GameConfig;
pub use course::{CourseGenerator, Difficulty, GeneratedCourse, GeneratedLesson, QuizQuestion};
pub use economy::{
    diamonds_for_payment, referral_code_for, validate_amount, DiamondTransactionKind,
    TransactionKind, DIAMONDS_PER_TON,
};
pub use energy::{regenerate, spend_energy, EnergyState};
pub use error::{CoreError, CoreResult};
pub use pricing::{market_cap, price_after_purchase, purchase_cost, PriceQuote};
pub use progression::{apply_experience, experience_for_level, level_for_experience, level_up_bonus, LevelChange};
pub use streak::{advance_streak, StreakUpdate};
pub use tiers::{DiamondTier, TierBenefits};
pub use types::*;

/// Core crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
