//! Repository traits
//!
//! Writes that touch balances take a mutation closure. The backend loads
//! and locks every row involved, runs the closure, then persists the rows
//! and the ledger entries the closure returned in one unit of work. If the
//! closure fails nothing is written.

use async_trait::async_trait;

pub mod course_repo;
pub mod game_repo;
pub mod habit_repo;
pub mod ledger_repo;
pub mod marketplace_repo;
pub mod player_repo;
pub mod shop_repo;
pub mod social_repo;
pub mod token_repo;

pub use course_repo::{CourseRepository, EnrollmentMutation};
pub use game_repo::{BadgeRepository, MissionClaimMutation, MissionRepository};
pub use habit_repo::{HabitMutation, HabitRepository};
pub use ledger_repo::LedgerRepository;
pub use marketplace_repo::{ListingMutation, MarketplaceRepository, TipRepository};
pub use player_repo::{PairMutation, PlayerMutation, PlayerRepository};
pub use shop_repo::{ShopMutation, ShopRepository};
pub use social_repo::{CompetitionMutation, FinalizeMutation, SocialRepository};
pub use token_repo::{MovementTokenRepository, TokenPurchaseMutation};

use crate::error::StoreResult;

/// Every repository behind one handle
#[async_trait]
pub trait Store:
    PlayerRepository
    + LedgerRepository
    + MissionRepository
    + BadgeRepository
    + ShopRepository
    + SocialRepository
    + MarketplaceRepository
    + TipRepository
    + MovementTokenRepository
    + HabitRepository
    + CourseRepository
{
    /// Backend name for health output
    fn backend(&self) -> &'static str;

    /// Cheap liveness probe
    async fn ping(&self) -> StoreResult<()>;
}
