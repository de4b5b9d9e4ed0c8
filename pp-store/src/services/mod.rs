//! Service layer
//!
//! Services apply the rules from `pp-core` on top of the repositories.
//! Each one holds the shared store handle and the game tunables.

pub mod analytics_service;
pub mod badges;
pub mod diamond_service;
pub mod economy_service;
pub mod education_service;
pub mod game_service;
pub mod habit_service;
pub mod marketplace_service;
pub mod social_service;
pub mod tip_service;
pub mod token_service;

pub use analytics_service::{AnalyticsOverview, AnalyticsService};
pub use badges::evaluate_badges;
pub use diamond_service::{DiamondPurchase, DiamondService, DiamondSummary, StakeOutcome};
pub use economy_service::{Balance, EconomyService, ShopPurchaseOutcome, TransferOutcome};
pub use education_service::{EducationService, LessonOutcome};
pub use game_service::{
    DailyLoginOutcome, GameService, LeaderboardEntry, LoginOutcome, MissionClaim, MissionView,
    PlayerStats, TapOutcome,
};
pub use habit_service::{HabitCompletion, HabitService};
pub use marketplace_service::{ListingPurchase, MarketplaceService};
pub use social_service::{ReferralOutcome, SocialService};
pub use tip_service::TipService;
pub use token_service::{MovementTokenService, TokenPurchase};

use pp_core::GameConfig;
use std::sync::Arc;

use crate::repos::Store;

/// Every service over one store
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn Store>,
    pub config: GameConfig,
    pub game: Arc<GameService>,
    pub economy: Arc<EconomyService>,
    pub diamonds: Arc<DiamondService>,
    pub social: Arc<SocialService>,
    pub marketplace: Arc<MarketplaceService>,
    pub tips: Arc<TipService>,
    pub tokens: Arc<MovementTokenService>,
    pub habits: Arc<HabitService>,
    pub education: Arc<EducationService>,
    pub analytics: Arc<AnalyticsService>,
}

impl Services {
    pub fn new(store: Arc<dyn Store>, config: GameConfig) -> Self {
        Self {
            game: Arc::new(GameService::new(store.clone(), config.clone())),
            economy: Arc::new(EconomyService::new(store.clone(), config.clone())),
            diamonds: Arc::new(DiamondService::new(store.clone(), config.clone())),
            social: Arc::new(SocialService::new(store.clone(), config.clone())),
            marketplace: Arc::new(MarketplaceService::new(store.clone(), config.clone())),
            tips: Arc::new(TipService::new(store.clone(), config.clone())),
            tokens: Arc::new(MovementTokenService::new(store.clone(), config.clone())),
            habits: Arc::new(HabitService::new(store.clone())),
            education: Arc::new(EducationService::new(store.clone(), config.clone())),
            analytics: Arc::new(AnalyticsService::new(store.clone(), config.clone())),
            store,
            config,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::entities::{NewPlayer, PlayerEntity};
    use crate::memory::MemoryStore;
    use pp_core::{referral_code_for, TransactionKind};
    use uuid::Uuid;

    pub fn memory_store() -> Arc<dyn Store> {
        Arc::new(MemoryStore::new())
    }

    /// Create a player holding `tokens` power tokens
    pub async fn funded_player(store: &Arc<dyn Store>, telegram_id: i64, tokens: i64) -> PlayerEntity {
        let id = Uuid::new_v4();
        let player = store
            .create_player(NewPlayer {
                id,
                telegram_id,
                username: format!("player{}", telegram_id),
                display_name: None,
                referral_code: referral_code_for(&id),
                max_energy: 1000,
            })
            .await
            .unwrap();
        if tokens == 0 {
            return player;
        }
        store
            .mutate_player(
                player.id,
                Box::new(move |p| Ok(vec![p.credit_tokens(tokens, TransactionKind::AdminGrant, "seed")?])),
            )
            .await
            .unwrap()
    }

    /// Give a player diamonds without going through a purchase
    pub async fn grant_diamonds(store: &Arc<dyn Store>, player_id: Uuid, diamonds: i64) -> PlayerEntity {
        store
            .mutate_player(
                player_id,
                Box::new(move |p| {
                    Ok(vec![p.credit_diamonds(
                        diamonds,
                        pp_core::DiamondTransactionKind::Grant,
                        "seed",
                    )?])
                }),
            )
            .await
            .unwrap()
    }
}
