//! Badge evaluation
//!
//! Run after any action that can move a player past a badge threshold.
//! Awarding is idempotent, so evaluating twice is harmless.

use pp_core::logging::operations;
use pp_core::BadgeRequirement;
use tracing::{info, warn};

use crate::entities::{BadgeEntity, PlayerEntity};
use crate::error::StoreResult;
use crate::repos::Store;

/// Lazily fetched counters that live outside the player row
struct ExternalCounters<'s> {
    store: &'s dyn Store,
    player_id: uuid::Uuid,
    referrals: Option<i64>,
    best_streak: Option<i64>,
}

impl<'s> ExternalCounters<'s> {
    async fn referrals(&mut self) -> StoreResult<i64> {
        if let Some(n) = self.referrals {
            return Ok(n);
        }
        let n = self.store.count_referrals(self.player_id).await?;
        self.referrals = Some(n);
        Ok(n)
    }

    async fn best_streak(&mut self) -> StoreResult<i64> {
        if let Some(n) = self.best_streak {
            return Ok(n);
        }
        let n = self.store.best_streak(self.player_id).await?;
        self.best_streak = Some(n);
        Ok(n)
    }
}

/// Award every catalog badge the player now qualifies for; returns the new ones
pub async fn evaluate_badges(
    store: &dyn Store,
    player: &PlayerEntity,
) -> StoreResult<Vec<BadgeEntity>> {
    let catalog = store.list_badges().await?;
    if catalog.is_empty() {
        return Ok(Vec::new());
    }

    let tier_badge = player.tier().benefits().badge;
    let mut counters = ExternalCounters {
        store,
        player_id: player.id,
        referrals: None,
        best_streak: None,
    };

    let mut awarded = Vec::new();
    for badge in catalog {
        let qualifies = if tier_badge.as_deref() == Some(badge.code.as_str()) {
            true
        } else {
            let requirement = match BadgeRequirement::parse(&badge.requirement) {
                Ok(r) => r,
                Err(err) => {
                    warn!(badge = %badge.code, error = %err, "Skipping badge with unknown requirement");
                    continue;
                }
            };
            let value = match requirement {
                BadgeRequirement::Level => i64::from(player.level),
                BadgeRequirement::PowerTokens => player.power_tokens,
                BadgeRequirement::TotalTaps => player.total_taps,
                BadgeRequirement::DiamondTier => player.tier().rank(),
                BadgeRequirement::Referrals => counters.referrals().await?,
                BadgeRequirement::HabitStreak => counters.best_streak().await?,
            };
            value >= badge.threshold
        };

        if qualifies && store.award_badge(player.id, badge.id).await? {
            info!(
                player_id = %player.id,
                operation = operations::BADGE_AWARD,
                badge = %badge.code,
                "Badge awarded"
            );
            awarded.push(badge);
        }
    }
    Ok(awarded)
}
