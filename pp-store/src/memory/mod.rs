//! In-memory backend
//!
//! All tables live behind a single `RwLock`, so every mutation is
//! serialized and atomic. Mutations work on cloned rows and only write them
//! back when the closure succeeds. Used for tests and for running the API
//! without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::entities::*;
use crate::error::{StoreError, StoreResult};
use crate::repos::Store;

mod game;
mod growth;
mod market;
mod players;
mod social;

#[derive(Debug, Default)]
pub(crate) struct MemoryState {
    players: HashMap<Uuid, PlayerEntity>,
    token_txs: Vec<TokenTransactionEntity>,
    diamond_txs: Vec<DiamondTransactionEntity>,
    missions: HashMap<Uuid, MissionEntity>,
    progress: HashMap<(Uuid, Uuid, String), MissionProgressEntity>,
    badges: HashMap<Uuid, BadgeEntity>,
    player_badges: HashMap<(Uuid, Uuid), DateTime<Utc>>,
    shop_items: HashMap<Uuid, ShopItemEntity>,
    shop_purchases: Vec<ShopPurchaseEntity>,
    communities: HashMap<Uuid, CommunityEntity>,
    members: HashMap<(Uuid, Uuid), CommunityMemberEntity>,
    messages: Vec<ChatMessageEntity>,
    competitions: HashMap<Uuid, CompetitionEntity>,
    entries: HashMap<(Uuid, Uuid), CompetitionEntryEntity>,
    // keyed by referee
    referrals: HashMap<Uuid, ReferralEntity>,
    listings: HashMap<Uuid, ListingEntity>,
    market_purchases: Vec<MarketplacePurchaseEntity>,
    tips: Vec<TipEntity>,
    tokens: HashMap<Uuid, MovementTokenEntity>,
    holdings: HashMap<(Uuid, Uuid), TokenHoldingEntity>,
    habits: HashMap<Uuid, HabitEntity>,
    courses: HashMap<Uuid, CourseEntity>,
    enrollments: HashMap<(Uuid, Uuid), EnrollmentEntity>,
}

impl MemoryState {
    fn player(&self, id: Uuid) -> StoreResult<PlayerEntity> {
        self.players
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Player", id))
    }

    /// Write back a mutated player and its ledger rows
    fn commit_player(&mut self, mut player: PlayerEntity, now: DateTime<Utc>) -> PlayerEntity {
        player.updated_at = now;
        self.players.insert(player.id, player.clone());
        player
    }

    fn append_ledger(&mut self, entries: Vec<LedgerEntry>, now: DateTime<Utc>) {
        for entry in entries {
            match entry {
                LedgerEntry::Token(tx) => {
                    self.token_txs.push(TokenTransactionEntity::from_new(tx, now));
                }
                LedgerEntry::Diamond(tx) => {
                    self.diamond_txs.push(DiamondTransactionEntity::from_new(tx, now));
                }
            }
        }
    }
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every row
    pub async fn clear(&self) {
        *self.state.write().await = MemoryState::default();
    }

    /// Move a competition window, for exercising finalization
    #[cfg(test)]
    pub(crate) async fn shift_competition(
        &self,
        id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) {
        if let Some(competition) = self.state.write().await.competitions.get_mut(&id) {
            competition.starts_at = starts_at;
            competition.ends_at = ends_at;
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        let _guard = self.state.read().await;
        Ok(())
    }
}

/// Newest-first truncation shared by list queries
fn newest_first<T, F>(mut rows: Vec<T>, key: F, limit: i64) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    // later inserts win ties
    rows.reverse();
    rows.sort_by_key(|row| std::cmp::Reverse(key(row)));
    rows.truncate(limit.max(0) as usize);
    rows
}
