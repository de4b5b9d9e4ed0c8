use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use pp_core::LeaderboardMetric;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{newest_first, MemoryStore};
use crate::entities::*;
use crate::error::{StoreError, StoreResult};
use crate::repos::{LedgerRepository, PairMutation, PlayerMutation, PlayerRepository};

#[async_trait]
impl PlayerRepository for MemoryStore {
    async fn create_player(&self, new: NewPlayer) -> StoreResult<PlayerEntity> {
        let mut state = self.state.write().await;
        if state.players.values().any(|p| p.telegram_id == new.telegram_id) {
            return Err(StoreError::conflict(format!(
                "telegram id {} already registered",
                new.telegram_id
            )));
        }
        if state
            .players
            .values()
            .any(|p| p.referral_code == new.referral_code)
        {
            return Err(StoreError::conflict("referral code already in use"));
        }

        let player = PlayerEntity::new(new, Utc::now());
        state.players.insert(player.id, player.clone());
        Ok(player)
    }

    async fn get_player(&self, id: Uuid) -> StoreResult<Option<PlayerEntity>> {
        Ok(self.state.read().await.players.get(&id).cloned())
    }

    async fn get_player_by_telegram(&self, telegram_id: i64) -> StoreResult<Option<PlayerEntity>> {
        let state = self.state.read().await;
        Ok(state
            .players
            .values()
            .find(|p| p.telegram_id == telegram_id)
            .cloned())
    }

    async fn get_player_by_referral_code(&self, code: &str) -> StoreResult<Option<PlayerEntity>> {
        let state = self.state.read().await;
        Ok(state
            .players
            .values()
            .find(|p| p.referral_code.eq_ignore_ascii_case(code))
            .cloned())
    }

    async fn list_players(&self, limit: i64, offset: i64) -> StoreResult<Vec<PlayerEntity>> {
        let state = self.state.read().await;
        let mut players: Vec<_> = state.players.values().cloned().collect();
        players.sort_by_key(|p| (p.created_at, p.id));
        Ok(players
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn leaderboard(
        &self,
        metric: LeaderboardMetric,
        limit: i64,
    ) -> StoreResult<Vec<PlayerEntity>> {
        let state = self.state.read().await;
        let mut players: Vec<_> = state.players.values().cloned().collect();
        players.sort_by(|a, b| {
            metric
                .value_of(b)
                .cmp(&metric.value_of(a))
                .then(a.created_at.cmp(&b.created_at))
        });
        players.truncate(limit.max(0) as usize);
        Ok(players)
    }

    async fn mutate_player<'a>(
        &self,
        id: Uuid,
        mutation: PlayerMutation<'a>,
    ) -> StoreResult<PlayerEntity> {
        let mut state = self.state.write().await;
        let mut player = state.player(id)?;
        let entries = mutation(&mut player)?;

        let now = Utc::now();
        state.append_ledger(entries, now);
        Ok(state.commit_player(player, now))
    }

    async fn mutate_pair<'a>(
        &self,
        first: Uuid,
        second: Uuid,
        mutation: PairMutation<'a>,
    ) -> StoreResult<(PlayerEntity, PlayerEntity)> {
        if first == second {
            return Err(StoreError::validation("a player cannot trade with themselves"));
        }

        let mut state = self.state.write().await;
        let mut a = state.player(first)?;
        let mut b = state.player(second)?;
        let entries = mutation(&mut a, &mut b)?;

        let now = Utc::now();
        state.append_ledger(entries, now);
        let a = state.commit_player(a, now);
        let b = state.commit_player(b, now);
        Ok((a, b))
    }
}

#[async_trait]
impl LedgerRepository for MemoryStore {
    async fn list_token_transactions(
        &self,
        player_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<TokenTransactionEntity>> {
        let state = self.state.read().await;
        let rows = state
            .token_txs
            .iter()
            .filter(|tx| tx.player_id == player_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |tx| tx.created_at, limit))
    }

    async fn list_diamond_transactions(
        &self,
        player_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<DiamondTransactionEntity>> {
        let state = self.state.read().await;
        let rows = state
            .diamond_txs
            .iter()
            .filter(|tx| tx.player_id == player_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |tx| tx.created_at, limit))
    }

    async fn platform_totals(&self, now: DateTime<Utc>) -> StoreResult<PlatformTotals> {
        let state = self.state.read().await;
        let day_ago = now - Duration::hours(24);
        let players = state.players.values();

        Ok(PlatformTotals {
            total_players: state.players.len() as i64,
            active_players_24h: players
                .clone()
                .filter(|p| p.last_active_at >= day_ago)
                .count() as i64,
            total_power_tokens: players.clone().map(|p| p.power_tokens).sum(),
            total_diamonds: players.clone().map(|p| p.diamonds).sum(),
            total_staked: players.map(|p| p.diamonds_staked).sum(),
            token_transactions: state.token_txs.len() as i64,
            diamond_transactions: state.diamond_txs.len() as i64,
            token_volume: state.token_txs.iter().map(|tx| tx.amount.abs()).sum(),
        })
    }

    async fn daily_activity(&self, since: NaiveDate) -> StoreResult<Vec<DailyActivity>> {
        let state = self.state.read().await;
        let mut days: BTreeMap<NaiveDate, DailyActivity> = BTreeMap::new();

        for player in state.players.values() {
            if let Some(row) = day_row(&mut days, since, player.created_at.date_naive()) {
                row.new_players += 1;
            }
        }
        for tx in &state.token_txs {
            if let Some(row) = day_row(&mut days, since, tx.created_at.date_naive()) {
                row.token_transactions += 1;
                row.token_volume += tx.amount.abs();
            }
        }
        for tx in &state.diamond_txs {
            if let Some(row) = day_row(&mut days, since, tx.created_at.date_naive()) {
                row.diamond_volume += tx.amount.abs();
            }
        }

        Ok(days.into_values().collect())
    }
}

fn day_row(
    days: &mut BTreeMap<NaiveDate, DailyActivity>,
    since: NaiveDate,
    date: NaiveDate,
) -> Option<&mut DailyActivity> {
    if date < since {
        return None;
    }
    Some(days.entry(date).or_insert_with(|| DailyActivity {
        day: date,
        new_players: 0,
        token_transactions: 0,
        token_volume: 0,
        diamond_volume: 0,
    }))
}
