use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use pp_core::LeaderboardMetric;
use uuid::Uuid;

use super::{insert_ledger, lock_pair, lock_player, save_player, PgStore};
use crate::entities::*;
use crate::error::StoreResult;
use crate::repos::{LedgerRepository, PairMutation, PlayerMutation, PlayerRepository};

fn metric_column(metric: LeaderboardMetric) -> &'static str {
    match metric {
        LeaderboardMetric::PowerTokens => "power_tokens",
        LeaderboardMetric::Level => "level",
        LeaderboardMetric::Experience => "experience",
        LeaderboardMetric::Influence => "influence",
        LeaderboardMetric::Diamonds => "diamonds",
    }
}

#[async_trait]
impl PlayerRepository for PgStore {
    async fn create_player(&self, new: NewPlayer) -> StoreResult<PlayerEntity> {
        let player = PlayerEntity::new(new, Utc::now());
        let created = sqlx::query_as::<_, PlayerEntity>(
            r#"INSERT INTO players (
                id, telegram_id, username, display_name, referral_code, level, experience,
                influence, power_tokens, diamonds, diamonds_staked, diamond_tier, energy,
                max_energy, energy_updated_at, total_taps, is_admin, created_at, updated_at,
                last_active_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            RETURNING *"#,
        )
        .bind(player.id)
        .bind(player.telegram_id)
        .bind(&player.username)
        .bind(&player.display_name)
        .bind(&player.referral_code)
        .bind(player.level)
        .bind(player.experience)
        .bind(player.influence)
        .bind(player.power_tokens)
        .bind(player.diamonds)
        .bind(player.diamonds_staked)
        .bind(&player.diamond_tier)
        .bind(player.energy)
        .bind(player.max_energy)
        .bind(player.energy_updated_at)
        .bind(player.total_taps)
        .bind(player.is_admin)
        .bind(player.created_at)
        .bind(player.updated_at)
        .bind(player.last_active_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn get_player(&self, id: Uuid) -> StoreResult<Option<PlayerEntity>> {
        let player = sqlx::query_as::<_, PlayerEntity>("SELECT * FROM players WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(player)
    }

    async fn get_player_by_telegram(&self, telegram_id: i64) -> StoreResult<Option<PlayerEntity>> {
        let player =
            sqlx::query_as::<_, PlayerEntity>("SELECT * FROM players WHERE telegram_id = $1")
                .bind(telegram_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(player)
    }

    async fn get_player_by_referral_code(&self, code: &str) -> StoreResult<Option<PlayerEntity>> {
        let player = sqlx::query_as::<_, PlayerEntity>(
            "SELECT * FROM players WHERE referral_code = UPPER($1)",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(player)
    }

    async fn list_players(&self, limit: i64, offset: i64) -> StoreResult<Vec<PlayerEntity>> {
        let players = sqlx::query_as::<_, PlayerEntity>(
            "SELECT * FROM players ORDER BY created_at, id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(players)
    }

    async fn leaderboard(
        &self,
        metric: LeaderboardMetric,
        limit: i64,
    ) -> StoreResult<Vec<PlayerEntity>> {
        // column name comes from a closed enum, never from input
        let sql = format!(
            "SELECT * FROM players ORDER BY {} DESC, created_at ASC LIMIT $1",
            metric_column(metric)
        );
        let players = sqlx::query_as::<_, PlayerEntity>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(players)
    }

    async fn mutate_player<'a>(
        &self,
        id: Uuid,
        mutation: PlayerMutation<'a>,
    ) -> StoreResult<PlayerEntity> {
        let mut tx = self.pool.begin().await?;
        let mut player = lock_player(&mut tx, id).await?;
        let entries = mutation(&mut player)?;

        let now = Utc::now();
        insert_ledger(&mut tx, entries, now).await?;
        let player = save_player(&mut tx, &player, now).await?;
        tx.commit().await?;
        Ok(player)
    }

    async fn mutate_pair<'a>(
        &self,
        first: Uuid,
        second: Uuid,
        mutation: PairMutation<'a>,
    ) -> StoreResult<(PlayerEntity, PlayerEntity)> {
        let mut tx = self.pool.begin().await?;
        let (mut a, mut b) = lock_pair(&mut tx, first, second).await?;
        let entries = mutation(&mut a, &mut b)?;

        let now = Utc::now();
        insert_ledger(&mut tx, entries, now).await?;
        let a = save_player(&mut tx, &a, now).await?;
        let b = save_player(&mut tx, &b, now).await?;
        tx.commit().await?;
        Ok((a, b))
    }
}

#[async_trait]
impl LedgerRepository for PgStore {
    async fn list_token_transactions(
        &self,
        player_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<TokenTransactionEntity>> {
        let rows = sqlx::query_as::<_, TokenTransactionEntity>(
            "SELECT * FROM token_transactions WHERE player_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(player_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_diamond_transactions(
        &self,
        player_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<DiamondTransactionEntity>> {
        let rows = sqlx::query_as::<_, DiamondTransactionEntity>(
            "SELECT * FROM diamond_transactions WHERE player_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(player_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn platform_totals(&self, now: DateTime<Utc>) -> StoreResult<PlatformTotals> {
        let totals = sqlx::query_as::<_, PlatformTotals>(
            r#"SELECT
                (SELECT COUNT(*) FROM players) AS total_players,
                (SELECT COUNT(*) FROM players WHERE last_active_at >= $1) AS active_players_24h,
                (SELECT COALESCE(SUM(power_tokens), 0)::BIGINT FROM players) AS total_power_tokens,
                (SELECT COALESCE(SUM(diamonds), 0)::BIGINT FROM players) AS total_diamonds,
                (SELECT COALESCE(SUM(diamonds_staked), 0)::BIGINT FROM players) AS total_staked,
                (SELECT COUNT(*) FROM token_transactions) AS token_transactions,
                (SELECT COUNT(*) FROM diamond_transactions) AS diamond_transactions,
                (SELECT COALESCE(SUM(ABS(amount)), 0)::BIGINT FROM token_transactions) AS token_volume"#,
        )
        .bind(now - Duration::hours(24))
        .fetch_one(&self.pool)
        .await?;
        Ok(totals)
    }

    async fn daily_activity(&self, since: NaiveDate) -> StoreResult<Vec<DailyActivity>> {
        let rows = sqlx::query_as::<_, DailyActivity>(
            r#"WITH
                p AS (
                    SELECT (created_at AT TIME ZONE 'UTC')::DATE AS day, COUNT(*) AS new_players
                    FROM players GROUP BY 1
                ),
                t AS (
                    SELECT (created_at AT TIME ZONE 'UTC')::DATE AS day,
                           COUNT(*) AS token_transactions,
                           SUM(ABS(amount))::BIGINT AS token_volume
                    FROM token_transactions GROUP BY 1
                ),
                d AS (
                    SELECT (created_at AT TIME ZONE 'UTC')::DATE AS day,
                           SUM(ABS(amount))::BIGINT AS diamond_volume
                    FROM diamond_transactions GROUP BY 1
                )
            SELECT
                days.day,
                COALESCE(p.new_players, 0) AS new_players,
                COALESCE(t.token_transactions, 0) AS token_transactions,
                COALESCE(t.token_volume, 0) AS token_volume,
                COALESCE(d.diamond_volume, 0) AS diamond_volume
            FROM (SELECT day FROM p UNION SELECT day FROM t UNION SELECT day FROM d) AS days
            LEFT JOIN p ON p.day = days.day
            LEFT JOIN t ON t.day = days.day
            LEFT JOIN d ON d.day = days.day
            WHERE days.day >= $1
            ORDER BY days.day"#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
