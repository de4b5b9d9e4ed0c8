use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{insert_ledger, lock_player, save_player, PgStore};
use crate::entities::*;
use crate::error::{StoreError, StoreResult};
use crate::repos::{
    BadgeRepository, MissionClaimMutation, MissionRepository, ShopMutation, ShopRepository,
};

#[async_trait]
impl MissionRepository for PgStore {
    async fn create_mission(&self, new: NewMission) -> StoreResult<MissionEntity> {
        let mission = MissionEntity::new(new, Utc::now());
        let created = sqlx::query_as::<_, MissionEntity>(
            r#"INSERT INTO missions
                (id, title, description, cadence, target, reward_tokens, reward_experience,
                 reward_influence, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *"#,
        )
        .bind(mission.id)
        .bind(&mission.title)
        .bind(&mission.description)
        .bind(&mission.cadence)
        .bind(mission.target)
        .bind(mission.reward_tokens)
        .bind(mission.reward_experience)
        .bind(mission.reward_influence)
        .bind(mission.is_active)
        .bind(mission.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn get_mission(&self, id: Uuid) -> StoreResult<Option<MissionEntity>> {
        let mission = sqlx::query_as::<_, MissionEntity>("SELECT * FROM missions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(mission)
    }

    async fn list_missions(&self, active_only: bool) -> StoreResult<Vec<MissionEntity>> {
        let missions = sqlx::query_as::<_, MissionEntity>(
            "SELECT * FROM missions WHERE is_active OR NOT $1 ORDER BY created_at",
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(missions)
    }

    async fn list_progress(
        &self,
        player_id: Uuid,
        period_keys: &[String],
    ) -> StoreResult<Vec<MissionProgressEntity>> {
        let rows = sqlx::query_as::<_, MissionProgressEntity>(
            "SELECT * FROM mission_progress WHERE player_id = $1 AND period_key = ANY($2)",
        )
        .bind(player_id)
        .bind(period_keys)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn record_progress(
        &self,
        player_id: Uuid,
        mission_id: Uuid,
        period_key: &str,
        amount: i64,
        target: i64,
    ) -> StoreResult<MissionProgressEntity> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM missions WHERE id = $1")
            .bind(mission_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(StoreError::not_found("Mission", mission_id));
        }

        sqlx::query(
            r#"INSERT INTO mission_progress (player_id, mission_id, period_key, progress, updated_at)
            VALUES ($1, $2, $3, 0, $4)
            ON CONFLICT (player_id, mission_id, period_key) DO NOTHING"#,
        )
        .bind(player_id)
        .bind(mission_id)
        .bind(period_key)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let mut row = sqlx::query_as::<_, MissionProgressEntity>(
            r#"SELECT * FROM mission_progress
            WHERE player_id = $1 AND mission_id = $2 AND period_key = $3
            FOR UPDATE"#,
        )
        .bind(player_id)
        .bind(mission_id)
        .bind(period_key)
        .fetch_one(&mut *tx)
        .await?;
        row.advance(amount, target, now);

        save_progress(&mut tx, &row).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn claim_mission<'a>(
        &self,
        player_id: Uuid,
        mission_id: Uuid,
        period_key: &str,
        mutation: MissionClaimMutation<'a>,
    ) -> StoreResult<(MissionProgressEntity, PlayerEntity)> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut player = lock_player(&mut tx, player_id).await?;

        let mut progress = sqlx::query_as::<_, MissionProgressEntity>(
            r#"SELECT * FROM mission_progress
            WHERE player_id = $1 AND mission_id = $2 AND period_key = $3
            FOR UPDATE"#,
        )
        .bind(player_id)
        .bind(mission_id)
        .bind(period_key)
        .fetch_optional(&mut *tx)
        .await?
        .unwrap_or_else(|| MissionProgressEntity::empty(player_id, mission_id, period_key, now));

        let entries = mutation(&mut progress, &mut player)?;

        insert_ledger(&mut tx, entries, now).await?;
        save_progress(&mut tx, &progress).await?;
        let player = save_player(&mut tx, &player, now).await?;
        tx.commit().await?;
        Ok((progress, player))
    }
}

async fn save_progress(
    conn: &mut sqlx::PgConnection,
    row: &MissionProgressEntity,
) -> StoreResult<()> {
    sqlx::query(
        r#"INSERT INTO mission_progress
            (player_id, mission_id, period_key, progress, completed_at, claimed_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (player_id, mission_id, period_key) DO UPDATE SET
            progress = EXCLUDED.progress,
            completed_at = EXCLUDED.completed_at,
            claimed_at = EXCLUDED.claimed_at,
            updated_at = EXCLUDED.updated_at"#,
    )
    .bind(row.player_id)
    .bind(row.mission_id)
    .bind(&row.period_key)
    .bind(row.progress)
    .bind(row.completed_at)
    .bind(row.claimed_at)
    .bind(row.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

#[async_trait]
impl BadgeRepository for PgStore {
    async fn create_badge(&self, new: NewBadge) -> StoreResult<BadgeEntity> {
        let badge = BadgeEntity::new(new, Utc::now());
        let created = sqlx::query_as::<_, BadgeEntity>(
            r#"INSERT INTO badges (id, code, name, description, requirement, threshold, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *"#,
        )
        .bind(badge.id)
        .bind(&badge.code)
        .bind(&badge.name)
        .bind(&badge.description)
        .bind(&badge.requirement)
        .bind(badge.threshold)
        .bind(badge.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn list_badges(&self) -> StoreResult<Vec<BadgeEntity>> {
        let badges = sqlx::query_as::<_, BadgeEntity>("SELECT * FROM badges ORDER BY code")
            .fetch_all(&self.pool)
            .await?;
        Ok(badges)
    }

    async fn award_badge(&self, player_id: Uuid, badge_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"INSERT INTO player_badges (player_id, badge_id, awarded_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (player_id, badge_id) DO NOTHING"#,
        )
        .bind(player_id)
        .bind(badge_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_player_badges(&self, player_id: Uuid) -> StoreResult<Vec<PlayerBadgeEntity>> {
        let rows = sqlx::query_as::<_, PlayerBadgeEntity>(
            r#"SELECT pb.player_id, pb.badge_id, b.code, b.name, b.description, pb.awarded_at
            FROM player_badges pb
            JOIN badges b ON b.id = pb.badge_id
            WHERE pb.player_id = $1
            ORDER BY pb.awarded_at"#,
        )
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl ShopRepository for PgStore {
    async fn create_item(&self, new: NewShopItem) -> StoreResult<ShopItemEntity> {
        let item = ShopItemEntity::new(new, Utc::now());
        let created = sqlx::query_as::<_, ShopItemEntity>(
            r#"INSERT INTO shop_items
                (id, name, description, currency, price, stock, effect, effect_value, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *"#,
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.currency)
        .bind(item.price)
        .bind(item.stock)
        .bind(&item.effect)
        .bind(item.effect_value)
        .bind(item.is_active)
        .bind(item.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn get_item(&self, id: Uuid) -> StoreResult<Option<ShopItemEntity>> {
        let item = sqlx::query_as::<_, ShopItemEntity>("SELECT * FROM shop_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn list_items(&self, active_only: bool) -> StoreResult<Vec<ShopItemEntity>> {
        let items = sqlx::query_as::<_, ShopItemEntity>(
            "SELECT * FROM shop_items WHERE is_active OR NOT $1 ORDER BY price, name",
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn purchase_item<'a>(
        &self,
        player_id: Uuid,
        item_id: Uuid,
        quantity: i64,
        mutation: ShopMutation<'a>,
    ) -> StoreResult<(ShopPurchaseEntity, PlayerEntity)> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut item = sqlx::query_as::<_, ShopItemEntity>(
            "SELECT * FROM shop_items WHERE id = $1 FOR UPDATE",
        )
        .bind(item_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("ShopItem", item_id))?;
        let mut player = lock_player(&mut tx, player_id).await?;

        let entries = mutation(&mut item, &mut player)?;
        let purchase = ShopPurchaseEntity::new(player_id, &item, quantity, now);

        sqlx::query("UPDATE shop_items SET stock = $2, is_active = $3 WHERE id = $1")
            .bind(item.id)
            .bind(item.stock)
            .bind(item.is_active)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r#"INSERT INTO shop_purchases (id, player_id, item_id, currency, quantity, total_price, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(purchase.id)
        .bind(purchase.player_id)
        .bind(purchase.item_id)
        .bind(&purchase.currency)
        .bind(purchase.quantity)
        .bind(purchase.total_price)
        .bind(purchase.created_at)
        .execute(&mut *tx)
        .await?;
        insert_ledger(&mut tx, entries, now).await?;
        let player = save_player(&mut tx, &player, now).await?;
        tx.commit().await?;
        Ok((purchase, player))
    }
}
