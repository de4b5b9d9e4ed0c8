use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::MemoryStore;
use crate::entities::*;
use crate::error::{StoreError, StoreResult};
use crate::repos::{
    BadgeRepository, MissionClaimMutation, MissionRepository, ShopMutation, ShopRepository,
};

#[async_trait]
impl MissionRepository for MemoryStore {
    async fn create_mission(&self, new: NewMission) -> StoreResult<MissionEntity> {
        let mission = MissionEntity::new(new, Utc::now());
        self.state
            .write()
            .await
            .missions
            .insert(mission.id, mission.clone());
        Ok(mission)
    }

    async fn get_mission(&self, id: Uuid) -> StoreResult<Option<MissionEntity>> {
        Ok(self.state.read().await.missions.get(&id).cloned())
    }

    async fn list_missions(&self, active_only: bool) -> StoreResult<Vec<MissionEntity>> {
        let state = self.state.read().await;
        let mut missions: Vec<_> = state
            .missions
            .values()
            .filter(|m| !active_only || m.is_active)
            .cloned()
            .collect();
        missions.sort_by_key(|m| m.created_at);
        Ok(missions)
    }

    async fn list_progress(
        &self,
        player_id: Uuid,
        period_keys: &[String],
    ) -> StoreResult<Vec<MissionProgressEntity>> {
        let state = self.state.read().await;
        Ok(state
            .progress
            .values()
            .filter(|p| p.player_id == player_id && period_keys.contains(&p.period_key))
            .cloned()
            .collect())
    }

    async fn record_progress(
        &self,
        player_id: Uuid,
        mission_id: Uuid,
        period_key: &str,
        amount: i64,
        target: i64,
    ) -> StoreResult<MissionProgressEntity> {
        let mut state = self.state.write().await;
        if !state.missions.contains_key(&mission_id) {
            return Err(StoreError::not_found("Mission", mission_id));
        }

        let now = Utc::now();
        let row = state
            .progress
            .entry((player_id, mission_id, period_key.to_string()))
            .or_insert_with(|| MissionProgressEntity::empty(player_id, mission_id, period_key, now));
        row.advance(amount, target, now);
        Ok(row.clone())
    }

    async fn claim_mission<'a>(
        &self,
        player_id: Uuid,
        mission_id: Uuid,
        period_key: &str,
        mutation: MissionClaimMutation<'a>,
    ) -> StoreResult<(MissionProgressEntity, PlayerEntity)> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let key = (player_id, mission_id, period_key.to_string());

        let mut progress = state
            .progress
            .get(&key)
            .cloned()
            .unwrap_or_else(|| MissionProgressEntity::empty(player_id, mission_id, period_key, now));
        let mut player = state.player(player_id)?;
        let entries = mutation(&mut progress, &mut player)?;

        state.append_ledger(entries, now);
        state.progress.insert(key, progress.clone());
        let player = state.commit_player(player, now);
        Ok((progress, player))
    }
}

#[async_trait]
impl BadgeRepository for MemoryStore {
    async fn create_badge(&self, new: NewBadge) -> StoreResult<BadgeEntity> {
        let mut state = self.state.write().await;
        if state.badges.values().any(|b| b.code == new.code) {
            return Err(StoreError::conflict(format!("badge {} already exists", new.code)));
        }
        let badge = BadgeEntity::new(new, Utc::now());
        state.badges.insert(badge.id, badge.clone());
        Ok(badge)
    }

    async fn list_badges(&self) -> StoreResult<Vec<BadgeEntity>> {
        let state = self.state.read().await;
        let mut badges: Vec<_> = state.badges.values().cloned().collect();
        badges.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(badges)
    }

    async fn award_badge(&self, player_id: Uuid, badge_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if !state.badges.contains_key(&badge_id) {
            return Err(StoreError::not_found("Badge", badge_id));
        }
        if state.player_badges.contains_key(&(player_id, badge_id)) {
            return Ok(false);
        }
        state.player_badges.insert((player_id, badge_id), Utc::now());
        Ok(true)
    }

    async fn list_player_badges(&self, player_id: Uuid) -> StoreResult<Vec<PlayerBadgeEntity>> {
        let state = self.state.read().await;
        let mut held: Vec<_> = state
            .player_badges
            .iter()
            .filter(|((owner, _), _)| *owner == player_id)
            .filter_map(|((_, badge_id), awarded_at)| {
                state.badges.get(badge_id).map(|badge| PlayerBadgeEntity {
                    player_id,
                    badge_id: badge.id,
                    code: badge.code.clone(),
                    name: badge.name.clone(),
                    description: badge.description.clone(),
                    awarded_at: *awarded_at,
                })
            })
            .collect();
        held.sort_by_key(|b| b.awarded_at);
        Ok(held)
    }
}

#[async_trait]
impl ShopRepository for MemoryStore {
    async fn create_item(&self, new: NewShopItem) -> StoreResult<ShopItemEntity> {
        let item = ShopItemEntity::new(new, Utc::now());
        self.state
            .write()
            .await
            .shop_items
            .insert(item.id, item.clone());
        Ok(item)
    }

    async fn get_item(&self, id: Uuid) -> StoreResult<Option<ShopItemEntity>> {
        Ok(self.state.read().await.shop_items.get(&id).cloned())
    }

    async fn list_items(&self, active_only: bool) -> StoreResult<Vec<ShopItemEntity>> {
        let state = self.state.read().await;
        let mut items: Vec<_> = state
            .shop_items
            .values()
            .filter(|i| !active_only || i.is_active)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.price.cmp(&b.price).then(a.name.cmp(&b.name)));
        Ok(items)
    }

    async fn purchase_item<'a>(
        &self,
        player_id: Uuid,
        item_id: Uuid,
        quantity: i64,
        mutation: ShopMutation<'a>,
    ) -> StoreResult<(ShopPurchaseEntity, PlayerEntity)> {
        let mut state = self.state.write().await;
        let mut item = state
            .shop_items
            .get(&item_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("ShopItem", item_id))?;
        let mut player = state.player(player_id)?;
        let entries = mutation(&mut item, &mut player)?;

        let now = Utc::now();
        let purchase = ShopPurchaseEntity::new(player_id, &item, quantity, now);
        state.append_ledger(entries, now);
        state.shop_items.insert(item.id, item);
        state.shop_purchases.push(purchase.clone());
        let player = state.commit_player(player, now);
        Ok((purchase, player))
    }
}
