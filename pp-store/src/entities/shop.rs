//! Shop rows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShopItemEntity {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// power_tokens | diamonds
    pub currency: String,
    pub price: i64,
    /// None means unlimited
    pub stock: Option<i64>,
    /// energy_refill | energy_capacity | influence | cosmetic
    pub effect: String,
    pub effect_value: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewShopItem {
    pub name: String,
    pub description: String,
    pub currency: String,
    pub price: i64,
    pub stock: Option<i64>,
    pub effect: String,
    pub effect_value: i64,
}

impl ShopItemEntity {
    pub fn new(new: NewShopItem, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            currency: new.currency,
            price: new.price,
            stock: new.stock,
            effect: new.effect,
            effect_value: new.effect_value,
            is_active: true,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShopPurchaseEntity {
    pub id: Uuid,
    pub player_id: Uuid,
    pub item_id: Uuid,
    pub currency: String,
    pub quantity: i64,
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
}

impl ShopPurchaseEntity {
    pub fn new(player_id: Uuid, item: &ShopItemEntity, quantity: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id,
            item_id: item.id,
            currency: item.currency.clone(),
            quantity,
            total_price: item.price.saturating_mul(quantity),
            created_at: now,
        }
    }
}
