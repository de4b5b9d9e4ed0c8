//! Movement tokens and holdings

use chrono::{DateTime, Utc};
use pp_core::{market_cap, CoreResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MovementTokenEntity {
    pub id: Uuid,
    pub symbol: String,
    pub name: String,
    pub description: String,
    pub creator_id: Uuid,
    pub total_supply: i64,
    pub circulating_supply: i64,
    /// Price in power tokens per unit
    pub price: Decimal,
    pub market_cap: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMovementToken {
    pub symbol: String,
    pub name: String,
    pub description: String,
    pub creator_id: Uuid,
    pub total_supply: i64,
    pub initial_price: Decimal,
}

impl MovementTokenEntity {
    pub fn new(new: NewMovementToken, now: DateTime<Utc>) -> CoreResult<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            market_cap: market_cap(new.initial_price, new.total_supply)?,
            symbol: new.symbol,
            name: new.name,
            description: new.description,
            creator_id: new.creator_id,
            total_supply: new.total_supply,
            circulating_supply: 0,
            price: new.initial_price,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn remaining_supply(&self) -> i64 {
        self.total_supply - self.circulating_supply
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TokenHoldingEntity {
    pub player_id: Uuid,
    pub token_id: Uuid,
    pub amount: i64,
    pub updated_at: DateTime<Utc>,
}
