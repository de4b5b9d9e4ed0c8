//! Marketplace listings, purchases and tips

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ListingEntity {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub description: String,
    /// Unit price in power tokens
    pub price: i64,
    pub quantity: i64,
    /// active | sold | cancelled
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewListing {
    pub seller_id: Uuid,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub quantity: i64,
}

impl ListingEntity {
    pub fn new(new: NewListing, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            seller_id: new.seller_id,
            title: new.title,
            description: new.description,
            price: new.price,
            quantity: new.quantity,
            status: pp_core::ListingStatus::Active.as_str().to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == pp_core::ListingStatus::Active.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MarketplacePurchaseEntity {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub quantity: i64,
    pub unit_price: i64,
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
}

impl MarketplacePurchaseEntity {
    pub fn new(listing: &ListingEntity, buyer_id: Uuid, quantity: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            listing_id: listing.id,
            buyer_id,
            seller_id: listing.seller_id,
            quantity,
            unit_price: listing.price,
            total_price: listing.price.saturating_mul(quantity),
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TipEntity {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub amount: i64,
    /// tip | gift
    pub kind: String,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTip {
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub amount: i64,
    pub kind: String,
    pub message: Option<String>,
}

impl TipEntity {
    pub fn new(new: NewTip, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_id: new.sender_id,
            recipient_id: new.recipient_id,
            amount: new.amount,
            kind: new.kind,
            message: new.message,
            created_at: now,
        }
    }
}

/// Which side of a tip to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipDirection {
    Sent,
    Received,
    #[default]
    All,
}
