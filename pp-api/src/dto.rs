//! Request and response bodies
//!
//! Entities and service outcomes from `pp-store` are serialized as-is; the
//! types here cover request bodies, query strings and the few responses
//! that combine several outcomes.

use chrono::{DateTime, Utc};
use pp_core::TipKind;
use pp_store::entities::{PlayerEntity, TipDirection};
use pp_store::services::ReferralOutcome;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bridge::{ChainUserStats, TxReceipt};

// ============================================
// Common
// ============================================

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Body for purchase endpoints that take a quantity
#[derive(Debug, Default, Deserialize)]
pub struct QuantityRequest {
    pub quantity: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub total_requests: u64,
    pub components: Vec<ComponentHealth>,
}

// ============================================
// Auth
// ============================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub telegram_id: i64,
    pub username: String,
    pub referral_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created: bool,
    pub player: PlayerEntity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral: Option<ReferralOutcome>,
}

// ============================================
// Game
// ============================================

#[derive(Debug, Deserialize)]
pub struct TapRequest {
    pub taps: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub metric: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MissionProgressRequest {
    pub amount: Option<i64>,
}

// ============================================
// Economy
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Earn,
    Spend,
    Transfer,
}

#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: i64,
    pub recipient_id: Option<Uuid>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    pub player_id: Uuid,
    #[serde(default)]
    pub tokens: i64,
    #[serde(default)]
    pub diamonds: i64,
    pub reason: Option<String>,
}

// ============================================
// Diamonds
// ============================================

#[derive(Debug, Deserialize)]
pub struct DiamondPurchaseRequest {
    /// Payment in TON
    pub amount: Decimal,
    /// Defaults to the wallet on the player's profile
    pub wallet_address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DiamondSpendRequest {
    pub amount: i64,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StakeRequest {
    pub amount: i64,
    pub wallet_address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DiamondPurchaseResponse {
    pub tx: TxReceipt,
    #[serde(flatten)]
    pub purchase: pp_store::services::DiamondPurchase,
}

#[derive(Debug, Serialize)]
pub struct StakeResponse {
    pub tx: TxReceipt,
    #[serde(flatten)]
    pub outcome: pp_store::services::StakeOutcome,
}

#[derive(Debug, Serialize)]
pub struct DiamondOverview {
    #[serde(flatten)]
    pub summary: pp_store::services::DiamondSummary,
    /// What the contract reports for the player's wallet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain: Option<ChainUserStats>,
}

// ============================================
// Social
// ============================================

#[derive(Debug, Deserialize)]
pub struct CreateCommunityRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct MessagesQuery {
    pub before: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCompetitionRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub entry_fee: i64,
    #[serde(default)]
    pub prize_pool: i64,
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub score: i64,
}

#[derive(Debug, Deserialize)]
pub struct ApplyReferralRequest {
    pub code: String,
}

// ============================================
// Marketplace / tips / movement tokens
// ============================================

#[derive(Debug, Deserialize)]
pub struct CreateListingRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    pub quantity: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListingsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TipRequest {
    pub recipient_id: Uuid,
    pub amount: i64,
    #[serde(default)]
    pub kind: TipKind,
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TipsQuery {
    #[serde(default)]
    pub direction: TipDirection,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMovementTokenRequest {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub total_supply: i64,
    pub initial_price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct TokenPurchaseRequest {
    pub amount: i64,
}

// ============================================
// Habits / education / admin
// ============================================

#[derive(Debug, Deserialize)]
pub struct CreateHabitRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reward_tokens: i64,
}

#[derive(Debug, Deserialize)]
pub struct GenerateCourseRequest {
    pub topic: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    pub lesson_count: Option<usize>,
}

fn default_difficulty() -> String {
    "beginner".to_string()
}

#[derive(Debug, Default, Deserialize)]
pub struct CompleteLessonRequest {
    pub lesson_index: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DailyQuery {
    pub days: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_request_type_field() {
        let req: TransactionRequest = serde_json::from_value(serde_json::json!({
            "type": "transfer",
            "amount": 10,
            "recipient_id": Uuid::nil(),
        }))
        .unwrap();
        assert_eq!(req.kind, TransactionType::Transfer);
        assert_eq!(req.recipient_id, Some(Uuid::nil()));

        let bad = serde_json::from_value::<TransactionRequest>(serde_json::json!({
            "type": "burn",
            "amount": 10,
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_course_request_defaults() {
        let req: GenerateCourseRequest =
            serde_json::from_value(serde_json::json!({ "topic": "Voting rights" })).unwrap();
        assert_eq!(req.difficulty, "beginner");
        assert!(req.lesson_count.is_none());
    }

    #[test]
    fn test_tip_request_defaults_to_tip() {
        let req: TipRequest = serde_json::from_value(serde_json::json!({
            "recipient_id": Uuid::nil(),
            "amount": 5,
        }))
        .unwrap();
        assert_eq!(req.kind, TipKind::Tip);
    }
}
