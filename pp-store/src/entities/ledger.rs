//! Ledger rows
//!
//! Token and diamond transactions are append-only. Every balance change made
//! through a repository mutation produces exactly one row here.

use chrono::{DateTime, NaiveDate, Utc};
use pp_core::{DiamondTransactionKind, TransactionKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pending power token row
#[derive(Debug, Clone, PartialEq)]
pub struct NewTokenTransaction {
    pub player_id: Uuid,
    pub kind: TransactionKind,
    /// Signed change, negative for debits
    pub amount: i64,
    pub balance_after: i64,
    pub counterparty_id: Option<Uuid>,
    pub description: String,
}

/// Pending diamond row
#[derive(Debug, Clone, PartialEq)]
pub struct NewDiamondTransaction {
    pub player_id: Uuid,
    pub kind: DiamondTransactionKind,
    pub amount: i64,
    pub balance_after: i64,
    pub tx_hash: Option<String>,
    pub payment_amount: Option<Decimal>,
    pub description: String,
}

/// A ledger row produced by a mutation, persisted in the same unit of work
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerEntry {
    Token(NewTokenTransaction),
    Diamond(NewDiamondTransaction),
}

impl LedgerEntry {
    pub fn with_counterparty(mut self, counterparty: Uuid) -> Self {
        if let LedgerEntry::Token(tx) = &mut self {
            tx.counterparty_id = Some(counterparty);
        }
        self
    }

    /// Attach the bridge transaction that paid for a diamond row
    pub fn with_payment(mut self, tx_hash: impl Into<String>, payment_amount: Decimal) -> Self {
        if let LedgerEntry::Diamond(tx) = &mut self {
            tx.tx_hash = Some(tx_hash.into());
            tx.payment_amount = Some(payment_amount);
        }
        self
    }

    pub fn with_tx_hash(mut self, tx_hash: impl Into<String>) -> Self {
        if let LedgerEntry::Diamond(tx) = &mut self {
            tx.tx_hash = Some(tx_hash.into());
        }
        self
    }

    pub fn player_id(&self) -> Uuid {
        match self {
            LedgerEntry::Token(tx) => tx.player_id,
            LedgerEntry::Diamond(tx) => tx.player_id,
        }
    }
}

/// Stored power token row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TokenTransactionEntity {
    pub id: Uuid,
    pub player_id: Uuid,
    pub kind: String,
    pub amount: i64,
    pub balance_after: i64,
    pub counterparty_id: Option<Uuid>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl TokenTransactionEntity {
    pub fn from_new(tx: NewTokenTransaction, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id: tx.player_id,
            kind: tx.kind.as_str().to_string(),
            amount: tx.amount,
            balance_after: tx.balance_after,
            counterparty_id: tx.counterparty_id,
            description: tx.description,
            created_at: now,
        }
    }
}

/// Stored diamond row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DiamondTransactionEntity {
    pub id: Uuid,
    pub player_id: Uuid,
    pub kind: String,
    pub amount: i64,
    pub balance_after: i64,
    pub tx_hash: Option<String>,
    pub payment_amount: Option<Decimal>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl DiamondTransactionEntity {
    pub fn from_new(tx: NewDiamondTransaction, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id: tx.player_id,
            kind: tx.kind.as_str().to_string(),
            amount: tx.amount,
            balance_after: tx.balance_after,
            tx_hash: tx.tx_hash,
            payment_amount: tx.payment_amount,
            description: tx.description,
            created_at: now,
        }
    }
}

/// Platform-wide counters for the admin dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlatformTotals {
    pub total_players: i64,
    pub active_players_24h: i64,
    pub total_power_tokens: i64,
    pub total_diamonds: i64,
    pub total_staked: i64,
    pub token_transactions: i64,
    pub diamond_transactions: i64,
    /// Sum of absolute token movements
    pub token_volume: i64,
}

/// Per-day activity for the admin dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailyActivity {
    pub day: NaiveDate,
    pub new_players: i64,
    pub token_transactions: i64,
    pub token_volume: i64,
    pub diamond_volume: i64,
}
