//! PostgreSQL backend
//!
//! Each mutation runs in one transaction. Rows that a closure will change
//! are read with `SELECT ... FOR UPDATE`; when two players are involved they
//! are locked in id order so concurrent transfers cannot deadlock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::entities::{
    DiamondTransactionEntity, LedgerEntry, PlayerEntity, TokenTransactionEntity,
};
use crate::error::{StoreError, StoreResult};
use crate::repos::Store;
use crate::schema::PP_SCHEMA;

mod game;
mod growth;
mod market;
mod players;
mod social;

/// Default pool size
pub const DEFAULT_MAX_CONNECTIONS: u32 = 20;

/// Pool settings
#[derive(Debug, Clone)]
pub struct PgConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl PgConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}

/// PostgreSQL store
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &PgConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await?;
        info!(max_connections = config.max_connections, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create every table and index that does not exist yet
    pub async fn init_schema(&self) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for statement in PP_SCHEMA {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        info!(statements = PP_SCHEMA.len(), "Schema initialized");
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// ==================== shared row helpers ====================

pub(crate) async fn lock_player(conn: &mut PgConnection, id: Uuid) -> StoreResult<PlayerEntity> {
    sqlx::query_as::<_, PlayerEntity>("SELECT * FROM players WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| StoreError::not_found("Player", id))
}

/// Lock two players in id order, returned in argument order
pub(crate) async fn lock_pair(
    conn: &mut PgConnection,
    first: Uuid,
    second: Uuid,
) -> StoreResult<(PlayerEntity, PlayerEntity)> {
    if first == second {
        return Err(StoreError::validation("a player cannot trade with themselves"));
    }
    if first < second {
        let a = lock_player(conn, first).await?;
        let b = lock_player(conn, second).await?;
        Ok((a, b))
    } else {
        let b = lock_player(conn, second).await?;
        let a = lock_player(conn, first).await?;
        Ok((a, b))
    }
}

pub(crate) async fn save_player(
    conn: &mut PgConnection,
    player: &PlayerEntity,
    now: DateTime<Utc>,
) -> StoreResult<PlayerEntity> {
    let saved = sqlx::query_as::<_, PlayerEntity>(
        r#"UPDATE players SET
            username = $2,
            display_name = $3,
            referred_by = $4,
            level = $5,
            experience = $6,
            influence = $7,
            power_tokens = $8,
            diamonds = $9,
            diamonds_staked = $10,
            diamond_tier = $11,
            wallet_address = $12,
            energy = $13,
            max_energy = $14,
            energy_updated_at = $15,
            total_taps = $16,
            last_daily_login = $17,
            is_admin = $18,
            last_active_at = $19,
            updated_at = $20
        WHERE id = $1
        RETURNING *"#,
    )
    .bind(player.id)
    .bind(&player.username)
    .bind(&player.display_name)
    .bind(player.referred_by)
    .bind(player.level)
    .bind(player.experience)
    .bind(player.influence)
    .bind(player.power_tokens)
    .bind(player.diamonds)
    .bind(player.diamonds_staked)
    .bind(&player.diamond_tier)
    .bind(&player.wallet_address)
    .bind(player.energy)
    .bind(player.max_energy)
    .bind(player.energy_updated_at)
    .bind(player.total_taps)
    .bind(player.last_daily_login)
    .bind(player.is_admin)
    .bind(player.last_active_at)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(saved)
}

pub(crate) async fn insert_ledger(
    conn: &mut PgConnection,
    entries: Vec<LedgerEntry>,
    now: DateTime<Utc>,
) -> StoreResult<()> {
    for entry in entries {
        match entry {
            LedgerEntry::Token(tx) => {
                let row = TokenTransactionEntity::from_new(tx, now);
                sqlx::query(
                    r#"INSERT INTO token_transactions
                        (id, player_id, kind, amount, balance_after, counterparty_id, description, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
                )
                .bind(row.id)
                .bind(row.player_id)
                .bind(&row.kind)
                .bind(row.amount)
                .bind(row.balance_after)
                .bind(row.counterparty_id)
                .bind(&row.description)
                .bind(row.created_at)
                .execute(&mut *conn)
                .await?;
            }
            LedgerEntry::Diamond(tx) => {
                let row = DiamondTransactionEntity::from_new(tx, now);
                sqlx::query(
                    r#"INSERT INTO diamond_transactions
                        (id, player_id, kind, amount, balance_after, tx_hash, payment_amount, description, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"#,
                )
                .bind(row.id)
                .bind(row.player_id)
                .bind(&row.kind)
                .bind(row.amount)
                .bind(row.balance_after)
                .bind(&row.tx_hash)
                .bind(row.payment_amount)
                .bind(&row.description)
                .bind(row.created_at)
                .execute(&mut *conn)
                .await?;
            }
        }
    }
    Ok(())
}
