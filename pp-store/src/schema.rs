//! PostgreSQL schema for People Power
//!
//! Statements are idempotent so `init_schema` can run on every deploy.

/// Complete schema, one statement per entry
pub const PP_SCHEMA: &[&str] = &[
    // ============================================
    // Players
    // ============================================
    r#"CREATE TABLE IF NOT EXISTS players (
        id UUID PRIMARY KEY,
        telegram_id BIGINT NOT NULL UNIQUE,
        username TEXT NOT NULL,
        display_name TEXT,
        referral_code TEXT NOT NULL UNIQUE,
        referred_by UUID REFERENCES players(id),
        level INTEGER NOT NULL DEFAULT 1,
        experience BIGINT NOT NULL DEFAULT 0 CHECK (experience >= 0),
        influence BIGINT NOT NULL DEFAULT 0,
        power_tokens BIGINT NOT NULL DEFAULT 0 CHECK (power_tokens >= 0),
        diamonds BIGINT NOT NULL DEFAULT 0 CHECK (diamonds >= 0),
        diamonds_staked BIGINT NOT NULL DEFAULT 0 CHECK (diamonds_staked >= 0),
        diamond_tier TEXT NOT NULL DEFAULT 'none',
        wallet_address TEXT,
        energy BIGINT NOT NULL,
        max_energy BIGINT NOT NULL,
        energy_updated_at TIMESTAMPTZ NOT NULL,
        total_taps BIGINT NOT NULL DEFAULT 0,
        last_daily_login DATE,
        is_admin BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        last_active_at TIMESTAMPTZ NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_players_power_tokens ON players (power_tokens DESC)",
    "CREATE INDEX IF NOT EXISTS idx_players_experience ON players (experience DESC)",
    "CREATE INDEX IF NOT EXISTS idx_players_influence ON players (influence DESC)",
    // ============================================
    // Ledger
    // ============================================
    r#"CREATE TABLE IF NOT EXISTS token_transactions (
        id UUID PRIMARY KEY,
        player_id UUID NOT NULL REFERENCES players(id),
        kind TEXT NOT NULL,
        amount BIGINT NOT NULL,
        balance_after BIGINT NOT NULL,
        counterparty_id UUID REFERENCES players(id),
        description TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_token_tx_player ON token_transactions (player_id, created_at DESC)",
    r#"CREATE TABLE IF NOT EXISTS diamond_transactions (
        id UUID PRIMARY KEY,
        player_id UUID NOT NULL REFERENCES players(id),
        kind TEXT NOT NULL,
        amount BIGINT NOT NULL,
        balance_after BIGINT NOT NULL,
        tx_hash TEXT,
        payment_amount NUMERIC(30, 9),
        description TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_diamond_tx_player ON diamond_transactions (player_id, created_at DESC)",
    // ============================================
    // Missions and badges
    // ============================================
    r#"CREATE TABLE IF NOT EXISTS missions (
        id UUID PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        cadence TEXT NOT NULL CHECK (cadence IN ('once', 'daily', 'weekly')),
        target BIGINT NOT NULL CHECK (target > 0),
        reward_tokens BIGINT NOT NULL DEFAULT 0,
        reward_experience BIGINT NOT NULL DEFAULT 0,
        reward_influence BIGINT NOT NULL DEFAULT 0,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS mission_progress (
        player_id UUID NOT NULL REFERENCES players(id),
        mission_id UUID NOT NULL REFERENCES missions(id),
        period_key TEXT NOT NULL,
        progress BIGINT NOT NULL DEFAULT 0,
        completed_at TIMESTAMPTZ,
        claimed_at TIMESTAMPTZ,
        updated_at TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (player_id, mission_id, period_key)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS badges (
        id UUID PRIMARY KEY,
        code TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        requirement TEXT NOT NULL,
        threshold BIGINT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS player_badges (
        player_id UUID NOT NULL REFERENCES players(id),
        badge_id UUID NOT NULL REFERENCES badges(id),
        awarded_at TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (player_id, badge_id)
    )"#,
    // ============================================
    // Shop
    // ============================================
    r#"CREATE TABLE IF NOT EXISTS shop_items (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        currency TEXT NOT NULL CHECK (currency IN ('power_tokens', 'diamonds')),
        price BIGINT NOT NULL CHECK (price >= 0),
        stock BIGINT CHECK (stock >= 0),
        effect TEXT NOT NULL,
        effect_value BIGINT NOT NULL DEFAULT 0,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS shop_purchases (
        id UUID PRIMARY KEY,
        player_id UUID NOT NULL REFERENCES players(id),
        item_id UUID NOT NULL REFERENCES shop_items(id),
        currency TEXT NOT NULL,
        quantity BIGINT NOT NULL,
        total_price BIGINT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )"#,
    // ============================================
    // Social
    // ============================================
    r#"CREATE TABLE IF NOT EXISTS communities (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        owner_id UUID NOT NULL REFERENCES players(id),
        member_count BIGINT NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL
    )"#,
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_communities_name ON communities (LOWER(name))",
    r#"CREATE TABLE IF NOT EXISTS community_members (
        community_id UUID NOT NULL REFERENCES communities(id),
        player_id UUID NOT NULL REFERENCES players(id),
        role TEXT NOT NULL,
        joined_at TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (community_id, player_id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS chat_messages (
        id UUID PRIMARY KEY,
        community_id UUID NOT NULL REFERENCES communities(id),
        player_id UUID NOT NULL REFERENCES players(id),
        content TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_chat_messages_community ON chat_messages (community_id, created_at DESC)",
    r#"CREATE TABLE IF NOT EXISTS competitions (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        creator_id UUID NOT NULL REFERENCES players(id),
        starts_at TIMESTAMPTZ NOT NULL,
        ends_at TIMESTAMPTZ NOT NULL,
        entry_fee BIGINT NOT NULL DEFAULT 0,
        prize_pool BIGINT NOT NULL DEFAULT 0,
        winner_id UUID REFERENCES players(id),
        finalized_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL,
        CHECK (ends_at > starts_at)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS competition_entries (
        competition_id UUID NOT NULL REFERENCES competitions(id),
        player_id UUID NOT NULL REFERENCES players(id),
        score BIGINT NOT NULL DEFAULT 0,
        joined_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (competition_id, player_id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS referrals (
        referee_id UUID PRIMARY KEY REFERENCES players(id),
        referrer_id UUID NOT NULL REFERENCES players(id),
        referrer_reward BIGINT NOT NULL,
        referee_reward BIGINT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_referrals_referrer ON referrals (referrer_id)",
    // ============================================
    // Marketplace and tips
    // ============================================
    r#"CREATE TABLE IF NOT EXISTS marketplace_listings (
        id UUID PRIMARY KEY,
        seller_id UUID NOT NULL REFERENCES players(id),
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        price BIGINT NOT NULL CHECK (price > 0),
        quantity BIGINT NOT NULL CHECK (quantity >= 0),
        status TEXT NOT NULL CHECK (status IN ('active', 'sold', 'cancelled')),
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS marketplace_purchases (
        id UUID PRIMARY KEY,
        listing_id UUID NOT NULL REFERENCES marketplace_listings(id),
        buyer_id UUID NOT NULL REFERENCES players(id),
        seller_id UUID NOT NULL REFERENCES players(id),
        quantity BIGINT NOT NULL,
        unit_price BIGINT NOT NULL,
        total_price BIGINT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS tips (
        id UUID PRIMARY KEY,
        sender_id UUID NOT NULL REFERENCES players(id),
        recipient_id UUID NOT NULL REFERENCES players(id),
        amount BIGINT NOT NULL CHECK (amount > 0),
        kind TEXT NOT NULL CHECK (kind IN ('tip', 'gift')),
        message TEXT,
        created_at TIMESTAMPTZ NOT NULL,
        CHECK (sender_id <> recipient_id)
    )"#,
    // ============================================
    // Movement tokens
    // ============================================
    r#"CREATE TABLE IF NOT EXISTS movement_tokens (
        id UUID PRIMARY KEY,
        symbol TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        creator_id UUID NOT NULL REFERENCES players(id),
        total_supply BIGINT NOT NULL CHECK (total_supply > 0),
        circulating_supply BIGINT NOT NULL DEFAULT 0 CHECK (circulating_supply <= total_supply),
        price NUMERIC(30, 8) NOT NULL,
        market_cap NUMERIC(40, 8) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )"#,
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_movement_tokens_symbol ON movement_tokens (UPPER(symbol))",
    r#"CREATE TABLE IF NOT EXISTS token_holdings (
        player_id UUID NOT NULL REFERENCES players(id),
        token_id UUID NOT NULL REFERENCES movement_tokens(id),
        amount BIGINT NOT NULL DEFAULT 0,
        updated_at TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (player_id, token_id)
    )"#,
    // ============================================
    // Habits and courses
    // ============================================
    r#"CREATE TABLE IF NOT EXISTS habits (
        id UUID PRIMARY KEY,
        player_id UUID NOT NULL REFERENCES players(id),
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        reward_tokens BIGINT NOT NULL DEFAULT 0,
        current_streak INTEGER NOT NULL DEFAULT 0,
        longest_streak INTEGER NOT NULL DEFAULT 0,
        last_completed DATE,
        total_completions BIGINT NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_habits_player ON habits (player_id)",
    r#"CREATE TABLE IF NOT EXISTS courses (
        id UUID PRIMARY KEY,
        creator_id UUID NOT NULL REFERENCES players(id),
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        topic TEXT NOT NULL,
        difficulty TEXT NOT NULL,
        lessons JSONB NOT NULL,
        estimated_minutes INTEGER NOT NULL,
        reward_tokens BIGINT NOT NULL,
        reward_experience BIGINT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS course_enrollments (
        course_id UUID NOT NULL REFERENCES courses(id),
        player_id UUID NOT NULL REFERENCES players(id),
        completed_lessons INTEGER NOT NULL DEFAULT 0,
        completed_at TIMESTAMPTZ,
        enrolled_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (course_id, player_id)
    )"#,
];

/// Tables in dependency order, children first
pub const PP_TABLES: &[&str] = &[
    "course_enrollments",
    "courses",
    "habits",
    "token_holdings",
    "movement_tokens",
    "tips",
    "marketplace_purchases",
    "marketplace_listings",
    "referrals",
    "competition_entries",
    "competitions",
    "chat_messages",
    "community_members",
    "communities",
    "shop_purchases",
    "shop_items",
    "player_badges",
    "badges",
    "mission_progress",
    "missions",
    "diamond_transactions",
    "token_transactions",
    "players",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_is_created() {
        for table in PP_TABLES {
            let ddl = format!("CREATE TABLE IF NOT EXISTS {} (", table);
            assert!(
                PP_SCHEMA.iter().any(|stmt| stmt.starts_with(&ddl)),
                "missing DDL for {}",
                table
            );
        }
    }

    #[test]
    fn test_statements_are_idempotent() {
        for stmt in PP_SCHEMA {
            assert!(stmt.contains("IF NOT EXISTS"), "not idempotent: {}", stmt);
        }
    }
}
