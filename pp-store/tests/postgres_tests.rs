//! PostgreSQL backend tests
//!
//! These run against a live database and are skipped unless
//! `PP_TEST_DATABASE_URL` points at one, e.g.
//!
//! ```text
//! PP_TEST_DATABASE_URL=postgres://localhost/pp_test cargo test -p pp-store --test postgres_tests
//! ```
//!
//! Every test creates its own players with fresh telegram ids, so the
//! database can be reused between runs.

use chrono::{Duration, Utc};
use pp_core::{CoreError, GameConfig, LeaderboardMetric, TipKind};
use pp_store::entities::{
    NewBadge, NewCompetition, NewHabit, NewListing, NewMission, NewMovementToken, NewShopItem,
    PlayerEntity, TipDirection,
};
use pp_store::{PgConfig, PgStore, Services, StoreError};
use rust_decimal_macros::dec;
use std::sync::{Arc, OnceLock};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Serializes DDL; concurrent `CREATE TABLE IF NOT EXISTS` can collide in the catalog
fn schema_lock() -> &'static Mutex<bool> {
    static SCHEMA: OnceLock<Mutex<bool>> = OnceLock::new();
    SCHEMA.get_or_init(|| Mutex::new(false))
}

async fn pg_store() -> Option<PgStore> {
    let url = match std::env::var("PP_TEST_DATABASE_URL") {
        Ok(url) if !url.is_empty() => url,
        _ => {
            eprintln!("PP_TEST_DATABASE_URL not set, skipping");
            return None;
        }
    };
    let store = PgStore::connect(&PgConfig::new(url).with_max_connections(5))
        .await
        .expect("connect to test database");

    let mut ready = schema_lock().lock().await;
    if !*ready {
        store.init_schema().await.expect("init schema");
        *ready = true;
    }
    Some(store)
}

fn services(store: &PgStore) -> Services {
    Services::new(Arc::new(store.clone()), GameConfig::default())
}

fn unique_telegram_id() -> i64 {
    (Uuid::new_v4().as_u128() as i64) & i64::MAX
}

fn unique_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

async fn player(services: &Services, tokens: i64) -> PlayerEntity {
    let login = services
        .game
        .login(unique_telegram_id(), "pg-tester")
        .await
        .unwrap();
    assert!(login.created);
    if tokens > 0 {
        services
            .economy
            .admin_grant(login.player.id, tokens, 0, "seed")
            .await
            .unwrap();
    }
    services.game.get_player(login.player.id).await.unwrap()
}

#[tokio::test]
async fn test_init_schema_is_idempotent() {
    let Some(store) = pg_store().await else { return };

    {
        let _guard = schema_lock().lock().await;
        store.init_schema().await.unwrap();
        store.init_schema().await.unwrap();
    }

    let tables: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM information_schema.tables
         WHERE table_schema = current_schema()
           AND table_name IN ('players', 'token_transactions', 'diamond_transactions', 'movement_tokens')",
    )
    .fetch_one(store.pool())
    .await
    .unwrap();
    assert_eq!(tables, 4);
}

#[tokio::test]
async fn test_transfer_commits_and_overdraft_rolls_back() {
    let Some(store) = pg_store().await else { return };
    let services = services(&store);
    let alice = player(&services, 100).await;
    let bob = player(&services, 0).await;

    let outcome = services
        .economy
        .transfer(alice.id, bob.id, 40, "rent")
        .await
        .unwrap();
    assert_eq!(outcome.sender.power_tokens, 60);
    assert_eq!(outcome.recipient.power_tokens, 40);

    let err = services
        .economy
        .transfer(alice.id, bob.id, 61, "too much")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Rule(CoreError::InsufficientFunds { .. })));

    // nothing from the failed transfer was written
    assert_eq!(services.economy.balance(alice.id).await.unwrap().power_tokens, 60);
    assert_eq!(services.economy.balance(bob.id).await.unwrap().power_tokens, 40);
    let history = services.economy.history(alice.id, None).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].amount, -40);
    assert_eq!(history[0].balance_after, 60);
    assert_eq!(history[0].counterparty_id, Some(bob.id));
}

#[tokio::test]
async fn test_concurrent_overdraft_transfers_at_most_one_succeeds() {
    let Some(store) = pg_store().await else { return };
    let services = services(&store);
    let alice = player(&services, 100).await;
    let bob = player(&services, 0).await;
    let carol = player(&services, 0).await;

    let economy = services.economy.clone();
    let to_bob = tokio::spawn({
        let economy = economy.clone();
        async move { economy.transfer(alice.id, bob.id, 80, "").await }
    });
    let to_carol = tokio::spawn({
        let economy = economy.clone();
        async move { economy.transfer(alice.id, carol.id, 80, "").await }
    });
    let results = [to_bob.await.unwrap(), to_carol.await.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(economy.balance(alice.id).await.unwrap().power_tokens, 20);
    let credited = economy.balance(bob.id).await.unwrap().power_tokens
        + economy.balance(carol.id).await.unwrap().power_tokens;
    assert_eq!(credited, 80);
}

#[tokio::test]
async fn test_opposing_transfers_do_not_deadlock() {
    let Some(store) = pg_store().await else { return };
    let services = services(&store);
    let alice = player(&services, 100).await;
    let bob = player(&services, 100).await;

    let economy = services.economy.clone();
    let mut handles = Vec::new();
    for i in 0..10 {
        let economy = economy.clone();
        let (from, to) = if i % 2 == 0 { (alice.id, bob.id) } else { (bob.id, alice.id) };
        handles.push(tokio::spawn(async move { economy.transfer(from, to, 5, "").await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let total = economy.balance(alice.id).await.unwrap().power_tokens
        + economy.balance(bob.id).await.unwrap().power_tokens;
    assert_eq!(total, 200);
}

#[tokio::test]
async fn test_game_repository_round_trip() {
    let Some(store) = pg_store().await else { return };
    let services = services(&store);
    let p = player(&services, 0).await;

    let tap = services.game.tap(p.id, 10).await.unwrap();
    assert_eq!(tap.taps_applied, 10);
    assert_eq!(tap.player.total_taps, 10);

    let daily = services.game.daily_login(p.id).await.unwrap();
    assert!(daily.player.power_tokens > tap.player.power_tokens);
    assert!(matches!(
        services.game.daily_login(p.id).await,
        Err(StoreError::Rule(CoreError::AlreadyCompleted(_)))
    ));

    let mission = services
        .game
        .create_mission(NewMission {
            title: format!("Tap {}", unique_suffix()),
            description: "Tap once".to_string(),
            cadence: "once".to_string(),
            target: 1,
            reward_tokens: 5,
            reward_experience: 0,
            reward_influence: 1,
        })
        .await
        .unwrap();
    services
        .game
        .record_mission_progress(p.id, mission.id, 1)
        .await
        .unwrap();
    let claim = services.game.claim_mission(p.id, mission.id).await.unwrap();
    assert_eq!(claim.player.influence, p.influence + 1);

    let badge = services
        .game
        .create_badge(NewBadge {
            code: format!("pg-{}", unique_suffix()),
            name: "Tester".to_string(),
            description: "Tapped in a test".to_string(),
            requirement: "total_taps".to_string(),
            threshold: 1,
        })
        .await
        .unwrap();
    services.game.evaluate_badges(p.id).await.unwrap();
    let earned = services.game.player_badges(p.id).await.unwrap();
    assert!(earned.iter().any(|b| b.badge_id == badge.id));

    let board = services
        .game
        .leaderboard(LeaderboardMetric::PowerTokens, Some(20))
        .await
        .unwrap();
    assert!(board.windows(2).all(|w| w[0].value >= w[1].value));
}

#[tokio::test]
async fn test_shop_and_diamond_ledger() {
    let Some(store) = pg_store().await else { return };
    let services = services(&store);
    let p = player(&services, 500).await;

    let item = services
        .economy
        .create_shop_item(NewShopItem {
            name: format!("Megaphone {}", unique_suffix()),
            description: "More influence".to_string(),
            currency: "power_tokens".to_string(),
            price: 100,
            stock: Some(1),
            effect: "influence".to_string(),
            effect_value: 3,
        })
        .await
        .unwrap();
    let bought = services.economy.purchase_item(p.id, item.id, 1).await.unwrap();
    assert_eq!(bought.player.power_tokens, 400);
    assert!(matches!(
        services.economy.purchase_item(p.id, item.id, 1).await,
        Err(StoreError::Rule(CoreError::SupplyExceeded { .. }))
    ));

    let purchase = services
        .diamonds
        .purchase(p.id, dec!(2), "0xpgtest")
        .await
        .unwrap();
    assert_eq!(purchase.diamonds_credited, 200);
    let diamonds = services.diamonds.history(p.id, None).await.unwrap();
    assert_eq!(diamonds[0].balance_after, 200);
}

#[tokio::test]
async fn test_competition_finalize_pays_leader() {
    let Some(store) = pg_store().await else { return };
    let services = services(&store);
    let creator = player(&services, 0).await;
    let alice = player(&services, 100).await;
    let bob = player(&services, 100).await;

    let now = Utc::now();
    let comp = services
        .social
        .create_competition(
            NewCompetition {
                name: format!("Sprint {}", unique_suffix()),
                description: "Most taps wins".to_string(),
                creator_id: creator.id,
                starts_at: now - Duration::seconds(10),
                ends_at: now + Duration::hours(1),
                entry_fee: 25,
                prize_pool: 0,
            },
            false,
        )
        .await
        .unwrap();
    services.social.join_competition(comp.id, alice.id).await.unwrap();
    services.social.join_competition(comp.id, bob.id).await.unwrap();
    services.social.submit_score(comp.id, alice.id, 5).await.unwrap();
    services.social.submit_score(comp.id, bob.id, 9).await.unwrap();

    sqlx::query("UPDATE competitions SET starts_at = $2, ends_at = $3 WHERE id = $1")
        .bind(comp.id)
        .bind(now - Duration::hours(2))
        .bind(now - Duration::hours(1))
        .execute(store.pool())
        .await
        .unwrap();

    let done = services
        .social
        .finalize_competition(comp.id, creator.id, false)
        .await
        .unwrap();
    assert_eq!(done.winner_id, Some(bob.id));
    assert_eq!(services.social.get_player(bob.id).await.unwrap().power_tokens, 75 + 50);
    assert!(matches!(
        services.social.finalize_competition(comp.id, creator.id, false).await,
        Err(StoreError::Rule(CoreError::AlreadyCompleted(_)))
    ));
}

#[tokio::test]
async fn test_community_chat_and_referral() {
    let Some(store) = pg_store().await else { return };
    let services = services(&store);
    let owner = player(&services, 0).await;
    let friend = player(&services, 0).await;

    let community = services
        .social
        .create_community(owner.id, &format!("Rivers {}", unique_suffix()), "Cleanups")
        .await
        .unwrap();
    services.social.join_community(community.id, friend.id).await.unwrap();
    services
        .social
        .post_message(community.id, friend.id, "hello")
        .await
        .unwrap();
    let messages = services
        .social
        .messages(community.id, owner.id, None, None)
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(services.social.members(community.id, None).await.unwrap().len(), 2);

    let outcome = services
        .social
        .apply_referral(friend.id, &owner.referral_code)
        .await
        .unwrap();
    assert_eq!(outcome.referrer_id, owner.id);
    assert_eq!(services.social.referrals(owner.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_marketplace_tips_and_tokens() {
    let Some(store) = pg_store().await else { return };
    let services = services(&store);
    let seller = player(&services, 0).await;
    let buyer = player(&services, 1_000).await;

    let listing = services
        .marketplace
        .create_listing(NewListing {
            seller_id: seller.id,
            title: "Poster".to_string(),
            description: "Signed".to_string(),
            price: 30,
            quantity: 2,
        })
        .await
        .unwrap();
    let bought = services.marketplace.purchase(listing.id, buyer.id, 2).await.unwrap();
    assert_eq!(bought.buyer.power_tokens, 940);
    assert_eq!(bought.listing.quantity, 0);
    assert_eq!(services.marketplace.purchases(buyer.id, None).await.unwrap().len(), 1);

    services
        .tips
        .send(buyer.id, seller.id, 10, TipKind::Tip, Some("thanks".to_string()))
        .await
        .unwrap();
    let received = services
        .tips
        .list(seller.id, TipDirection::Received, None)
        .await
        .unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(services.game.get_player(seller.id).await.unwrap().power_tokens, 70);

    let token = services
        .tokens
        .create(NewMovementToken {
            symbol: format!("T{}", &unique_suffix()[..6]),
            name: "Clean Rivers".to_string(),
            description: "River cleanup movement".to_string(),
            creator_id: seller.id,
            total_supply: 1000,
            initial_price: dec!(2.00),
        })
        .await
        .unwrap();
    let purchase = services.tokens.purchase(token.id, buyer.id, 100).await.unwrap();
    assert_eq!(purchase.quote.cost_tokens, 200);
    assert_eq!(purchase.token.price, dec!(2.02));
    assert_eq!(purchase.token.market_cap, dec!(2020));
    assert_eq!(services.tokens.holdings(buyer.id).await.unwrap()[0].amount, 100);
}

#[tokio::test]
async fn test_habits_courses_and_analytics() {
    let Some(store) = pg_store().await else { return };
    let services = services(&store);
    let p = player(&services, 0).await;

    let habit = services
        .habits
        .create(NewHabit {
            player_id: p.id,
            name: "Walk".to_string(),
            description: "Daily walk".to_string(),
            reward_tokens: 5,
        })
        .await
        .unwrap();
    let done = services.habits.complete(habit.id, p.id).await.unwrap();
    assert_eq!(done.habit.current_streak, 1);
    assert!(matches!(
        services.habits.complete(habit.id, p.id).await,
        Err(StoreError::Rule(CoreError::AlreadyCompleted(_)))
    ));

    let course = services
        .education
        .generate_course(p.id, "Climate", "beginner", Some(2))
        .await
        .unwrap();
    services.education.enroll(course.id, p.id).await.unwrap();
    let lesson = services
        .education
        .complete_lesson(course.id, p.id, None)
        .await
        .unwrap();
    assert_eq!(lesson.lesson_index, 0);
    assert_eq!(services.education.enrollments(p.id).await.unwrap().len(), 1);

    let overview = services.analytics.overview().await.unwrap();
    assert_eq!(overview.backend, "postgres");
    assert!(overview.totals.total_players >= 1);

    let today = Utc::now().date_naive();
    let daily = services.analytics.daily(1).await.unwrap();
    let row = daily.iter().find(|d| d.day == today).expect("row for today");
    assert!(row.new_players >= 1);
    assert!(row.token_transactions >= 1);
}
