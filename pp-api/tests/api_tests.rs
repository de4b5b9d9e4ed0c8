//! Integration tests for the People Power API
//!
//! Each test runs the full router over the in-memory store.

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use pp_api::{build_app, roles_for, ApiConfig, AppState, JwtConfig};
use serde_json::{json, Value};
use uuid::Uuid;

const SECRET: &str = "integration-test-secret-long-enough";

fn create_test_state() -> AppState {
    let jwt = JwtConfig::try_new(SECRET, 3600).unwrap();
    AppState::in_memory(ApiConfig::default(), jwt)
}

/// Test server plus a token carrying the admin role
fn create_test_server() -> (TestServer, String) {
    let state = create_test_state();
    let admin = state
        .jwt
        .issue(Uuid::new_v4(), 0, roles_for(true))
        .unwrap()
        .token;
    (TestServer::new(build_app(state)).unwrap(), admin)
}

fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("authorization"),
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}

/// Log in and return (token, player id)
async fn login(server: &TestServer, telegram_id: i64, username: &str) -> (String, Uuid) {
    let response = server
        .post("/api/v1/auth/login")
        .json(&json!({ "telegram_id": telegram_id, "username": username }))
        .await;
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    let token = body["data"]["token"].as_str().unwrap().to_string();
    let id = body["data"]["player"]["id"].as_str().unwrap().parse().unwrap();
    (token, id)
}

async fn grant_tokens(server: &TestServer, admin: &str, player_id: Uuid, tokens: i64) {
    let (name, value) = bearer(admin);
    server
        .post("/api/v1/admin/grant")
        .add_header(name, value)
        .json(&json!({ "player_id": player_id, "tokens": tokens }))
        .await
        .assert_status_ok();
}

// ============ Health / Auth ============

#[tokio::test]
async fn test_health_check() {
    let (server, _) = create_test_server();

    let response = server.get("/api/v1/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");
}

#[tokio::test]
async fn test_login_registers_then_logs_in() {
    let (server, _) = create_test_server();

    let first = server
        .post("/api/v1/auth/login")
        .json(&json!({ "telegram_id": 1001, "username": "alice" }))
        .await;
    first.assert_status(StatusCode::CREATED);
    let body: Value = first.json();
    assert_eq!(body["data"]["created"], true);
    assert_eq!(body["message"], "Player registered");

    let second = server
        .post("/api/v1/auth/login")
        .json(&json!({ "telegram_id": 1001, "username": "alice" }))
        .await;
    second.assert_status_ok();
    let body: Value = second.json();
    assert_eq!(body["data"]["created"], false);
}

#[tokio::test]
async fn test_login_with_referral_code_rewards_both() {
    let (server, _) = create_test_server();
    let (alice_token, _) = login(&server, 1, "alice").await;

    let (name, value) = bearer(&alice_token);
    let me: Value = server.get("/api/v1/players/me").add_header(name, value).await.json();
    let code = me["data"]["referral_code"].as_str().unwrap().to_string();

    let response = server
        .post("/api/v1/auth/login")
        .json(&json!({ "telegram_id": 2, "username": "bob", "referral_code": code }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["player"]["power_tokens"], 250);
    assert!(body["data"]["referral"].is_object());
}

#[tokio::test]
async fn test_missing_and_bad_tokens_are_rejected() {
    let (server, _) = create_test_server();

    let response = server.get("/api/v1/players/me").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (name, value) = bearer("not-a-jwt");
    server
        .get("/api/v1/players/me")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let (server, _) = create_test_server();
    let (token, _) = login(&server, 7, "mallory").await;

    let (name, value) = bearer(&token);
    let response = server.get("/api/v1/admin/players").add_header(name, value).await;

    response.assert_status(StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["code"], "FORBIDDEN");
}

// ============ Game ============

#[tokio::test]
async fn test_tap_earns_tokens() {
    let (server, _) = create_test_server();
    let (token, _) = login(&server, 10, "tapper").await;

    let (name, value) = bearer(&token);
    let response = server
        .post("/api/v1/game/tap")
        .add_header(name, value)
        .json(&json!({ "taps": 10 }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["tokens_earned"], 10);
    assert_eq!(body["data"]["player"]["power_tokens"], 10);
}

#[tokio::test]
async fn test_invalid_tap_count_is_validation_error() {
    let (server, _) = create_test_server();
    let (token, _) = login(&server, 11, "zero").await;

    let (name, value) = bearer(&token);
    let response = server
        .post("/api/v1/game/tap")
        .add_header(name, value)
        .json(&json!({ "taps": 0 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_daily_login_once_per_day() {
    let (server, _) = create_test_server();
    let (token, _) = login(&server, 12, "daily").await;

    let (name, value) = bearer(&token);
    server
        .post("/api/v1/game/daily-login")
        .add_header(name.clone(), value.clone())
        .await
        .assert_status_ok();

    let response = server.post("/api/v1/game/daily-login").add_header(name, value).await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_leaderboard_rejects_unknown_metric() {
    let (server, _) = create_test_server();
    let (token, _) = login(&server, 13, "ranked").await;

    let (name, value) = bearer(&token);
    server
        .get("/api/v1/game/leaderboard?metric=power_tokens")
        .add_header(name.clone(), value.clone())
        .await
        .assert_status_ok();

    server
        .get("/api/v1/game/leaderboard?metric=shoe_size")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

// ============ Economy ============

#[tokio::test]
async fn test_transfer_and_overdraft() {
    let (server, admin) = create_test_server();
    let (alice, alice_id) = login(&server, 20, "alice").await;
    let (_, bob_id) = login(&server, 21, "bob").await;
    grant_tokens(&server, &admin, alice_id, 100).await;

    let (name, value) = bearer(&alice);
    let response = server
        .post("/api/v1/economy/transaction")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "type": "transfer", "amount": 60, "recipient_id": bob_id }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["sender"]["power_tokens"], 40);
    assert_eq!(body["data"]["recipient"]["power_tokens"], 60);

    let response = server
        .post("/api/v1/economy/transaction")
        .add_header(name, value)
        .json(&json!({ "type": "transfer", "amount": 60, "recipient_id": bob_id }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "INSUFFICIENT_FUNDS");
}

#[tokio::test]
async fn test_transfer_requires_recipient() {
    let (server, _) = create_test_server();
    let (token, _) = login(&server, 22, "loner").await;

    let (name, value) = bearer(&token);
    server
        .post("/api/v1/economy/transaction")
        .add_header(name, value)
        .json(&json!({ "type": "transfer", "amount": 5 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_body_uses_envelope() {
    let (server, _) = create_test_server();
    let (token, _) = login(&server, 23, "sloppy").await;

    let (name, value) = bearer(&token);
    let response = server
        .post("/api/v1/economy/transaction")
        .add_header(name, value)
        .json(&json!({ "type": "steal", "amount": 5 }))
        .await;

    assert!(response.status_code().is_client_error());
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

// ============ Diamonds ============

#[tokio::test]
async fn test_diamond_purchase_credits_hundred_per_ton() {
    let (server, _) = create_test_server();
    let (token, _) = login(&server, 30, "whale").await;

    let (name, value) = bearer(&token);
    let response = server
        .post("/api/v1/diamonds/purchase")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "amount": "1.5", "wallet_address": "EQ-test-wallet" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["diamonds_credited"], 150);
    assert_eq!(body["data"]["player"]["diamonds"], 150);
    assert!(body["data"]["tx"]["tx_hash"].as_str().unwrap().starts_with("0x"));

    let history: Value = server
        .get("/api/v1/diamonds/transactions")
        .add_header(name, value)
        .await
        .json();
    assert_eq!(history["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_diamond_purchase_requires_wallet() {
    let (server, _) = create_test_server();
    let (token, _) = login(&server, 31, "nowallet").await;

    let (name, value) = bearer(&token);
    server
        .post("/api/v1/diamonds/purchase")
        .add_header(name, value)
        .json(&json!({ "amount": "1" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_diamond_purchase_is_bad_request() {
    let (server, _) = create_test_server();
    let (token, _) = login(&server, 34, "overflow").await;

    let (name, value) = bearer(&token);
    let response = server
        .post("/api/v1/diamonds/purchase")
        .add_header(name, value)
        .json(&json!({ "amount": "1000000000000000000000000000", "wallet_address": "EQ-test-wallet" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "INVALID_AMOUNT");
}

#[tokio::test]
async fn test_oversized_movement_token_is_bad_request() {
    let (server, _) = create_test_server();
    let (token, _) = login(&server, 35, "minter").await;

    let (name, value) = bearer(&token);
    let response = server
        .post("/api/v1/movement-tokens")
        .add_header(name, value)
        .json(&json!({
            "symbol": "HUGE",
            "name": "Huge",
            "total_supply": i64::MAX,
            "initial_price": "100000000000"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_AMOUNT");
}

#[tokio::test]
async fn test_stake_more_than_held_is_rejected() {
    let (server, _) = create_test_server();
    let (token, _) = login(&server, 32, "staker").await;

    let (name, value) = bearer(&token);
    let response = server
        .post("/api/v1/diamonds/stake")
        .add_header(name, value)
        .json(&json!({ "amount": 10, "wallet_address": "EQ-test-wallet" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "INSUFFICIENT_FUNDS");
}

#[tokio::test]
async fn test_diamond_tiers_listed() {
    let (server, _) = create_test_server();
    let (token, _) = login(&server, 33, "curious").await;

    let (name, value) = bearer(&token);
    let body: Value = server
        .get("/api/v1/diamonds/tiers")
        .add_header(name, value)
        .await
        .json();

    assert_eq!(body["success"], true);
    assert!(body["data"].as_array().unwrap().len() >= 5);
}

// ============ Habits / Education ============

#[tokio::test]
async fn test_habit_completed_twice_same_day_conflicts() {
    let (server, _) = create_test_server();
    let (token, _) = login(&server, 40, "habitual").await;

    let (name, value) = bearer(&token);
    let response = server
        .post("/api/v1/habits")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "name": "Walk", "reward_tokens": 5 }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let habit: Value = response.json();
    let habit_id = habit["data"]["id"].as_str().unwrap().to_string();

    let first = server
        .post(&format!("/api/v1/habits/{}/complete", habit_id))
        .add_header(name.clone(), value.clone())
        .await;
    first.assert_status_ok();
    let body: Value = first.json();
    assert_eq!(body["data"]["habit"]["current_streak"], 1);
    assert_eq!(body["data"]["player"]["power_tokens"], 5);

    let second = server
        .post(&format!("/api/v1/habits/{}/complete", habit_id))
        .add_header(name, value)
        .await;
    second.assert_status(StatusCode::CONFLICT);
    let body: Value = second.json();
    assert_eq!(body["code"], "ALREADY_COMPLETED");
}

#[tokio::test]
async fn test_course_generate_enroll_and_complete_lesson() {
    let (server, _) = create_test_server();
    let (token, _) = login(&server, 41, "student").await;

    let (name, value) = bearer(&token);
    let response = server
        .post("/api/v1/education/courses/generate")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "topic": "Community organizing", "lesson_count": 2 }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let course: Value = response.json();
    let course_id = course["data"]["id"].as_str().unwrap().to_string();

    server
        .post(&format!("/api/v1/education/courses/{}/enroll", course_id))
        .add_header(name.clone(), value.clone())
        .await
        .assert_status_ok();

    let response = server
        .post(&format!("/api/v1/education/courses/{}/complete-lesson", course_id))
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["lesson_index"], 0);
    assert_eq!(body["data"]["course_completed"], false);
}

// ============ Social ============

#[tokio::test]
async fn test_community_chat_requires_membership() {
    let (server, _) = create_test_server();
    let (owner, _) = login(&server, 50, "owner").await;
    let (outsider, _) = login(&server, 51, "outsider").await;

    let (owner_name, owner_value) = bearer(&owner);
    let response = server
        .post("/api/v1/communities")
        .add_header(owner_name.clone(), owner_value.clone())
        .json(&json!({ "name": "Climate Walkers" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let community: Value = response.json();
    let id = community["data"]["id"].as_str().unwrap().to_string();

    server
        .post(&format!("/api/v1/communities/{}/messages", id))
        .add_header(owner_name, owner_value)
        .json(&json!({ "content": "welcome" }))
        .await
        .assert_status(StatusCode::CREATED);

    let (name, value) = bearer(&outsider);
    server
        .post(&format!("/api/v1/communities/{}/messages", id))
        .add_header(name, value)
        .json(&json!({ "content": "let me in" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

// ============ Marketplace / Tips ============

#[tokio::test]
async fn test_marketplace_purchase_pays_seller() {
    let (server, admin) = create_test_server();
    let (seller, seller_id) = login(&server, 60, "seller").await;
    let (buyer, buyer_id) = login(&server, 61, "buyer").await;
    grant_tokens(&server, &admin, buyer_id, 100).await;

    let (name, value) = bearer(&seller);
    let response = server
        .post("/api/v1/marketplace/listings")
        .add_header(name, value)
        .json(&json!({ "title": "Poster", "price": 30, "quantity": 2 }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let listing: Value = response.json();
    let listing_id = listing["data"]["id"].as_str().unwrap().to_string();

    let (name, value) = bearer(&buyer);
    let response = server
        .post(&format!("/api/v1/marketplace/listings/{}/purchase", listing_id))
        .add_header(name, value)
        .json(&json!({ "quantity": 2 }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["buyer"]["power_tokens"], 40);
    assert_eq!(body["data"]["listing"]["seller_id"], seller_id.to_string());
}

#[tokio::test]
async fn test_tip_self_is_rejected() {
    let (server, admin) = create_test_server();
    let (token, id) = login(&server, 70, "narcissus").await;
    grant_tokens(&server, &admin, id, 10).await;

    let (name, value) = bearer(&token);
    server
        .post("/api/v1/tips")
        .add_header(name, value)
        .json(&json!({ "recipient_id": id, "amount": 5 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

// ============ Admin ============

#[tokio::test]
async fn test_admin_shop_item_shows_in_shop() {
    let (server, admin) = create_test_server();
    let (token, _) = login(&server, 80, "shopper").await;

    let (name, value) = bearer(&admin);
    server
        .post("/api/v1/admin/shop")
        .add_header(name, value)
        .json(&json!({
            "name": "Energy drink",
            "description": "Refill energy",
            "currency": "power_tokens",
            "price": 50,
            "stock": null,
            "effect": "energy_refill",
            "effect_value": 500
        }))
        .await
        .assert_status(StatusCode::CREATED);

    let (name, value) = bearer(&token);
    let body: Value = server.get("/api/v1/economy/shop").add_header(name, value).await.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_admin_daily_window_validated() {
    let (server, admin) = create_test_server();

    let (name, value) = bearer(&admin);
    server
        .get("/api/v1/admin/analytics/daily?days=7")
        .add_header(name.clone(), value.clone())
        .await
        .assert_status_ok();

    server
        .get("/api/v1/admin/analytics/daily?days=365")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
