//! API Routes
//!
//! Route definitions for the People Power API.

use axum::{
    http::Uri,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{require_admin, require_auth};
use crate::error::ApiError;
use crate::handlers::{
    admin, auth, diamonds, economy, education, game, habits, health, marketplace, players, social,
    tips, tokens,
};
use crate::metrics::metrics_middleware;
use crate::state::AppState;

/// Create the API router with all routes
///
/// Everything except `/health` and `/auth/login` needs a bearer token;
/// `/admin/*` additionally needs the admin role.
pub fn create_router(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/auth/login", post(auth::login));

    let admin = Router::new()
        .route("/admin/analytics/overview", get(admin::analytics_overview))
        .route("/admin/analytics/daily", get(admin::analytics_daily))
        .route("/admin/players", get(admin::players))
        .route("/admin/missions", post(admin::create_mission))
        .route("/admin/badges", post(admin::create_badge))
        .route("/admin/shop", post(admin::create_shop_item))
        .route("/admin/grant", post(admin::grant))
        .route_layer(middleware::from_fn(require_admin));

    let protected = Router::new()
        // Players
        .route("/players/me", get(players::me).patch(players::update_me))
        .route("/players/me/stats", get(players::my_stats))
        .route("/players/:id", get(players::get_player))
        // Game loop
        .route("/game/tap", post(game::tap))
        .route("/game/daily-login", post(game::daily_login))
        .route("/game/leaderboard", get(game::leaderboard))
        .route("/game/missions", get(game::missions))
        .route("/game/missions/:id/progress", post(game::mission_progress))
        .route("/game/missions/:id/claim", post(game::claim_mission))
        .route("/game/badges", get(game::badges))
        .route("/game/badges/me", get(game::my_badges))
        // Economy
        .route("/economy/balance", get(economy::balance))
        .route("/economy/transaction", post(economy::transaction))
        .route("/economy/transactions", get(economy::transactions))
        .route("/economy/shop", get(economy::shop))
        .route("/economy/shop/:id/purchase", post(economy::purchase_item))
        // Diamonds
        .route("/diamonds/purchase", post(diamonds::purchase))
        .route("/diamonds/spend", post(diamonds::spend))
        .route("/diamonds/stake", post(diamonds::stake))
        .route("/diamonds/unstake", post(diamonds::unstake))
        .route("/diamonds/tiers", get(diamonds::tiers))
        .route("/diamonds/me", get(diamonds::me))
        .route("/diamonds/transactions", get(diamonds::transactions))
        // Communities and chat
        .route(
            "/communities",
            get(social::list_communities).post(social::create_community),
        )
        .route("/communities/:id", get(social::get_community))
        .route("/communities/:id/join", post(social::join_community))
        .route("/communities/:id/leave", post(social::leave_community))
        .route("/communities/:id/members", get(social::members))
        .route(
            "/communities/:id/messages",
            get(social::messages).post(social::post_message),
        )
        // Competitions
        .route(
            "/competitions",
            get(social::list_competitions).post(social::create_competition),
        )
        .route("/competitions/:id", get(social::get_competition))
        .route("/competitions/:id/join", post(social::join_competition))
        .route("/competitions/:id/score", post(social::submit_score))
        .route("/competitions/:id/standings", get(social::standings))
        .route("/competitions/:id/finalize", post(social::finalize_competition))
        // Referrals
        .route("/referrals", get(social::referrals))
        .route("/referrals/apply", post(social::apply_referral))
        // Marketplace
        .route(
            "/marketplace/listings",
            get(marketplace::list_listings).post(marketplace::create_listing),
        )
        .route("/marketplace/listings/:id", get(marketplace::get_listing))
        .route("/marketplace/listings/:id/purchase", post(marketplace::purchase))
        .route("/marketplace/listings/:id/cancel", post(marketplace::cancel_listing))
        .route("/marketplace/purchases", get(marketplace::my_purchases))
        // Tips
        .route("/tips", get(tips::list_tips).post(tips::send_tip))
        // Movement tokens
        .route(
            "/movement-tokens",
            get(tokens::list_tokens).post(tokens::create_token),
        )
        .route("/movement-tokens/holdings/me", get(tokens::my_holdings))
        .route("/movement-tokens/:id", get(tokens::get_token))
        .route("/movement-tokens/:id/quote", get(tokens::quote_token))
        .route("/movement-tokens/:id/purchase", post(tokens::purchase_token))
        // Habits
        .route("/habits", get(habits::list_habits).post(habits::create_habit))
        .route("/habits/:id/complete", post(habits::complete_habit))
        // Education
        .route("/education/courses/generate", post(education::generate_course))
        .route("/education/courses", get(education::list_courses))
        .route("/education/courses/:id", get(education::get_course))
        .route("/education/courses/:id/enroll", post(education::enroll))
        .route(
            "/education/courses/:id/complete-lesson",
            post(education::complete_lesson),
        )
        .route("/education/enrollments", get(education::my_enrollments))
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    public.merge(protected).with_state(state)
}

/// Create a router for the V1 API with /api/v1 prefix
pub fn create_v1_router(state: Arc<AppState>) -> Router {
    Router::new().nest("/api/v1", create_router(state))
}

async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::not_found("Route", uri.path())
}

/// Build the full application router
pub fn build_app(state: AppState) -> Router {
    let state = Arc::new(state);
    let enable_cors = state.config.enable_cors;

    let root_router = Router::new()
        .route("/", get(health::root))
        .route("/healthz", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .with_state(state.clone());

    let mut router = root_router
        .merge(create_v1_router(state.clone()))
        .fallback(route_not_found)
        .layer(middleware::from_fn_with_state(state, metrics_middleware));

    if enable_cors {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router.layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{roles_for, JwtConfig};
    use crate::config::ApiConfig;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::util::ServiceExt;
    use uuid::Uuid;

    const SECRET: &str = "routes-test-secret-long-enough-for-hs256";

    fn create_test_state() -> AppState {
        let jwt = JwtConfig::try_new(SECRET, 3600).unwrap();
        AppState::in_memory(ApiConfig::default(), jwt)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_root_endpoint() {
        let app = build_app(create_test_state());

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        for uri in ["/healthz", "/api/v1/health"] {
            let app = build_app(create_test_state());
            let response = app
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let body = body_json(response).await;
            assert_eq!(body["success"], true);
            assert_eq!(body["data"]["status"], "healthy");
        }
    }

    #[tokio::test]
    async fn test_metrics_disabled_returns_503() {
        let app = build_app(create_test_state());

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_protected_route_requires_token() {
        let app = build_app(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/economy/balance")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_admin_route_rejects_player_role() {
        let state = create_test_state();
        let token = state
            .jwt
            .issue(Uuid::new_v4(), 42, roles_for(false))
            .unwrap()
            .token;
        let app = build_app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/admin/analytics/overview")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_route_allows_admin_role() {
        let state = create_test_state();
        let token = state
            .jwt
            .issue(Uuid::new_v4(), 1, roles_for(true))
            .unwrap()
            .token;
        let app = build_app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/admin/analytics/overview")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["backend"], "memory");
    }

    #[tokio::test]
    async fn test_unknown_route_uses_envelope() {
        let app = build_app(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/nowhere")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
    }
}
