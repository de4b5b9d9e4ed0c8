//! People Power API - HTTP Interface Layer
//!
//! REST API for the People Power game: tapping, missions, the token
//! economy, diamonds, communities and the rest of the player-facing
//! features. Every JSON response uses the same envelope:
//!
//! ```text
//! { "success": true,  "data": ..., "message": "..." }
//! { "success": false, "error": "...", "code": "INSUFFICIENT_FUNDS" }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 pp-api                       │
//! │  ┌─────────────────────────────────────┐    │
//! │  │   Routes (/api/v1, JWT, admin)      │    │
//! │  └─────────────────────────────────────┘    │
//! │        │            │            │          │
//! │        ▼            ▼            ▼          │
//! │  ┌──────────┐ ┌──────────┐ ┌────────────┐   │
//! │  │ Handlers │ │  Cache   │ │  Payment   │   │
//! │  │          │ │ (Redis)  │ │  gateway   │   │
//! │  └──────────┘ └──────────┘ └────────────┘   │
//! └─────────────────────────────────────────────┘
//!          │
//!          ▼
//!   pp-store services ──► PostgreSQL / memory
//! ```
//!
//! # Endpoints
//!
//! ## Health & Metrics
//! - `GET /healthz`, `GET /api/v1/health` - Service health check
//! - `GET /metrics` - Prometheus exposition
//!
//! ## Auth & Players
//! - `POST /auth/login` - Register or log in, returns a bearer token
//! - `GET|PATCH /players/me`, `GET /players/me/stats`, `GET /players/:id`
//!
//! ## Game
//! - `POST /game/tap`, `POST /game/daily-login`, `GET /game/leaderboard`
//! - `GET /game/missions`, `POST /game/missions/:id/progress|claim`
//! - `GET /game/badges`, `GET /game/badges/me`
//!
//! ## Economy & Diamonds
//! - `GET /economy/balance`, `POST /economy/transaction`, `GET /economy/transactions`
//! - `GET /economy/shop`, `POST /economy/shop/:id/purchase`
//! - `POST /diamonds/purchase|spend|stake|unstake`, `GET /diamonds/tiers|me|transactions`
//!
//! ## Social
//! - `/communities`, `/competitions`, `/referrals`
//!
//! ## Marketplace, Tips, Movement Tokens, Habits, Education
//! - `/marketplace/listings`, `/tips`, `/movement-tokens`, `/habits`, `/education/courses`
//!
//! ## Admin (admin role)
//! - `/admin/analytics/*`, `/admin/players`, `/admin/missions|badges|shop|grant`
//!
//! # Usage Example
//!
//! ```ignore
//! use pp_api::{ApiConfig, AppState, start_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ApiConfig::from_env();
//!     let state = AppState::from_config(config).await.unwrap();
//!     start_server(state).await.unwrap();
//! }
//! ```

pub mod auth;
pub mod bridge;
pub mod cache;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod response;
pub mod routes;
pub mod state;

// Re-export main types
pub use auth::{roles_for, AuthClaims, IssuedToken, JwtConfig, ROLE_ADMIN, ROLE_PLAYER};
pub use bridge::{BridgeError, PaymentGateway, SimulatedGateway};
pub use cache::{Cache, NoopCache, RedisCache};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use metrics::init_metrics;
pub use response::ApiResponse;
pub use routes::{build_app, create_router, create_v1_router};
pub use state::AppState;

/// API version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default API port
pub const DEFAULT_PORT: u16 = 3000;

/// Bind the configured address and serve until the process stops
pub async fn start_server(state: AppState) -> Result<(), std::io::Error> {
    let addr = state.config.listen_addr();
    let app = build_app(state);

    tracing::info!("Starting People Power API on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_default_port() {
        assert_eq!(DEFAULT_PORT, 3000);
        assert_eq!(ApiConfig::default().listen_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_build_app() {
        let jwt = JwtConfig::try_new("lib-test-secret-that-is-long-enough", 60).unwrap();
        let _app = build_app(AppState::in_memory(ApiConfig::default(), jwt));
    }

    #[tokio::test]
    async fn test_app_state_uptime() {
        let jwt = JwtConfig::try_new("lib-test-secret-that-is-long-enough", 60).unwrap();
        let state = AppState::in_memory(ApiConfig::default(), jwt);

        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
        assert!(state.uptime_secs() < 5);
    }

    #[test]
    fn test_error_response() {
        let err = ApiError::validation("Test error");
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }
}
