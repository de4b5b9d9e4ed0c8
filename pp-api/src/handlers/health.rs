//! Health and metrics

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;

use crate::dto::{ComponentHealth, HealthResponse};
use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::state::AppState;

pub async fn root() -> &'static str {
    "People Power API"
}

/// Health check handler
///
/// The store is pinged; cache and gateway are reported but never make the
/// service unhealthy on their own.
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, ApiResponse<HealthResponse>) {
    let mut components = Vec::new();

    let store = &state.services.store;
    match store.ping().await {
        Ok(()) => components.push(ComponentHealth {
            name: format!("store:{}", store.backend()),
            status: "healthy".to_string(),
            message: None,
        }),
        Err(e) => components.push(ComponentHealth {
            name: format!("store:{}", store.backend()),
            status: "unhealthy".to_string(),
            message: Some(e.to_string()),
        }),
    }
    components.push(ComponentHealth {
        name: format!("cache:{}", state.cache.backend()),
        status: "healthy".to_string(),
        message: None,
    });
    components.push(ComponentHealth {
        name: "bridge".to_string(),
        status: "healthy".to_string(),
        message: Some(state.gateway.contract().to_string()),
    });

    let healthy = components.iter().all(|c| c.status == "healthy");
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        version: state.config.version.clone(),
        uptime_secs: state.uptime_secs(),
        total_requests: state.request_count(),
        components,
    };
    (status, ApiResponse::ok(body))
}

/// Prometheus text exposition
pub async fn metrics(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let handle = state
        .metrics
        .as_ref()
        .ok_or_else(|| ApiError::unavailable("metrics are disabled"))?;
    Ok(([(CONTENT_TYPE, "text/plain; version=0.0.4")], handle.render()))
}
