//! Prometheus Metrics
//!
//! # Metrics
//!
//! ## Counters
//! - `pp_http_requests_total` - HTTP requests by method, path, status
//! - `pp_economy_operations_total` - balance-changing operations by operation, status
//! - `pp_cache_lookups_total` - cache lookups by result (hit/miss)
//! - `pp_errors_total` - error responses by code
//!
//! ## Histograms
//! - `pp_http_request_duration_seconds` - HTTP request duration
//!
//! ## Gauges
//! - `pp_active_requests` - requests in flight
//! - `pp_uptime_seconds` - service uptime
//!
//! The recorder is installed once per process by [`init_metrics`]; without it
//! the macros are no-ops, which is what tests rely on.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Instant;

use crate::state::AppState;

/// Install the Prometheus recorder and return the handle `/metrics` renders
pub fn init_metrics(enabled: bool) -> Result<Option<PrometheusHandle>, String> {
    if !enabled {
        tracing::info!("Metrics disabled");
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install metrics recorder: {}", e))?;

    tracing::info!("Metrics initialized");
    Ok(Some(handle))
}

/// Record a request metric
pub fn record_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", normalize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("pp_http_requests_total", &labels).increment(1);
    histogram!("pp_http_request_duration_seconds", &labels).record(duration_secs);
}

/// Record a balance-changing operation
pub fn record_economy_operation(operation: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "pp_economy_operations_total",
        "operation" => operation.to_string(),
        "status" => status
    )
    .increment(1);
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("pp_cache_lookups_total", "result" => result).increment(1);
}

/// Record an error
pub fn record_error(code: &str) {
    counter!("pp_errors_total", "code" => code.to_string()).increment(1);
}

pub fn set_active_requests(count: u64) {
    gauge!("pp_active_requests").set(count as f64);
}

pub fn set_uptime(seconds: u64) {
    gauge!("pp_uptime_seconds").set(seconds as f64);
}

/// Normalize path for metric labels (remove dynamic segments)
fn normalize_path(path: &str) -> String {
    let path = replace_ids(path);
    if path.len() > 64 {
        path[..64].to_string()
    } else {
        path
    }
}

/// Replace id-like segments with `:id`
fn replace_ids(path: &str) -> String {
    path.split('/')
        .map(|part| {
            let looks_like_id = part.len() >= 8
                && (part.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
                    || part.chars().all(|c| c.is_ascii_digit()));
            if looks_like_id {
                ":id"
            } else {
                part
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Tracks request counts, in-flight requests and latency
pub async fn metrics_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    state.increment_requests();
    set_active_requests(state.request_started());
    set_uptime(state.uptime_secs());

    let response = next.run(request).await;

    set_active_requests(state.request_finished());
    record_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/api/v1/health"), "/api/v1/health");
        assert_eq!(
            normalize_path("/api/v1/communities/550e8400-e29b-41d4-a716-446655440000/join"),
            "/api/v1/communities/:id/join"
        );
        assert_eq!(normalize_path("/api/v1/players/123456789"), "/api/v1/players/:id");
    }

    #[test]
    fn test_short_segments_kept() {
        assert_eq!(replace_ids("/api/v1/players/me"), "/api/v1/players/me");
        assert_eq!(replace_ids("/api/v1/game/tap"), "/api/v1/game/tap");
    }

    #[test]
    fn test_disabled_metrics_has_no_handle() {
        assert!(init_metrics(false).unwrap().is_none());
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_economy_operation("transfer", true);
        record_cache_lookup(false);
        record_error("NOT_FOUND");
    }
}
