use axum::{extract::State, http::StatusCode, response::Json};
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::info;

use super::AppState;
use crate::models::FormatsResponse;
use crate::services::{accept_attribute, SUPPORTED_EXTENSIONS};

pub static STARTED_AT: Lazy<Instant> = Lazy::new(Instant::now);

/// Health check endpoint
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let metrics = state.limiter.metrics();
    let status = if metrics.available_permits > 0 {
        "healthy"
    } else {
        "saturated"
    };

    let rejection_rate = if metrics.total_requests > 0 {
        (metrics.rejected_requests as f64 / metrics.total_requests as f64 * 100.0).round() / 100.0
    } else {
        0.0
    };

    info!(status, available_permits = metrics.available_permits, "Health check completed");

    Json(json!({
        "status": status,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": STARTED_AT.elapsed().as_secs(),
        "formats": SUPPORTED_EXTENSIONS,
        "rate_limiting": {
            "total_requests": metrics.total_requests,
            "rejected_requests": metrics.rejected_requests,
            "available_permits": metrics.available_permits,
            "capacity": metrics.capacity,
            "rejection_rate": rejection_rate
        }
    }))
}

/// Readiness check: ready while the limiter still has free permits.
pub async fn ready_handler(State(state): State<AppState>) -> StatusCode {
    if state.limiter.metrics().available_permits > 0 {
        StatusCode::OK
    } else {
        info!("Readiness check failed - no free request permits");
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// What the upload picker should offer.
pub async fn formats_handler(State(state): State<AppState>) -> Json<FormatsResponse> {
    Json(FormatsResponse {
        extensions: SUPPORTED_EXTENSIONS.to_vec(),
        accept: accept_attribute(),
        max_file_size_bytes: state.config.max_file_size_bytes,
        max_files_per_request: state.config.max_files_per_request,
    })
}
