pub mod extract;
pub mod health;

pub use extract::*;
pub use health::*;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use once_cell::sync::Lazy;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::middleware::{logging_middleware, rate_limit_middleware, RequestLimiter};
use crate::services::Extractor;

/// Shared by every handler. Built once from the loaded configuration.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub extractor: Arc<Extractor>,
    pub limiter: Arc<RequestLimiter>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Lazy::force(&STARTED_AT);
        Self {
            extractor: Arc::new(Extractor::new(config.extractor_config())),
            limiter: Arc::new(RequestLimiter::new(config.max_concurrent_requests)),
            config: Arc::new(config),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/v1/extract", post(extract_handler))
        .route("/api/v1/extract/binary", post(extract_binary_handler))
        .route_layer(axum::middleware::from_fn_with_state(
            state.limiter.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/api/v1/formats", get(formats_handler))
        .merge(api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(state.config.max_request_bytes()))
                .layer(axum::middleware::from_fn(logging_middleware)),
        )
        .with_state(state)
}
