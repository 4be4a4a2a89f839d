use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::error::AppError;

/// Caps the number of extraction requests in flight.
#[derive(Debug)]
pub struct RequestLimiter {
    semaphore: Semaphore,
    capacity: usize,
    total_requests: AtomicU64,
    rejected_requests: AtomicU64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LimiterMetrics {
    pub total_requests: u64,
    pub rejected_requests: u64,
    pub available_permits: usize,
    pub capacity: usize,
}

impl RequestLimiter {
    pub fn new(max_concurrent_requests: usize) -> Self {
        info!(max_concurrent_requests, "Initializing request limiter");
        Self {
            semaphore: Semaphore::new(max_concurrent_requests),
            capacity: max_concurrent_requests,
            total_requests: AtomicU64::new(0),
            rejected_requests: AtomicU64::new(0),
        }
    }

    pub fn metrics(&self) -> LimiterMetrics {
        LimiterMetrics {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            rejected_requests: self.rejected_requests.load(Ordering::Relaxed),
            available_permits: self.semaphore.available_permits(),
            capacity: self.capacity,
        }
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RequestLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();
    let total_requests = limiter.total_requests.fetch_add(1, Ordering::Relaxed) + 1;

    let _permit = limiter.semaphore.try_acquire().map_err(|_| {
        let rejected = limiter.rejected_requests.fetch_add(1, Ordering::Relaxed) + 1;
        warn!(
            path = %path,
            total_requests,
            rejected_requests = rejected,
            "Rate limit exceeded - too many concurrent requests"
        );
        AppError::RateLimitExceeded
    })?;

    debug!(
        path = %path,
        available_permits = limiter.semaphore.available_permits(),
        "Request permit acquired"
    );

    Ok(next.run(request).await)
}
