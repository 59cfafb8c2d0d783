//! In-memory sliding-window rate limiter, keyed by principal.
use crate::error::AppError;
use crate::state::SharedState;
use crate::web::session::Principal;
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct RateLimiter {
    requests: Arc<RwLock<HashMap<String, Vec<Instant>>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    /// Records a request for `key` and reports whether it fits in the window.
    pub async fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut requests = self.requests.write().await;
        let history = requests.entry(key.to_string()).or_default();

        history.retain(|&at| now.duration_since(at) < self.window);

        if history.len() < self.max_requests {
            history.push(now);
            true
        } else {
            false
        }
    }

    /// Drops expired timestamps and idle keys. Run periodically.
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let mut requests = self.requests.write().await;
        requests.retain(|_, history| {
            history.retain(|&at| now.duration_since(at) < self.window);
            !history.is_empty()
        });
        tracing::debug!("Rate limiter cleanup: {} active principals", requests.len());
    }

    pub async fn tracked(&self) -> usize {
        self.requests.read().await.len()
    }
}

/// Guards the text generation proxy, one budget per authenticated principal.
pub async fn ai_rate_limit(
    State(state): State<SharedState>,
    Principal(external_id): Principal,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if !state.ai_limiter.check(&external_id).await {
        tracing::warn!("AI rate limit exceeded for {}", external_id);
        return Err(AppError::RateLimited);
    }
    Ok(next.run(request).await)
}
