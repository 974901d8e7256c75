use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use arena_store::redis_repo::rate_limit_key;
use arena_store::RedisClient;
use async_trait::async_trait;
use std::net::SocketAddr;
use crate::state::AppState;

const WINDOW_SECONDS: i64 = 60;

/// Fixed-window counter; `Ok(false)` once `key` is over `limit`.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn check(&self, key: &str, limit: i64, window_seconds: i64) -> Result<bool, String>;
}

#[async_trait]
impl RateLimiter for RedisClient {
    async fn check(&self, key: &str, limit: i64, window_seconds: i64) -> Result<bool, String> {
        self.check_rate_limit(key, limit, window_seconds)
            .await
            .map_err(|e| e.to_string())
    }
}

/// Per-IP fixed window. The payment webhook is never limited.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(limit) = state.rate_limit.as_ref() else {
        return next.run(req).await;
    };
    if req.uri().path().starts_with("/webhook") {
        return next.run(req).await;
    }

    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let key = rate_limit_key("public", &ip);

    match limit.limiter.check(&key, limit.per_minute, WINDOW_SECONDS).await {
        Ok(true) => next.run(req).await,
        Ok(false) => {
            tracing::warn!("Rate limit exceeded for {}", ip);
            (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response()
        }
        Err(e) => {
            // Fail open
            tracing::debug!("Rate limiter unavailable: {}", e);
            next.run(req).await
        }
    }
}
