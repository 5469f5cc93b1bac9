use crate::handlers::error::ErrorResponse;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use docvault_cache::{rate_limit_key, Cache, CacheError};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
struct RateLimitError {
    #[serde(flatten)]
    error: ErrorResponse,
    retry_after: u64,
}

/// Fixed window limit for one endpoint
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    pub scope: &'static str,
    pub max_requests: u64,
    pub window_seconds: u64,
    pub description: &'static str,
}

/// 5 requests per 60 seconds per IP
pub const LOGIN_POLICY: RateLimitPolicy = RateLimitPolicy {
    scope: "login",
    max_requests: 5,
    window_seconds: 60,
    description: "login attempts",
};

/// 3 requests per 300 seconds (5 minutes) per IP
pub const REGISTRATION_POLICY: RateLimitPolicy = RateLimitPolicy {
    scope: "register",
    max_requests: 3,
    window_seconds: 300,
    description: "registration attempts",
};

pub struct RateLimiter {
    cache: Cache,
}

impl RateLimiter {
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }

    /// Count a request against the window.
    /// Returns `None` when allowed, otherwise the seconds until the window resets.
    pub async fn check(
        &self,
        policy: &RateLimitPolicy,
        identifier: &str,
    ) -> Result<Option<u64>, CacheError> {
        let key = rate_limit_key(policy.scope, identifier);
        let window = self.cache.hit_window(&key, policy.window_seconds).await?;

        if window.hits <= policy.max_requests {
            return Ok(None);
        }

        Ok(Some(retry_after(window.resets_in, policy.window_seconds)))
    }
}

/// Redis reports -1/-2 for keys without TTL or already expired
fn retry_after(ttl: i64, window_seconds: u64) -> u64 {
    if ttl > 0 {
        ttl as u64
    } else {
        window_seconds
    }
}

/// Extract IP address from request headers
fn extract_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|h| h.to_str().ok()))
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

async fn enforce(
    state: &AppState,
    policy: RateLimitPolicy,
    request: Request,
    next: Next,
) -> Response {
    let Some(cache) = state.cache.clone() else {
        return next.run(request).await;
    };

    let ip = extract_ip(request.headers());
    match RateLimiter::new(cache).check(&policy, &ip).await {
        Ok(None) => next.run(request).await,
        Ok(Some(retry_after)) => {
            tracing::warn!("Rate limit exceeded for {} from IP: {}", policy.scope, ip);
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(RateLimitError {
                    error: ErrorResponse::new(
                        "rate_limit_exceeded",
                        &format!(
                            "Too many {}. Please try again in {} seconds.",
                            policy.description, retry_after
                        ),
                    ),
                    retry_after,
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Rate limit check error: {}", e);
            // On error, allow the request (fail open)
            next.run(request).await
        }
    }
}

/// Rate limit middleware for login attempts
pub async fn rate_limit_login(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    enforce(&state, LOGIN_POLICY, request, next).await
}

/// Rate limit middleware for registration
pub async fn rate_limit_registration(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    enforce(&state, REGISTRATION_POLICY, request, next).await
}
