//! Rate limiting middleware.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

use common::{AppError, RateLimitConfig};

use crate::state::AppState;

/// Rate limit middleware for general endpoints.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let limit = state.config.rate_limit;
    rate_limit_internal(state, connect_info, request, next, limit).await
}

/// Rate limit middleware for auth endpoints (stricter).
pub async fn rate_limit_auth_middleware(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let limit = state.config.auth_rate_limit;
    rate_limit_internal(state, connect_info, request, next, limit).await
}

async fn rate_limit_internal(
    state: AppState,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
    next: Next,
    limit: RateLimitConfig,
) -> Response {
    let ip = get_client_ip(&request, connect_info);
    let identifier = format!("{}:{}", request.uri().path(), ip);

    let (count, allowed) = match state
        .cache
        .check_rate_limit(&identifier, limit.max_requests, limit.window_seconds)
        .await
    {
        Ok(result) => result,
        Err(e) => {
            // Fail closed
            tracing::error!("Rate limit check failed: {}", e);
            return rate_limit_exceeded_response(limit, limit.window_seconds);
        }
    };

    if !allowed {
        let retry_after = state
            .cache
            .rate_limit_ttl(&identifier)
            .await
            .ok()
            .flatten()
            .unwrap_or(limit.window_seconds);
        tracing::debug!(identifier = %identifier, count, "Rate limit exceeded");
        return rate_limit_exceeded_response(limit, retry_after);
    }

    let mut response = next.run(request).await;
    set_limit_headers(
        response.headers_mut(),
        limit.max_requests,
        limit.max_requests.saturating_sub(count),
    );
    response
}

fn get_client_ip(request: &Request<Body>, connect_info: Option<ConnectInfo<SocketAddr>>) -> String {
    // Try X-Forwarded-For header first
    if let Some(forwarded) = request
        .headers()
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
    {
        if let Some(ip) = forwarded.split(',').next() {
            return ip.trim().to_string();
        }
    }

    // Try X-Real-IP header
    if let Some(real_ip) = request
        .headers()
        .get("X-Real-IP")
        .and_then(|h| h.to_str().ok())
    {
        return real_ip.to_string();
    }

    // Fall back to connection socket address
    connect_info
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn set_limit_headers(headers: &mut HeaderMap, limit: u64, remaining: u64) {
    headers.insert("X-RateLimit-Limit", HeaderValue::from(limit));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(remaining));
}

fn rate_limit_exceeded_response(limit: RateLimitConfig, retry_after: u64) -> Response {
    let mut response = AppError::TooManyRequests.into_response();
    let headers = response.headers_mut();
    headers.insert("Retry-After", HeaderValue::from(retry_after));
    set_limit_headers(headers, limit.max_requests, 0);
    response
}
