use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::infrastructure::rate_limiter::{RateLimitDecision, RateLimiter};

pub const API_PREFIX: &str = "/api";

pub const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later.";

const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// True for `/api` and anything below `/api/`, but not for siblings such as `/api-docs`.
pub fn is_rate_limited_path(path: &str) -> bool {
    match path.strip_prefix(API_PREFIX) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Counts requests under the API prefix per client IP and short-circuits with 429
/// once the client's window is exhausted.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !is_rate_limited_path(request.uri().path()) {
        return next.run(request).await;
    }

    let client = peer.ip();
    let decision = limiter.check(client);

    if !decision.allowed {
        warn!(
            client = %client,
            path = %request.uri().path(),
            "Rate limit exceeded"
        );
        let mut response = (StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_MESSAGE).into_response();
        let headers = response.headers_mut();
        insert_rate_limit_headers(headers, &decision);
        headers.insert(
            axum::http::header::RETRY_AFTER,
            HeaderValue::from(reset_secs(&decision)),
        );
        return response;
    }

    let mut response = next.run(request).await;
    insert_rate_limit_headers(response.headers_mut(), &decision);
    response
}

fn reset_secs(decision: &RateLimitDecision) -> u64 {
    let reset = decision.reset_after;
    // Whole seconds, rounded up.
    reset.as_secs() + u64::from(reset.subsec_nanos() > 0)
}

fn insert_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert(RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(
        RATELIMIT_REMAINING,
        HeaderValue::from(decision.remaining),
    );
    headers.insert(
        RATELIMIT_RESET,
        HeaderValue::from(reset_secs(decision)),
    );
}
