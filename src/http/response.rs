//! Proxied response assembly.
//!
//! # Responsibilities
//! - Turn upstream and cached responses into client responses
//! - Strip hop-by-hop and upstream CORS headers
//! - Mark responses with `X-Cache` and the gateway cache lifetime
//!
//! # Design Decisions
//! - CORS headers are added later by the middleware, never copied from upstream
//! - Upstream status codes pass through unchanged

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::Response,
};

use crate::cache::CachedResponse;
use crate::error::{GatewayError, GatewayResult};
use crate::security::headers::response_headers;
use crate::upstream::UpstreamResponse;

pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Where a proxied body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// Pass an upstream response through to the client.
pub fn from_upstream(upstream: UpstreamResponse, ttl: Duration) -> Response {
    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = upstream.status;

    let headers = response.headers_mut();
    headers.extend(response_headers(&upstream.headers));
    if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", ttl.as_secs())) {
        headers.insert(header::CACHE_CONTROL, value);
    }
    headers.insert(X_CACHE, HeaderValue::from_static(CacheStatus::Miss.as_str()));
    response
}

/// Replay a cached response.
pub fn from_cache(cached: &CachedResponse) -> GatewayResult<Response> {
    let body = cached
        .body()
        .map_err(|e| GatewayError::Internal(format!("cached body unreadable: {}", e)))?;
    let status = StatusCode::from_u16(cached.status)
        .map_err(|e| GatewayError::Internal(format!("cached status invalid: {}", e)))?;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    for (name, value) in &cached.headers {
        let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) else {
            continue;
        };
        headers.insert(name, value);
    }
    headers.insert(X_CACHE, HeaderValue::from_static(CacheStatus::Hit.as_str()));
    Ok(response)
}
