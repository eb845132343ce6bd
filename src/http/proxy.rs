//! Generic proxy-with-cache routes.
//!
//! # Data Flow
//! ```text
//! /proxy/{urlEncodedTarget} ─┐
//! /{allowedHost}/{path...} ──┴→ ProxyTarget
//!     → allowlist (403, no upstream call)
//!     → response cache (GET only)  → HIT: replay
//!     → upstream fetch under deadline → MISS: pass through, cache GET + 2xx in background
//! ```

use axum::{
    body::{Body, Bytes},
    http::{Method, Request},
    response::Response,
};
use url::Url;

use crate::cache::CachedResponse;
use crate::error::{GatewayError, GatewayResult};
use crate::http::request::read_body;
use crate::http::response;
use crate::http::server::AppState;
use crate::resilience::timeouts::with_deadline;
use crate::security::headers::forward_request_headers;
use crate::upstream::UpstreamRequest;

/// A resolved upstream destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    /// `host[:port]` as checked against the allowlist.
    pub host: String,
    /// Absolute URL, also the cache key.
    pub url: String,
}

impl ProxyTarget {
    /// Decode the `/proxy/{urlEncodedTarget}` form.
    ///
    /// A gateway query string is appended when the decoded target carries none,
    /// so unencoded `?` in the target still reaches the upstream.
    pub fn from_encoded(encoded: &str, query: Option<&str>) -> GatewayResult<Self> {
        let decoded = urlencoding::decode(encoded).map_err(|_| invalid_url())?;
        let mut candidate = decoded.into_owned();
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            if !candidate.contains('?') {
                candidate.push('?');
                candidate.push_str(query);
            }
        }

        let url = Url::parse(&candidate).map_err(|_| invalid_url())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid_url());
        }
        let host = url.host_str().ok_or_else(invalid_url)?;
        let host = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Ok(Self {
            host,
            url: url.to_string(),
        })
    }

    /// Build the target of the legacy `/{host}/{path...}` form.
    ///
    /// The host is lower-cased in the URL too, so case variants share one cache entry.
    pub fn from_host_path(host_and_path: &str, query: Option<&str>, scheme: &str) -> Self {
        let (host, path) = host_and_path
            .split_once('/')
            .unwrap_or((host_and_path, ""));
        let host = host.to_ascii_lowercase();
        let mut url = format!("{}://{}/{}", scheme, host, path);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        Self { host, url }
    }
}

fn invalid_url() -> GatewayError {
    GatewayError::validation(
        "Invalid URL",
        "Target must be a percent-encoded absolute http(s) URL",
    )
}

/// Forward a request to an allowlisted upstream, serving GETs from cache when possible.
pub async fn forward(state: &AppState, target: ProxyTarget, request: Request<Body>) -> GatewayResult<Response> {
    let path = request.uri().path().to_string();

    if !state.allowlist.is_allowed(&target.host) {
        tracing::warn!(host = %target.host, path = %path, "Rejected proxy to host outside allowlist");
        return Err(GatewayError::InvalidHost {
            host: target.host,
            allowed: state.allowlist.hosts().to_vec(),
            path,
        });
    }

    let (parts, body) = request.into_parts();
    let cacheable = parts.method == Method::GET && state.cache_enabled;

    if cacheable {
        match state.cache.get(&target.url).await {
            Ok(Some(cached)) => {
                tracing::debug!(url = %target.url, "Cache hit");
                return response::from_cache(&cached);
            }
            Ok(None) => tracing::debug!(url = %target.url, "Cache miss"),
            Err(e) => tracing::warn!(url = %target.url, error = %e, "Cache lookup failed, forwarding"),
        }
    }

    let body = if parts.method == Method::GET || parts.method == Method::HEAD {
        Bytes::new()
    } else {
        read_body(body, state.max_body_size).await?
    };

    let upstream_request = UpstreamRequest {
        method: parts.method.clone(),
        url: target.url.clone(),
        headers: forward_request_headers(&parts.headers, &state.user_agent),
        body,
    };
    let upstream = with_deadline(
        &target.url,
        state.upstream_timeout,
        state.upstream.fetch(upstream_request),
    )
    .await?;

    if cacheable && upstream.status.is_success() {
        match CachedResponse::from_upstream(upstream.status.as_u16(), &upstream.headers, &upstream.body) {
            Some(entry) => {
                state.cache.spawn_put(target.url.clone(), entry);
            }
            None => tracing::debug!(url = %target.url, "Binary body, not cached"),
        }
    }

    Ok(response::from_upstream(upstream, state.cache.ttl()))
}
