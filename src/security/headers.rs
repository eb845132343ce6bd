//! Header hygiene for forwarded traffic.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Drop client identity headers (host, origin, referer) and accept-encoding before forwarding
//! - Drop upstream CORS headers so the gateway's policy is the only one

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

/// Connection-scoped headers that must not be forwarded.
pub const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

// accept-encoding is dropped so upstream bodies arrive uncompressed and cacheable
const DROPPED_REQUEST: [HeaderName; 5] = [
    header::HOST,
    header::ORIGIN,
    header::REFERER,
    header::CONTENT_LENGTH,
    header::ACCEPT_ENCODING,
];

/// Headers sent upstream for a client request.
///
/// The gateway's User-Agent always replaces the client's; `Accept` defaults to JSON.
pub fn forward_request_headers(incoming: &HeaderMap, user_agent: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in incoming {
        if HOP_BY_HOP.contains(name) || DROPPED_REQUEST.contains(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    if let Ok(ua) = HeaderValue::from_str(user_agent) {
        headers.insert(header::USER_AGENT, ua);
    }
    headers
        .entry(header::ACCEPT)
        .or_insert(HeaderValue::from_static("application/json"));
    headers
}

/// Headers returned to the client from an upstream response.
pub fn response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in upstream {
        if HOP_BY_HOP.contains(name)
            || *name == header::CONTENT_LENGTH
            || name.as_str().starts_with("access-control-")
        {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_request_headers() {
        let mut incoming = HeaderMap::new();
        incoming.insert(header::HOST, HeaderValue::from_static("gateway.example"));
        incoming.insert(header::ORIGIN, HeaderValue::from_static("https://app.example"));
        incoming.insert(header::REFERER, HeaderValue::from_static("https://app.example/x"));
        incoming.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        incoming.insert(header::USER_AGENT, HeaderValue::from_static("browser"));
        incoming.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"));
        incoming.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip, br"));

        let out = forward_request_headers(&incoming, "edge-gateway/test");
        assert!(out.get(header::HOST).is_none());
        assert!(out.get(header::ORIGIN).is_none());
        assert!(out.get(header::REFERER).is_none());
        assert!(out.get(header::CONNECTION).is_none());
        assert!(out.get(header::ACCEPT_ENCODING).is_none());
        assert_eq!(out[header::USER_AGENT], "edge-gateway/test");
        assert_eq!(out[header::ACCEPT], "application/json");
        assert_eq!(out[header::AUTHORIZATION], "Bearer t");
    }

    #[test]
    fn test_client_accept_is_kept() {
        let mut incoming = HeaderMap::new();
        incoming.insert(header::ACCEPT, HeaderValue::from_static("audio/mpeg"));
        let out = forward_request_headers(&incoming, "ua");
        assert_eq!(out[header::ACCEPT], "audio/mpeg");
    }

    #[test]
    fn test_response_headers() {
        let mut upstream = HeaderMap::new();
        upstream.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        upstream.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        upstream.insert(header::CONTENT_LENGTH, HeaderValue::from_static("10"));
        upstream.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("https://x"));

        let out = response_headers(&upstream);
        assert_eq!(out.len(), 1);
        assert_eq!(out[header::CONTENT_TYPE], "application/json");
    }
}
