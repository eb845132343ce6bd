//! Upstream fetching.
//!
//! # Data Flow
//! ```text
//! proxy handler
//!     → UpstreamRequest (method, absolute URL, filtered headers, body)
//!     → resilience::timeouts::with_deadline
//!     → Upstream::fetch (client.rs: reqwest)
//!     → UpstreamResponse (status, headers, buffered body)
//! ```
//!
//! # Design Decisions
//! - Bodies are buffered so successful GETs can be cached
//! - The trait is the seam for counting or faking upstream calls

pub mod client;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};

use crate::error::GatewayResult;

pub use client::HttpUpstream;

/// A request to forward.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// A fully buffered upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Something that can answer forwarded requests.
#[async_trait]
pub trait Upstream: Send + Sync + 'static {
    async fn fetch(&self, request: UpstreamRequest) -> GatewayResult<UpstreamResponse>;
}
