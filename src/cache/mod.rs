//! Proxied response cache.
//!
//! # Data Flow
//! ```text
//! GET proxy request
//!     → response.rs lookup "proxy:{targetUrl}"
//!     → hit: replay status, stored headers, body (X-Cache: HIT)
//!     → miss: upstream fetch → response to client (X-Cache: MISS)
//!                            → 2xx: spawned put with TTL
//! ```
//!
//! # Design Decisions
//! - Only GET + 2xx responses are stored
//! - Expiry belongs to the backing store's TTL
//! - Cache writes never delay the client response

pub mod response;

pub use response::{BodyEncoding, CachedResponse, ResponseCache, CACHED_HEADERS};
