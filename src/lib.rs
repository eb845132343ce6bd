//! Edge caching gateway library.
//!
//! Proxies allowlisted upstream APIs with a response cache, and serves
//! pre-built chapter records from a key-value store.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod records;
pub mod resilience;
pub mod routing;
pub mod security;
pub mod store;
pub mod upstream;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

pub use config::schema::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;

/// Current time truncated to whole milliseconds.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// `at` as an RFC 3339 string with millisecond precision, e.g. `2026-01-01T00:00:00.000Z`.
pub fn to_rfc3339_millis(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time as an RFC 3339 string with millisecond precision.
pub fn now_rfc3339() -> String {
    to_rfc3339_millis(&Utc::now())
}
