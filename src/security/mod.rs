//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (allowed origin, preflight headers)
//!     → allowlist.rs (proxy routes only: may this host be forwarded to?)
//!     → headers.rs (strip hop-by-hop and identity headers before forwarding)
//! ```
//!
//! # Design Decisions
//! - Fail closed: unknown upstream hosts are refused before any fetch
//! - The allowlist is fixed at startup
//! - No trust in client-supplied forwarding headers

pub mod allowlist;
pub mod cors;
pub mod headers;

pub use allowlist::HostAllowlist;
pub use cors::CorsPolicy;
