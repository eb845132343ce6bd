//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (ordered route lookup)
//!     → matcher.rs (evaluate path conditions, capture params)
//!     → Return: RouteMatch { kind, param } or NoMatch (404)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (literal and prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (ordered by position)
//! - Methods are checked by the handler, so a wrong method yields 405 rather than 404

pub mod matcher;
pub mod router;

pub use router::{RouteKind, RouteMatch, RouteTable, KNOWN_ROUTES};
