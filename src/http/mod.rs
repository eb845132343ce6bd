//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, body buffering)
//!     → middleware/cors.rs (preflight short-circuit, CORS on every response)
//!     → [routing table picks the route kind]
//!     → kv.rs | proxy.rs | health.rs
//!     → response.rs (upstream/cached response assembly)
//!     → Send to client
//! ```

pub mod health;
pub mod kv;
pub mod middleware;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::X_CACHE;
pub use server::{AppState, HttpServer};
