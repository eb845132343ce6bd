//! Backing key-value store.
//!
//! # Data Flow
//! ```text
//! records/store.rs ──┐
//!                    ├─→ KvStore (get / put with optional TTL)
//! cache/response.rs ─┘        → memory.rs (DashMap + expiry instants)
//!                             → snapshot file (optional, JSON)
//! ```
//!
//! # Design Decisions
//! - The store is the only shared mutable resource between requests
//! - Single-key operations are atomic; last write wins
//! - TTL is enforced by the store, callers never check expiry themselves
//! - No listing operation: callers address keys directly

pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryKv;

/// Errors raised by a key-value backend.
#[derive(Debug, Error)]
pub enum KvError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("value could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type KvResult<T> = Result<T, KvError>;

/// A namespace of string keys to string values.
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    /// Read a value. Expired entries are reported as absent.
    async fn get(&self, key: &str) -> KvResult<Option<String>>;

    /// Write a value, replacing any previous one. `ttl` of `None` never expires.
    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> KvResult<()>;
}
