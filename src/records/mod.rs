//! Structured record storage.
//!
//! # Data Flow
//! ```text
//! PUT /kv/chapter/{id} ─┐
//! POST /kv/populate ────┼─→ store.rs (range check → validate → stamp → put)
//! GET /kv/chapter/{id} ─┤                              → KvStore "chapter:{id}"
//! GET /kv/status ───────┘
//! ```
//!
//! # Design Decisions
//! - Ids are range-checked before storage is touched
//! - Records are write-once-per-key; later writes overwrite, no versions
//! - No delete and no listing; status samples a fixed set of ids

pub mod store;
pub mod types;

pub use store::RecordStore;
pub use types::{
    BulkReport, ChapterId, ChapterStatus, PutAck, Record, RecordMetadata, StatusReport,
    MAX_CHAPTER, MIN_CHAPTER,
};
