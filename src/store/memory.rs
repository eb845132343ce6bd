//! In-process key-value store with native TTL and snapshot persistence.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time::{self, Instant};

use crate::observability::metrics;
use crate::store::{KvResult, KvStore};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// On-disk form of an entry. Expiry is stored as time remaining so a
/// snapshot stays meaningful across restarts.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEntry {
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ttl_remaining_ms: Option<u64>,
}

/// A concurrent key-value namespace backed by a `DashMap`.
///
/// Cloning is cheap and clones share the same data.
#[derive(Clone)]
pub struct MemoryKv {
    name: Arc<str>,
    inner: Arc<DashMap<String, Entry>>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryKv {
    /// Create an empty namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Arc::from(name.into()),
            inner: Arc::new(DashMap::new()),
            snapshot_path: None,
        }
    }

    /// Create a namespace that persists to `path`, loading it if the file exists.
    pub fn with_snapshot(name: impl Into<String>, path: impl AsRef<Path>) -> KvResult<Self> {
        let path = path.as_ref();
        let mut kv = Self::new(name);
        kv.snapshot_path = Some(path.to_path_buf());

        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let snapshot: HashMap<String, SnapshotEntry> = serde_json::from_reader(reader)?;
            let now = Instant::now();
            for (key, entry) in snapshot {
                let expires_at = entry
                    .ttl_remaining_ms
                    .map(|ms| now + Duration::from_millis(ms));
                kv.inner.insert(
                    key,
                    Entry {
                        value: entry.value,
                        expires_at,
                    },
                );
            }
            tracing::info!(
                namespace = %kv.name,
                keys = kv.inner.len(),
                path = %path.display(),
                "Loaded store snapshot"
            );
        }

        Ok(kv)
    }

    /// Namespace label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of keys currently held, including not-yet-swept expired ones.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Write live entries to the snapshot file, if one is configured.
    pub fn save_snapshot(&self) -> KvResult<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let now = Instant::now();
        let snapshot: HashMap<String, SnapshotEntry> = self
            .inner
            .iter()
            .filter(|r| !r.value().is_expired(now))
            .map(|r| {
                let entry = r.value();
                let ttl_remaining_ms = entry
                    .expires_at
                    .map(|at| at.saturating_duration_since(now).as_millis() as u64);
                (
                    r.key().clone(),
                    SnapshotEntry {
                        value: entry.value.clone(),
                        ttl_remaining_ms,
                    },
                )
            })
            .collect();

        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, &snapshot)?;
        tracing::info!(
            namespace = %self.name,
            keys = snapshot.len(),
            path = %path.display(),
            "Saved store snapshot"
        );
        Ok(())
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.inner.len();
        self.inner.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(self.inner.len());
        metrics::record_store_size(&self.name, self.inner.len());
        removed
    }

    /// Periodically purge expired entries until shutdown.
    pub async fn run_sweeper(self, interval: Duration, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = time::interval(interval);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.purge_expired();
                    if removed > 0 {
                        tracing::debug!(namespace = %self.name, removed, "Swept expired keys");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!(namespace = %self.name, "Sweeper received shutdown signal");
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        let now = Instant::now();
        let expired = match self.inner.get(key) {
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            // a concurrent put may have replaced the entry since the read
            self.inner.remove_if(key, |_, entry| entry.is_expired(now));
        }
        Ok(None)
    }

    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> KvResult<()> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.inner.insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }
}
