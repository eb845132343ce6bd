//! Cached upstream responses keyed by target URL.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use tokio::task::JoinHandle;

use crate::error::GatewayResult;
use crate::observability::metrics;
use crate::store::{KvError, KvStore};

/// Upstream headers worth replaying on a hit.
pub const CACHED_HEADERS: [&str; 5] = [
    "content-type",
    "cache-control",
    "etag",
    "last-modified",
    "content-language",
];

/// How `CachedResponse::data` encodes the original body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    /// `data` is the upstream JSON text, byte for byte.
    Json,
    /// `data` is a JSON string holding the upstream text.
    Text,
}

/// A stored copy of a successful upstream GET response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    pub data: Box<RawValue>,
    pub encoding: BodyEncoding,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    /// Write time, milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl CachedResponse {
    /// Capture an upstream response. Returns `None` for bodies that are not UTF-8.
    pub fn from_upstream(status: u16, headers: &HeaderMap, body: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(body).ok()?.to_owned();

        // surrounding whitespace is trimmed by RawValue, so such bodies go in as text
        let (data, encoding) = match RawValue::from_string(text.clone()) {
            Ok(raw) if raw.get().len() == text.len() => (raw, BodyEncoding::Json),
            _ => (serde_json::value::to_raw_value(&text).ok()?, BodyEncoding::Text),
        };

        let headers = CACHED_HEADERS
            .iter()
            .filter_map(|name| {
                headers
                    .get(*name)
                    .and_then(|v| v.to_str().ok())
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect();

        Some(Self {
            data,
            encoding,
            status,
            headers,
            timestamp: chrono::Utc::now().timestamp_millis(),
        })
    }

    /// The original body bytes.
    pub fn body(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self.encoding {
            BodyEncoding::Json => Ok(self.data.get().as_bytes().to_vec()),
            BodyEncoding::Text => serde_json::from_str::<String>(self.data.get()).map(String::into_bytes),
        }
    }
}

/// Response cache over the backing key-value namespace.
#[derive(Clone)]
pub struct ResponseCache {
    kv: Arc<dyn KvStore>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(kv: Arc<dyn KvStore>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    /// Configured entry lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Keys are the raw target URL; equivalent URLs with reordered queries are distinct.
    fn key(target_url: &str) -> String {
        format!("proxy:{}", target_url)
    }

    /// Look up a target URL. Entries that no longer decode count as misses.
    pub async fn get(&self, target_url: &str) -> GatewayResult<Option<CachedResponse>> {
        let Some(raw) = self.kv.get(&Self::key(target_url)).await? else {
            metrics::record_cache_lookup("miss");
            return Ok(None);
        };

        match serde_json::from_str::<CachedResponse>(&raw) {
            Ok(cached) => {
                metrics::record_cache_lookup("hit");
                Ok(Some(cached))
            }
            Err(e) => {
                tracing::warn!(url = %target_url, error = %e, "Discarding undecodable cache entry");
                metrics::record_cache_lookup("miss");
                Ok(None)
            }
        }
    }

    /// Store a response for `ttl`.
    pub async fn put(
        &self,
        target_url: &str,
        response: &CachedResponse,
        ttl: Duration,
    ) -> GatewayResult<()> {
        let value = serde_json::to_string(response).map_err(KvError::from)?;
        self.kv.put(&Self::key(target_url), value, Some(ttl)).await?;
        Ok(())
    }

    /// Store a response in the background with the configured TTL.
    ///
    /// The write outlives the request that triggered it.
    pub fn spawn_put(&self, target_url: String, response: CachedResponse) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            match cache.put(&target_url, &response, cache.ttl).await {
                Ok(()) => tracing::debug!(url = %target_url, "Cached upstream response"),
                Err(e) => tracing::warn!(url = %target_url, error = %e, "Cache write failed"),
            }
        })
    }
}
