//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Cross-origin policy.
    pub cors: CorsConfig,

    /// Proxied response cache.
    pub cache: CacheConfig,

    /// Upstream proxy settings (allowlist, scheme).
    pub proxy: ProxySettings,

    /// Structured record store.
    pub records: RecordsConfig,

    /// Backing key-value store maintenance.
    pub store: StoreConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request limits.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8787").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8787".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Whole-request timeout in seconds.
    pub request_secs: u64,

    /// Deadline for a single upstream fetch in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upstream_secs: 5,
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to read responses. `*` allows any origin.
    pub allowed_origins: Vec<String>,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            max_age_secs: 86_400,
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache successful GET responses from upstream.
    pub enabled: bool,

    /// Time-to-live for cached responses in seconds.
    pub ttl_secs: u64,

    /// Snapshot file for the response namespace, written on shutdown.
    pub snapshot_path: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 3600,
            snapshot_path: None,
        }
    }
}

/// Upstream proxy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxySettings {
    /// Hostnames the gateway may forward to.
    pub allowed_hosts: Vec<String>,

    /// Scheme used for host-prefixed proxy paths.
    pub upstream_scheme: String,

    /// User-Agent sent to upstream hosts.
    pub user_agent: String,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            allowed_hosts: vec![
                "api.quranwbw.com".to_string(),
                "static.quranwbw.com".to_string(),
                "audios.quranwbw.com".to_string(),
                "everyayah.com".to_string(),
            ],
            upstream_scheme: "https".to_string(),
            user_agent: concat!("edge-gateway/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Record store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RecordsConfig {
    /// Namespace label reported by the status route.
    pub namespace: String,

    /// Chapters probed by the status route.
    pub status_sample: Vec<i64>,

    /// Snapshot file for the record namespace, loaded at startup and written on shutdown.
    pub snapshot_path: Option<String>,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            namespace: "KV_QURAN_DATA".to_string(),
            status_sample: vec![1, 2, 18, 67, 114],
            snapshot_path: None,
        }
    }
}

/// Backing store maintenance.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Interval between expired-key sweeps in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 16 * 1024 * 1024, // full-text populate payloads are large
        }
    }
}
