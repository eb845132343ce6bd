//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the record and response namespaces (loading snapshots)
//! - Build the upstream client and start the metrics endpoint
//! - Bind the listener, then serve until shutdown
//! - Stop the sweepers and persist snapshots on the way out
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::{AppState, HttpServer};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::store::{KvError, MemoryKv};
use crate::upstream::HttpUpstream;

const RESPONSES_NAMESPACE: &str = "responses";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to open store: {0}")]
    Store(#[from] KvError),

    #[error("failed to build upstream client: {0}")]
    Upstream(#[from] GatewayError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// A bound, ready-to-serve gateway.
pub struct Gateway {
    server: HttpServer,
    listener: TcpListener,
    records: MemoryKv,
    responses: MemoryKv,
    sweep_interval: Duration,
}

fn open_store(name: &str, snapshot: Option<&str>) -> Result<MemoryKv, KvError> {
    match snapshot {
        Some(path) => MemoryKv::with_snapshot(name, path),
        None => Ok(MemoryKv::new(name)),
    }
}

impl Gateway {
    /// Initialize every subsystem and bind the listener.
    pub async fn bind(config: GatewayConfig) -> Result<Self, StartupError> {
        let records = open_store(
            &config.records.namespace,
            config.records.snapshot_path.as_deref(),
        )?;
        let responses = open_store(RESPONSES_NAMESPACE, config.cache.snapshot_path.as_deref())?;

        let upstream = HttpUpstream::new(Duration::from_secs(config.timeouts.upstream_secs))?;

        if config.observability.metrics_enabled {
            match config.observability.metrics_address.parse::<SocketAddr>() {
                Ok(addr) => metrics::init_metrics(addr),
                Err(e) => tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    error = %e,
                    "Failed to parse metrics address"
                ),
            }
        }

        let listener = TcpListener::bind(&config.listener.bind_address)
            .await
            .map_err(|source| StartupError::Bind {
                address: config.listener.bind_address.clone(),
                source,
            })?;

        let state = AppState::new(
            &config,
            Arc::new(records.clone()),
            Arc::new(responses.clone()),
            Arc::new(upstream),
        );
        let sweep_interval = Duration::from_secs(config.store.sweep_interval_secs);

        Ok(Self {
            server: HttpServer::new(config, state),
            listener,
            records,
            responses,
            sweep_interval,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until `shutdown` fires, then stop sweepers and save snapshots.
    pub async fn serve(self, shutdown: Shutdown) -> Result<(), StartupError> {
        let Self {
            server,
            listener,
            records,
            responses,
            sweep_interval,
        } = self;

        let sweepers = [records.clone(), responses.clone()]
            .map(|store| tokio::spawn(store.run_sweeper(sweep_interval, shutdown.subscribe())));

        let served = server.run(listener, shutdown.subscribe()).await;

        shutdown.trigger();
        for sweeper in sweepers {
            if let Err(e) = sweeper.await {
                tracing::warn!(error = %e, "Sweeper task ended abnormally");
            }
        }

        for store in [&records, &responses] {
            if let Err(e) = store.save_snapshot() {
                tracing::error!(namespace = %store.name(), error = %e, "Failed to save snapshot");
            }
        }

        served.map_err(StartupError::Serve)
    }
}
