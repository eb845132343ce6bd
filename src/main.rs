use std::path::PathBuf;

use clap::Parser;

use edge_gateway::config::load_config;
use edge_gateway::lifecycle::{Gateway, Shutdown};
use edge_gateway::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "edge-gateway")]
#[command(about = "Edge caching gateway with a chapter record store", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        allowed_hosts = ?config.proxy.allowed_hosts,
        cache_ttl_secs = config.cache.ttl_secs,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    let gateway = Gateway::bind(config).await?;
    tracing::info!(address = %gateway.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();
    gateway.serve(shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
