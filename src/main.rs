//! Recording forwarding proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                 RECORDING PROXY                  │
//!   Client Request     │  ┌─────────┐   ┌──────────┐   ┌──────────────┐   │
//!   ───────────────────┼─▶│  http   │──▶│ routing  │──▶│   forward    │───┼──▶ Upstream
//!                      │  │ server  │   │ + header │   │  (reqwest)   │   │     API
//!                      │  └─────────┘   │  filter  │   └──────┬───────┘   │
//!                      │                └──────────┘          │           │
//!   Client Response    │  ┌──────────────────────────┐        │           │
//!   ◀──────────────────┼──│ capture: relay + capture │◀───────┘           │
//!                      │  └────────────┬─────────────┘                    │
//!                      │               ▼ (stream end)                     │
//!                      │  ┌──────────────────────────┐                    │
//!                      │  │ recorder: writer task →  │──▶ logs/YYYY/MM/DD │
//!                      │  │ date-sharded JSON files  │                    │
//!                      │  └──────────────────────────┘                    │
//!                      └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use recording_proxy::config::{load_or_default, validate_config, ConfigError, ProxyConfig};
use recording_proxy::http::HttpServer;
use recording_proxy::lifecycle::{signals, Shutdown};
use recording_proxy::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "recording-proxy")]
#[command(about = "Forwarding proxy that records every transaction to disk", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to bind to (keeps the configured host)
    #[arg(short, long)]
    port: Option<u16>,

    /// Number of worker threads
    #[arg(short, long)]
    workers: Option<usize>,

    /// Upstream base URL
    #[arg(long)]
    upstream: Option<String>,

    /// Root directory for transaction records
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let mut config = load_or_default(self.config.as_deref())?;
        if let Some(port) = self.port {
            config.listener.set_port(port);
        }
        if let Some(workers) = self.workers {
            config.listener.workers = workers;
        }
        if let Some(upstream) = self.upstream {
            config.upstream.base_url = upstream;
        }
        if let Some(log_dir) = self.log_dir {
            config.recording.log_dir = log_dir;
        }
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;
    logging::init(&config.observability.log_level);

    tracing::info!("recording-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        workers = config.listener.workers,
        upstream = %config.upstream.base_url,
        log_dir = %config.recording.log_dir.display(),
        "Configuration loaded"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.listener.workers)
        .enable_all()
        .build()?;

    runtime.block_on(serve(config))
}

async fn serve(config: ProxyConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Proxy is listening; point clients at http://<host>:<port>/api/v1"
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    HttpServer::new(config)?.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
