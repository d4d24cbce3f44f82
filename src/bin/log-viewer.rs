//! Paginated browser for recorded transactions.

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use recording_proxy::config::{load_or_default, validate_config, ConfigError, ProxyConfig};
use recording_proxy::lifecycle::signals;
use recording_proxy::observability::logging;
use recording_proxy::recorder::RecordStore;
use recording_proxy::viewer;

#[derive(Parser)]
#[command(name = "log-viewer")]
#[command(about = "Browse transactions recorded by recording-proxy", long_about = None)]
struct Cli {
    /// TOML configuration file (shared with the proxy)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to bind to
    #[arg(short, long)]
    port: Option<u16>,

    /// Root directory of transaction records
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn load(cli: Cli) -> Result<ProxyConfig, ConfigError> {
    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.viewer.set_port(port);
    }
    if let Some(log_dir) = cli.log_dir {
        config.recording.log_dir = log_dir;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load(Cli::parse())?;
    logging::init(&config.observability.log_level);

    let store = RecordStore::new(&config.recording.log_dir);
    let app = viewer::router(store, config.viewer.page_size);

    let listener = TcpListener::bind(&config.viewer.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        log_dir = %config.recording.log_dir.display(),
        "Log viewer running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(signals::wait_for_signal())
        .await?;
    Ok(())
}
