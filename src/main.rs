//! Client IP echo service.
//!
//! ```text
//!   Client ──▶ CDN / proxies ──▶ ┌──────────────────────────────────────┐
//!                                │ request id → timeout → real ip →     │
//!                                │ trace span → unpanic → handler       │
//!                                └──────────────────────────────────────┘
//! ```
//!
//! Every request is answered with the client address the resolver settled on.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use realip::config::{load_config, ServiceConfig};
use realip::http::HttpServer;
use realip::lifecycle::{signals, Shutdown};
use realip::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "realip")]
#[command(about = "Echo service that resolves the real client IP behind proxies", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?args.config,
        "realip starting"
    );
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        metrics_enabled = config.observability.metrics_enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
