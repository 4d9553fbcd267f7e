//! Edge proxy gateway (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                 EDGE PROXY                   │
//!   Browser request       │  ┌─────────┐   ┌─────────┐   ┌────────────┐  │
//!   ──────────────────────┼─▶│  http   │──▶│ routing │──▶│    cors    │  │
//!                         │  │ server  │   │ classify│   │ preflight? │  │
//!                         │  └─────────┘   └─────────┘   └─────┬──────┘  │
//!                         │                                    │ forward │
//!                         │                                    ▼         │
//!   Browser response      │  ┌──────────┐  ┌─────────────┐  ┌─────────┐  │
//!   ◀─────────────────────┼──│ response │◀─│  upstream   │◀─│ + creds │──┼──▶ Upstream API
//!                         │  │relay+CORS│  │ client (1x) │  │         │  │
//!                         │  └──────────┘  └─────────────┘  └─────────┘  │
//!                         │                                              │
//!                         │  config · observability · lifecycle          │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use edge_proxy::config::{load_config, GatewayConfig};
use edge_proxy::lifecycle::{signals, Shutdown};
use edge_proxy::observability::{logging, metrics};
use edge_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "edge-proxy")]
#[command(about = "CORS-aware credential-injecting edge proxy", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, env = "EDGE_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Validate configuration and exit.
    #[arg(long)]
    check: bool,

    /// Override the configured log level.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    if cli.check {
        println!("Configuration OK");
        return Ok(());
    }

    logging::init_logging(&config.observability, cli.log_level.as_deref());
    tracing::info!("edge-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    log_config(&config);

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        if let Err(e) = metrics::init_metrics(addr) {
            tracing::error!(error = %e, "Failed to start metrics endpoint");
        }
    }

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let tls = config.listener.tls.clone();
    let bind_address: SocketAddr = config.listener.bind_address.parse()?;
    let server = HttpServer::new(&config)?;

    match tls {
        Some(tls) => server.run_tls(bind_address, &tls, shutdown.subscribe()).await?,
        None => {
            let listener = TcpListener::bind(bind_address).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");
            server.run(listener, shutdown.subscribe()).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Log the effective configuration. Credentials are reported by presence only.
fn log_config(config: &GatewayConfig) {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        upstream = %config.upstream.base_url,
        path_prefix = %config.upstream.path_prefix,
        allowed_origins = config.cors.allowed_origins.len(),
        upstream_timeout_secs = config.timeouts.upstream_secs,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );
    tracing::info!(
        client_id_present = config.credentials.client_id.is_present(),
        client_secret_present = config.credentials.client_secret.is_present(),
        "Upstream credentials"
    );
}
