//! Papermark edge router.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ http::server ──▶ routing::Dispatcher ──▶ RoutingDecision
//!                         │                   ▲
//!                         │                   │ session (app branch only)
//!                         │              session::decoder
//!                         ▼
//!              continue / rewrite ──▶ upstream app or analytics host
//!              redirect           ──▶ 307 / 308
//!              not found          ──▶ 404 page
//!
//!     Cross-cutting: config (file + env, hot reload), observability
//!     (tracing, Prometheus), security headers, lifecycle, admin API
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use papermark_edge::config::{load_config, load_from_env, ConfigWatcher};
use papermark_edge::lifecycle::signals::spawn_signal_listener;
use papermark_edge::lifecycle::Shutdown;
use papermark_edge::observability::{logging::init_logging, metrics::init_metrics};
use papermark_edge::{admin, HttpServer};

#[derive(Parser)]
#[command(name = "papermark-edge", version, about = "Host-based request router for Papermark")]
struct Args {
    /// TOML configuration file. Environment variables alone are used when it is missing.
    #[arg(short, long, env = "PAPERMARK_EDGE_CONFIG", default_value = "papermark-edge.toml")]
    config: PathBuf,

    /// Reload the configuration file when it changes.
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let from_file = args.config.exists();
    let config = if from_file {
        load_config(&args.config)?
    } else {
        load_from_env()?
    };

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "papermark-edge starting");
    tracing::info!(
        mode = ?config.mode,
        source = if from_file { "file" } else { "environment" },
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.app_address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config.clone())?;

    let shutdown = Arc::new(Shutdown::new());
    spawn_signal_listener(shutdown.clone());

    if config.admin.enabled {
        let admin_listener = TcpListener::bind(&config.admin.bind_address).await?;
        let state = server.state();
        let rx = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = admin::serve(admin_listener, state, rx).await {
                tracing::error!(error = %e, "Admin API stopped");
            }
        });
    }

    // The watcher handle must outlive the server.
    let (_watcher, updates) = if args.watch && from_file {
        let (watcher, updates) = ConfigWatcher::new(&args.config);
        (Some(watcher.run()?), Some(updates))
    } else {
        (None, None)
    };

    server.run(listener, updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
