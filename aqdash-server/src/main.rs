//! aqdash-server - air-quality dashboard API
//!
//! Serves sensor list, map markers, 24-hour chart series and the advisory
//! banner computed from the remote sensor feed.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use aqdash_common::config::{CliOverrides, Settings};
use aqdash_common::time::SystemClock;
use aqdash_common::{FeedCache, HttpFeedSource};
use aqdash_server::refresh::spawn_refresh_task;
use aqdash_server::{build_router, AppState};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for aqdash-server
#[derive(Parser, Debug)]
#[command(name = "aqdash-server")]
#[command(about = "Air-quality dashboard API")]
#[command(version)]
struct Args {
    /// Address to listen on (host:port)
    #[arg(short, long)]
    bind: Option<String>,

    /// Port to listen on; replaces the port of the bind address
    #[arg(short, long)]
    port: Option<u16>,

    /// Sensor feed URL
    #[arg(long)]
    feed_url: Option<String>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serve cached snapshots younger than this many seconds
    #[arg(long)]
    max_age_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings = Settings::resolve(&CliOverrides {
        config_path: args.config,
        feed_url: args.feed_url,
        bind_addr: args.bind,
        port: args.port,
        cache_max_age_secs: args.max_age_secs,
    })
    .context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "aqdash_server={level},aqdash_common={level},tower_http=info",
                    level = settings.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting aqdash-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &settings.config_file {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file found; using defaults"),
    }
    for warning in &settings.warnings {
        warn!("{}", warning);
    }
    let source = HttpFeedSource::new(settings.feed_url.clone(), settings.fetch_timeout)
        .context("Failed to create feed client")?;
    info!("Feed URL: {}", source.url());
    let cache = Arc::new(FeedCache::new(
        Arc::new(source),
        Arc::new(SystemClock),
        settings.denylist.clone(),
    ));

    if let Some(interval) = settings.refresh_interval {
        info!("Scheduled refresh every {}s", interval.as_secs());
        spawn_refresh_task(Arc::clone(&cache), interval);
    }

    let addr: SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address: {}", settings.bind_addr))?;

    let state = AppState::new(cache, settings);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("aqdash-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
