//! revdash-api - review dashboard service
//!
//! Serves normalized guest reviews, aggregate statistics and the approval
//! action for the manager dashboard, plus the approved-only public feed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use revdash_api::{build_router, open_approval_store, AppState};
use revdash_common::config::{resolve_config_path, TomlConfig};

/// Command-line arguments for revdash-api
#[derive(Parser, Debug)]
#[command(name = "revdash-api")]
#[command(about = "Guest review dashboard service")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = "REVDASH_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overrides [server] bind
    #[arg(short, long)]
    bind: Option<String>,

    /// Fallback review dataset, overrides [dataset] path
    #[arg(short, long)]
    dataset: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing so [logging] level can seed the filter
    let config_path = resolve_config_path(args.config.as_deref());
    let (mut config, origin) = TomlConfig::load_or_default(config_path.as_deref());
    config.apply_env_overrides();
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(dataset) = args.dataset {
        config.dataset.path = dataset;
    }

    let level = &config.logging.level;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "revdash_api={level},revdash_common={level},tower_http={level}",
                    level = level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting revdash-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    origin.log();
    info!("Review dataset: {}", config.dataset.path.display());

    let approvals = open_approval_store(&config)
        .await
        .context("Failed to open approval store")?;

    let bind = config.server.bind.clone();
    let state = AppState::new(config, approvals);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("revdash-api listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

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
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
