//! andon-status - factory status board backend
//!
//! Keeps the telemetry snapshot and the master name tables current in the
//! background and serves the aggregated per-machine status as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use andon_common::config::{self, CONFIG_ENV_VAR};
use andon_common::db::{self, SourceQualifier};
use andon_common::time::SystemClock;
use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use andon_status::source::SqlAndonSource;
use andon_status::telemetry::JsonFileLoader;
use andon_status::StatusBoard;

/// Command-line arguments for andon-status
#[derive(Parser, Debug)]
#[command(name = "andon-status")]
#[command(about = "Factory status board backend")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Listen address, overrides [http] bind
    #[arg(short, long, env = "ANDON_BIND")]
    bind: Option<String>,

    /// Status source URL, overrides [source] database_url
    #[arg(long, env = "ANDON_DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = config::resolve_config_path(args.config.as_deref());
    let (mut config, origin) = config::load_config(config_path.as_deref())
        .context("Failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.http.bind = bind;
    }
    if let Some(url) = args.database_url {
        config.source.database_url = url;
    }

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting andon-status v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    // Tracing needs the configured level, so the config origin is reported here
    origin.log();

    let pool = db::connect(&config.source.database_url)
        .await
        .context("Failed to connect to status source")?;
    let source = Arc::new(SqlAndonSource::new(
        pool,
        SourceQualifier::from_config(&config.source),
    ));
    let loader = Arc::new(JsonFileLoader::from_config(&config.telemetry));
    info!(
        "Telemetry root: {} ({} patterns)",
        config.telemetry.content_root.display(),
        loader.patterns().len()
    );

    let board = StatusBoard::new(
        &config,
        source.clone(),
        source,
        loader,
        Arc::new(SystemClock),
    );

    let cancel = CancellationToken::new();
    let handles = board.spawn(&cancel);

    let app = andon_status::build_router(board.app_state());
    let listener = tokio::net::TcpListener::bind(&config.http.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.http.bind))?;
    info!("Listening on http://{}", config.http.bind);

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            shutdown.cancel();
        })
        .await
        .context("Server error")?;

    // Server may also stop on its own; make sure the loops follow
    cancel.cancel();
    for handle in handles {
        if let Err(e) = handle.await {
            warn!("Background task ended abnormally: {}", e);
        }
    }

    info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
