//! msub-export - Manuscript export and delivery service
//!
//! Assembles one MECA package per submission from stored files and
//! generated metadata artifacts, delivers it to every configured
//! destination, and records the downstream system's import verdict.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};

use msub_common::config::Config;
use msub_export::delivery::PackageStore;
use msub_export::export::PackageAssembler;
use msub_export::services::{LocalFileStore, PeopleApiClient, RelayMailer};
use msub_export::AppState;

/// Command-line arguments for msub-export
#[derive(Parser, Debug)]
#[command(name = "msub-export")]
#[command(about = "Manuscript export and delivery service")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "MSUB_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides configuration)
    #[arg(short, long, env = "MSUB_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting msub-export v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.service.port = port;
    }
    let config = Arc::new(config);

    let pool = msub_common::db::init_database(&config.database.path).await?;
    info!("Database: {}", config.database.path.display());

    let files = Arc::new(LocalFileStore::new(&config.uploads.dir));
    let people = Arc::new(
        PeopleApiClient::new(&config.people_api.base_url, &config.people_api.token)
            .context("Failed to build people API client")?,
    );
    let mailer = Arc::new(RelayMailer::new(&config.mail).context("Failed to build mailer")?);
    let store = Arc::new(
        PackageStore::from_config(&config.delivery).context("Failed to build package store")?,
    );
    if store.is_empty() {
        warn!("No delivery destinations configured; exports will fail until one is added");
    } else {
        info!("Delivery destinations: {}", store.len());
    }

    let assembler = Arc::new(PackageAssembler::new(
        pool.clone(),
        files,
        people,
        config.transfer.clone(),
    ));

    let state = AppState::new(pool, config.clone(), assembler, store, mailer);
    let app = msub_export::build_router(state);

    let host = config
        .service
        .host
        .parse()
        .context("Invalid service host")?;
    let addr = SocketAddr::new(host, config.service.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("msub-export listening on http://{}", addr);
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
