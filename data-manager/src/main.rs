//! Portfolio Data Manager: local REST editor for the site's data files
//!
//! Each content category (personal info, education, experience, skills,
//! projects, travel, activities) lives in one TypeScript module under the
//! site's data directory. This service reads those modules with a literal
//! parser, and rewrites them on PUT after taking a timestamped backup.
//! Intended for a single operator on localhost.

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod backup;
mod category;
mod codec;
mod config;
mod error;
mod store;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .compact()
        .init();

    info!("Portfolio Data Manager v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = config::load_config()?;
    let data_dir = &config.storage.data_dir;
    if !data_dir.is_dir() {
        warn!(
            "Data directory {} does not exist; reads will fail until it does",
            data_dir.display()
        );
    }

    let backups = backup::BackupWriter::new(config.storage.backup_dir.clone());
    info!(
        "Data dir: {}, backup dir: {}",
        data_dir.display(),
        backups.backup_dir().display()
    );
    let store = store::DataFileStore::new(data_dir.clone(), backups);
    let app = api::router(api::AppState::new(store));

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Data Manager API running on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Data Manager server failed")?;

    info!("Data Manager shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
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
}
