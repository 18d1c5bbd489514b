use std::path::PathBuf;

use anyhow::Context;
use tracing::info;

use meetscan::config::{default_config_path, load_config};
use meetscan::Database;
use meetscan_server::{build_router, AppState};

/// Usage: `meetscan-server [CONFIG_PATH]`. Without an argument the path
/// comes from `MEETSCAN_CONFIG` or defaults to `~/.meetscan/config.json`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = match std::env::args_os().nth(1) {
        Some(path) => PathBuf::from(path),
        None => default_config_path()?,
    };
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    meetscan::logging::init(&config.logging)?;
    info!(config = %config_path.display(), "meetscan-server starting");

    let db = Database::from_config(&config.database)?;

    let bind = config.server.bind.clone();
    let app = build_router(AppState::new(db, config));

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("meetscan-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
