use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use common::storage::filesystem::FilesystemStorage;
use tracing::info;
use tracing_subscriber::{EnvFilter, prelude::*};

use places_server::config::AppConfig;
use places_server::database::init_db;
use places_server::service::TracingObserver;
use places_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,places_server=debug,sqlx=warn"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = init_db(&config.database)
        .await
        .context("Failed to connect to the database")?;

    // Uploads are size-checked before normalization.
    let storage = FilesystemStorage::new(PathBuf::from(&config.storage.root), u64::MAX)
        .await
        .context("Failed to initialize media storage")?;
    info!(root = %config.storage.root, "Media storage ready");

    let listener = tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| {
            format!(
                "Failed to bind {}:{}",
                config.server.host, config.server.port
            )
        })?;
    let addr = listener.local_addr()?;

    let state = AppState {
        db,
        config: Arc::new(config),
        storage: Arc::new(storage),
        observer: Arc::new(TracingObserver),
    };

    let app = places_server::build_router(state);

    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
