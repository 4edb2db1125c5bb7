use std::sync::Arc;

use architex_api::app::{app, AppState};
use architex_api::config::config;
use architex_api::database::{seed, DatabaseManager};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, TOKEN_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Arc::new(config().clone());
    tracing::info!("Starting ArchiteX API in {:?} mode", config.environment);

    let db = DatabaseManager::connect(&config.database).await?;
    let state = AppState::new(config.clone(), db.clone())?;
    seed::initialise(&db, &state.users, &config.database).await?;

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("ArchiteX API listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await?;
    db.close().await;
    Ok(())
}
