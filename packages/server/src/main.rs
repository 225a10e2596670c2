use std::sync::Arc;

use anyhow::Context;
use judge::Judge0Client;
use server::config::AppConfig;
use server::state::AppState;
use server::{build_router, database, seed};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    seed::seed_role_permissions(&db).await?;
    seed::ensure_indexes(&db).await?;

    let judge = Judge0Client::new(config.judge.clone()).context("Failed to build judge client")?;
    info!(base_url = %config.judge.base_url, "Judge client ready");

    let shutdown = CancellationToken::new();
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState {
        db,
        config,
        judge: Arc::new(judge),
        shutdown: shutdown.clone(),
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutting down");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}
