use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::info;

use streamify::bootstrap::{connect_services, init_tracing, shutdown_signal};
use streamify::config::settings::AppConfig;
use streamify::infrastructure::db::pool::run_migrations;
use streamify::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    info!("Starting server...");

    let config = AppConfig::new().context("Missing required configuration")?;
    let services = connect_services(&config, 10).await?;
    run_migrations(&services.db)
        .await
        .context("Failed to run database migrations")?;

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.upload_dir.display()))?;

    let addr = format!("0.0.0.0:{}", config.server_port);
    let state = AppState::new(
        config,
        Arc::new(services.db),
        Arc::new(services.queue),
        Arc::new(services.storage),
    );
    let app = streamify::app::create_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
