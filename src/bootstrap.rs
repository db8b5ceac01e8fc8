//! Startup shared by the API server and the worker binary. Every failure here
//! is fatal.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::settings::AppConfig;
use crate::infrastructure::db::pool::{DbPool, connect_to_db};
use crate::infrastructure::queue::RedisQueue;
use crate::infrastructure::redis::client::RedisService;
use crate::infrastructure::storage::s3::StorageService;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("streamify=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub struct Services {
    pub db: DbPool,
    pub queue: RedisQueue,
    pub storage: StorageService,
}

pub async fn connect_services(config: &AppConfig, db_connections: u32) -> anyhow::Result<Services> {
    let db = connect_to_db(&config.database_url, db_connections)
        .await
        .context("Failed to connect to Postgres")?;

    let redis = RedisService::new(&config.redis_url)
        .await
        .context("Failed to connect to Redis")?;
    let queue = RedisQueue::new(redis, config.queue_key.clone());
    info!("✅ Using queue '{}'", queue.key());

    let storage = StorageService::new(
        &config.minio_url,
        &config.minio_region,
        &config.minio_bucket,
        &config.minio_access_key,
        &config.minio_secret_key,
    )
    .await;
    storage
        .check_bucket()
        .await
        .context("Object storage bucket is not reachable")?;

    Ok(Services { db, queue, storage })
}

/// Resolves on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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
