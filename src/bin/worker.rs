use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use streamify::bootstrap::{connect_services, init_tracing, shutdown_signal};
use streamify::config::settings::AppConfig;
use streamify::infrastructure::queue::WorkQueue;
use streamify::infrastructure::transcoder::ffmpeg::{FfmpegTranscoder, TranscoderConfig};
use streamify::workers::transcoder::{TranscodeWorker, run_pool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    info!("🎥 Starting transcoder worker...");

    let config = AppConfig::new().context("Missing required configuration")?;
    let services = connect_services(&config, config.worker_concurrency as u32 + 1).await?;

    tokio::fs::create_dir_all(&config.work_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.work_dir.display()))?;

    match services.queue.len().await {
        Ok(depth) => info!("{} job(s) waiting on '{}'", depth, services.queue.key()),
        Err(e) => warn!("Failed to read queue depth: {}", e),
    }

    let transcoder = FfmpegTranscoder::new(TranscoderConfig::from_command_line(
        &config.transcoder_bin,
        config.segment_seconds,
        Duration::from_secs(config.transcode_timeout_secs),
    ));

    let worker = TranscodeWorker::new(
        Arc::new(services.db),
        Arc::new(services.queue),
        Arc::new(services.storage),
        Arc::new(transcoder),
        config.worker(),
    );

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_token.cancel();
    });

    info!("Running {} worker(s)", config.worker_concurrency);
    run_pool(worker, config.worker_concurrency, shutdown).await;
    info!("Transcoder worker stopped");

    Ok(())
}
