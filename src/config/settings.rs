use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use crate::config::env::{self, EnvKey};

pub const DEFAULT_QUEUE_KEY: &str = "video_jobs";

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub database_url: String,
    pub redis_url: String,
    pub queue_key: String,
    pub minio_url: String,
    pub minio_bucket: String,
    pub minio_region: String,
    pub minio_access_key: String,
    pub minio_secret_key: String,
    pub upload_dir: PathBuf,
    pub work_dir: PathBuf,
    pub transcoder_bin: String,
    pub transcode_timeout_secs: u64,
    pub segment_seconds: u32,
    pub worker_concurrency: usize,
    pub queue_poll_secs: u64,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn new() -> Result<Self, std::env::VarError> {
        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 8080),
            database_url: env::get(EnvKey::DatabaseUrl)?,
            redis_url: env::get(EnvKey::RedisUrl)?,
            queue_key: env::get_or(EnvKey::QueueKey, DEFAULT_QUEUE_KEY),
            minio_url: env::get(EnvKey::MinioUrl)?,
            minio_bucket: env::get(EnvKey::MinioBucket)?,
            minio_region: env::get_or(EnvKey::MinioRegion, "us-east-1"),
            minio_access_key: env::get(EnvKey::MinioAccessKey)?,
            minio_secret_key: env::get(EnvKey::MinioSecretKey)?,
            upload_dir: PathBuf::from(env::get_or(EnvKey::UploadDir, "/app/uploads")),
            work_dir: PathBuf::from(env::get_or(EnvKey::WorkDir, "/tmp/streamify")),
            transcoder_bin: env::get_or(EnvKey::TranscoderBin, "ffmpeg"),
            transcode_timeout_secs: env::get_parsed(EnvKey::TranscodeTimeoutSecs, 3600),
            segment_seconds: env::get_parsed(EnvKey::SegmentSeconds, 10),
            worker_concurrency: env::get_parsed(EnvKey::WorkerConcurrency, 1).max(1),
            queue_poll_secs: env::get_parsed(EnvKey::QueuePollSecs, 5).max(1),
            max_upload_bytes: env::get_parsed(EnvKey::MaxUploadBytes, 2 * 1024 * 1024 * 1024),
        })
    }

    pub fn worker(&self) -> WorkerConfig {
        WorkerConfig {
            upload_dir: self.upload_dir.clone(),
            work_dir: self.work_dir.clone(),
            poll_interval: Duration::from_secs(self.queue_poll_secs),
        }
    }
}

/// Filesystem layout and polling cadence for one transcode worker.
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub upload_dir: PathBuf,
    pub work_dir: PathBuf,
    pub poll_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("/app/uploads"),
            work_dir: PathBuf::from("/tmp/streamify"),
            poll_interval: Duration::from_secs(5),
        }
    }
}
