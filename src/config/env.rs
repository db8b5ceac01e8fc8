use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    DatabaseUrl,
    RedisUrl,
    QueueKey,
    MinioUrl,
    MinioBucket,
    MinioRegion,
    MinioAccessKey,
    MinioSecretKey,
    UploadDir,
    WorkDir,
    TranscoderBin,
    TranscodeTimeoutSecs,
    SegmentSeconds,
    WorkerConcurrency,
    QueuePollSecs,
    MaxUploadBytes,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::DatabaseUrl => "DATABASE_URL",
            EnvKey::RedisUrl => "REDIS_URL",
            EnvKey::QueueKey => "QUEUE_KEY",
            EnvKey::MinioUrl => "MINIO_ENDPOINT",
            EnvKey::MinioBucket => "MINIO_BUCKET_VIDEOS",
            EnvKey::MinioRegion => "AWS_REGION",
            EnvKey::MinioAccessKey => "AWS_ACCESS_KEY_ID",
            EnvKey::MinioSecretKey => "AWS_SECRET_ACCESS_KEY",
            EnvKey::UploadDir => "UPLOAD_DIR",
            EnvKey::WorkDir => "WORKER_WORK_DIR",
            EnvKey::TranscoderBin => "TRANSCODER_BIN",
            EnvKey::TranscodeTimeoutSecs => "TRANSCODE_TIMEOUT_SECS",
            EnvKey::SegmentSeconds => "HLS_SEGMENT_SECONDS",
            EnvKey::WorkerConcurrency => "WORKER_CONCURRENCY",
            EnvKey::QueuePollSecs => "QUEUE_POLL_SECS",
            EnvKey::MaxUploadBytes => "MAX_UPLOAD_BYTES",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
