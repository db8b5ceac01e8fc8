//! Shared fixture: the whole pipeline wired to in-memory fakes and temporary
//! directories.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use streamify::config::settings::{AppConfig, WorkerConfig};
use streamify::modules::video::producer::{JobProducer, StagedUpload};
use streamify::state::AppState;
use streamify::testing::{MemoryQueue, MemoryStorage, MemoryVideoStore, ScriptedTranscoder};
use streamify::workers::transcoder::TranscodeWorker;

pub const OWNER: i64 = 7;

pub struct TestFixture {
    pub store: Arc<MemoryVideoStore>,
    pub queue: Arc<MemoryQueue>,
    pub storage: Arc<MemoryStorage>,
    pub transcoder: Arc<ScriptedTranscoder>,
    pub producer: JobProducer,
    pub worker: TranscodeWorker,
    pub config: AppConfig,
    /// Holds `uploads/` and `work/`.
    pub temp_dir: TempDir,
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with(MemoryVideoStore::new(), ScriptedTranscoder::succeeding(3))
    }

    pub fn with(store: MemoryVideoStore, transcoder: ScriptedTranscoder) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let store = Arc::new(store);
        let queue = Arc::new(MemoryQueue::new());
        let storage = Arc::new(MemoryStorage::new());
        let transcoder = Arc::new(transcoder);

        let producer = JobProducer::new(store.clone(), queue.clone(), config.upload_dir.clone());
        let worker = TranscodeWorker::new(
            store.clone(),
            queue.clone(),
            storage.clone(),
            transcoder.clone(),
            WorkerConfig {
                poll_interval: Duration::from_millis(50),
                ..config.worker()
            },
        );

        Self {
            store,
            queue,
            storage,
            transcoder,
            producer,
            worker,
            config,
            temp_dir,
        }
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.config.upload_dir.clone()
    }

    pub fn work_dir(&self) -> PathBuf {
        self.config.work_dir.clone()
    }

    /// Writes `contents` where the HTTP layer would have staged it.
    pub fn stage(&self, filename: &str, contents: &[u8]) -> StagedUpload {
        let staging = self.config.upload_dir.join(".staging");
        std::fs::create_dir_all(&staging).unwrap();
        let path = staging.join(uuid::Uuid::new_v4().simple().to_string());
        std::fs::write(&path, contents).unwrap();
        StagedUpload {
            path,
            filename: filename.to_string(),
        }
    }

    pub fn router(&self) -> Router {
        let state = AppState::new(
            self.config.clone(),
            self.store.clone(),
            self.queue.clone(),
            self.storage.clone(),
        );
        streamify::app::create_app(state)
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, owner: Option<i64>) -> TestResponse {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(owner) = owner {
            builder = builder.header("x-user-id", owner.to_string());
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn delete(&self, uri: &str, owner: i64) -> TestResponse {
        let request = Request::builder()
            .method("DELETE")
            .uri(uri)
            .header("x-user-id", owner.to_string())
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Posts a multipart body with a single field.
    pub async fn upload(&self, field: &str, filename: &str, contents: &[u8], owner: Option<i64>) -> TestResponse {
        let boundary = "streamify-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n").as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: video/mp4\r\n\r\n");
        body.extend_from_slice(contents);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/v1/videos")
            .header("content-type", format!("multipart/form-data; boundary={boundary}"));
        if let Some(owner) = owner {
            builder = builder.header("x-user-id", owner.to_string());
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }
}

fn test_config(temp_dir: &TempDir) -> AppConfig {
    AppConfig {
        server_port: 0,
        database_url: String::new(),
        redis_url: String::new(),
        queue_key: "video_jobs".to_string(),
        minio_url: String::new(),
        minio_bucket: "videos".to_string(),
        minio_region: "us-east-1".to_string(),
        minio_access_key: String::new(),
        minio_secret_key: String::new(),
        upload_dir: temp_dir.path().join("uploads"),
        work_dir: temp_dir.path().join("work"),
        transcoder_bin: "ffmpeg".to_string(),
        transcode_timeout_secs: 5,
        segment_seconds: 10,
        worker_concurrency: 1,
        queue_poll_secs: 1,
        max_upload_bytes: 16 * 1024 * 1024,
    }
}
