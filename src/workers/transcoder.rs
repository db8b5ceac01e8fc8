use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};

use crate::config::settings::WorkerConfig;
use crate::infrastructure::queue::WorkQueue;
use crate::infrastructure::storage::{ObjectStorage, StorageError, content_type_for};
use crate::infrastructure::transcoder::{TranscodeError, Transcoder};
use crate::modules::video::events::{TranscodeJob, input_dir, video_prefix};
use crate::modules::video::model::VideoStatus;
use crate::modules::video::producer::sanitize_filename;
use crate::modules::video::repository::VideoStore;

const POP_ERROR_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Failed to prepare work directory: {0}")]
    Prepare(std::io::Error),

    #[error("Transcode failed: {0}")]
    Transcode(#[from] TranscodeError),

    #[error("Upload failed: {0}")]
    Upload(#[from] StorageError),
}

/// What happened to one popped payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Ready { video_id: i64, asset_key: String },
    Failed { video_id: i64, reason: String },
    /// Nothing was mutated: the payload was unusable or the row had already
    /// left `processing`.
    Discarded,
    /// Artifacts are stored but the row could not be finalized; it stays
    /// `processing`.
    Orphaned { video_id: i64 },
}

/// Local paths owned by one job, all keyed by the video id.
#[derive(Debug, Clone)]
pub struct JobPaths {
    pub input: PathBuf,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl JobPaths {
    pub fn new(config: &WorkerConfig, job: &TranscodeJob) -> Self {
        let input_dir = input_dir(&config.upload_dir, job.video_id);
        Self {
            input: input_dir.join(&job.filename),
            input_dir,
            output_dir: config.work_dir.join(job.video_id.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct TranscodeWorker {
    store: Arc<dyn VideoStore>,
    queue: Arc<dyn WorkQueue>,
    storage: Arc<dyn ObjectStorage>,
    transcoder: Arc<dyn Transcoder>,
    config: WorkerConfig,
}

impl TranscodeWorker {
    pub fn new(
        store: Arc<dyn VideoStore>,
        queue: Arc<dyn WorkQueue>,
        storage: Arc<dyn ObjectStorage>,
        transcoder: Arc<dyn Transcoder>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            store,
            queue,
            storage,
            transcoder,
            config,
        }
    }

    /// Pops and processes jobs until `shutdown` fires. A job in progress is
    /// always finished first; per-job errors never end the loop.
    pub async fn run(&self, worker_id: usize, shutdown: CancellationToken) {
        info!(worker_id, "👷 Transcoder worker started, waiting for jobs...");

        while !shutdown.is_cancelled() {
            match self.queue.pop(self.config.poll_interval).await {
                Ok(Some(payload)) => {
                    let outcome = self.handle_payload(&payload).await;
                    info!(worker_id, ?outcome, "Job finished");
                }
                Ok(None) => continue,
                Err(e) => {
                    error!(worker_id, "❌ Failed to pop job from queue: {}", e);
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(POP_ERROR_BACKOFF) => {}
                    }
                }
            }
        }

        info!(worker_id, "Transcoder worker stopped");
    }

    /// Deserializes and processes one queue payload.
    pub async fn handle_payload(&self, payload: &[u8]) -> JobOutcome {
        let job = match TranscodeJob::from_payload(payload) {
            Ok(job) => job,
            Err(e) => {
                warn!("❌ Discarding malformed job payload: {}", e);
                return JobOutcome::Discarded;
            }
        };

        if sanitize_filename(&job.filename).as_deref() != Some(job.filename.as_str()) {
            warn!(video_id = job.video_id, "❌ Discarding job with unsafe filename {:?}", job.filename);
            return JobOutcome::Discarded;
        }

        let span = info_span!("transcode", video_id = job.video_id);
        self.process(job).instrument(span).await
    }

    async fn process(&self, job: TranscodeJob) -> JobOutcome {
        info!("📥 Received job: {}", job.filename);
        let paths = JobPaths::new(&self.config, &job);

        let outcome = match self.execute(&job, &paths).await {
            Ok(asset_key) => self.finalize(&job, asset_key).await,
            Err(err) => self.fail(&job, err).await,
        };

        cleanup(&paths).await;
        outcome
    }

    async fn execute(&self, job: &TranscodeJob, paths: &JobPaths) -> Result<String, WorkerError> {
        tokio::fs::create_dir_all(&paths.output_dir)
            .await
            .map_err(WorkerError::Prepare)?;

        self.transcoder.transcode(&paths.input, &paths.output_dir).await?;
        info!("🎬 Video processed: {}", job.filename);

        let uploaded = self.upload_artifacts(job, &paths.output_dir).await?;
        info!("☁️ Uploaded {} files for {}", uploaded, job.filename);

        Ok(job.manifest_key())
    }

    /// Uploads every regular file under `output_dir`, stopping at the first
    /// failure.
    async fn upload_artifacts(&self, job: &TranscodeJob, output_dir: &Path) -> Result<usize, StorageError> {
        let prefix = job.key_prefix();
        let files = collect_files(output_dir).await?;

        for path in &files {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                return Err(StorageError::upload_failed(
                    path.to_string_lossy(),
                    "artifact name is not valid UTF-8",
                ));
            };
            let key = format!("{}/{}", prefix, name);
            let body = tokio::fs::read(path).await?;
            self.storage
                .put_object(&key, Bytes::from(body), &content_type_for(path))
                .await?;
        }

        Ok(files.len())
    }

    async fn finalize(&self, job: &TranscodeJob, asset_key: String) -> JobOutcome {
        match self.store.mark_ready(job.video_id, &asset_key).await {
            Ok(true) => {
                info!("✅ Video ready at {}", asset_key);
                JobOutcome::Ready {
                    video_id: job.video_id,
                    asset_key,
                }
            }
            Ok(false) => {
                warn!("Video row is gone or no longer processing, result discarded");
                self.release_artifacts(job.video_id).await;
                JobOutcome::Discarded
            }
            Err(e) => {
                error!("❌ Failed to update video status, video stays processing: {}", e);
                JobOutcome::Orphaned { video_id: job.video_id }
            }
        }
    }

    async fn fail(&self, job: &TranscodeJob, err: WorkerError) -> JobOutcome {
        match &err {
            WorkerError::Transcode(e) => match e.stderr() {
                Some(stderr) => error!("❌ Transcode failed for {}: {}\n{}", job.filename, e, stderr),
                None => error!("❌ Transcode failed for {}: {}", job.filename, e),
            },
            other => error!("❌ Job failed for {}: {}", job.filename, other),
        }

        if let Err(e) = self.store.mark_failed(job.video_id).await {
            error!("❌ Failed to mark video failed: {}", e);
        }

        if matches!(err, WorkerError::Upload(_)) {
            self.release_artifacts(job.video_id).await;
        }

        JobOutcome::Failed {
            video_id: job.video_id,
            reason: err.to_string(),
        }
    }

    /// Removes everything under the video's prefix unless its row is `ready`.
    /// A ready row owns those objects, even when this job did not finish it.
    async fn release_artifacts(&self, video_id: i64) {
        match self.store.get(video_id).await {
            Ok(Some(video)) if video.status == VideoStatus::Ready => {
                info!("Video is already ready, keeping its objects");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Cannot read video row, leaving stored objects in place: {}", e);
                return;
            }
        }

        match self.storage.purge_prefix(&video_prefix(video_id)).await {
            Ok(0) => {}
            Ok(n) => info!("Removed {} stored objects", n),
            Err(e) => warn!("Failed to remove stored objects: {}", e),
        }
    }
}

/// Runs `concurrency` workers against the same queue until `shutdown` fires.
pub async fn run_pool(worker: TranscodeWorker, concurrency: usize, shutdown: CancellationToken) {
    let mut tasks = JoinSet::new();
    for worker_id in 0..concurrency.max(1) {
        let worker = worker.clone();
        let shutdown = shutdown.clone();
        tasks.spawn(async move { worker.run(worker_id, shutdown).await });
    }

    while let Some(result) = tasks.join_next().await {
        if let Err(e) = result {
            error!("Worker task ended abnormally: {}", e);
        }
    }
}

/// Regular files under `dir`, recursively, in path order.
async fn collect_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                files.push(entry.path());
            }
        }
    }

    files.sort();
    Ok(files)
}

async fn cleanup(paths: &JobPaths) {
    for dir in [&paths.input_dir, &paths.output_dir] {
        if let Err(e) = tokio::fs::remove_dir_all(dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove {}: {}", dir.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn job_paths_are_keyed_by_video_id() {
        let config = WorkerConfig {
            upload_dir: PathBuf::from("/app/uploads"),
            work_dir: PathBuf::from("/tmp/streamify"),
            poll_interval: Duration::from_secs(1),
        };

        let a = JobPaths::new(&config, &TranscodeJob::new(1, "movie.mp4"));
        let b = JobPaths::new(&config, &TranscodeJob::new(2, "movie.mp4"));

        assert_eq!(a.input, PathBuf::from("/app/uploads/1/movie.mp4"));
        assert_eq!(a.output_dir, PathBuf::from("/tmp/streamify/1"));
        assert_ne!(a.output_dir, b.output_dir);
        assert_ne!(a.input, b.input);
    }

    #[tokio::test]
    async fn collect_files_walks_nested_directories() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("playlist.m3u8"), "#EXTM3U").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/seg0.ts"), "x").unwrap();

        let files = collect_files(dir.path()).await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();

        assert_eq!(files.len(), 2);
        assert!(names.contains(&"playlist.m3u8".to_string()));
        assert!(names.contains(&"seg0.ts".to_string()));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn non_utf8_artifact_names_fail_the_upload() {
        use crate::testing::{MemoryQueue, MemoryStorage, MemoryVideoStore, ScriptedTranscoder};
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("playlist.m3u8"), "#EXTM3U").unwrap();
        std::fs::write(dir.path().join(OsStr::from_bytes(b"seg\xff.ts")), "x").unwrap();

        let storage = Arc::new(MemoryStorage::new());
        let worker = TranscodeWorker::new(
            Arc::new(MemoryVideoStore::new()),
            Arc::new(MemoryQueue::new()),
            storage.clone(),
            Arc::new(ScriptedTranscoder::succeeding(1)),
            WorkerConfig::default(),
        );

        let result = worker
            .upload_artifacts(&TranscodeJob::new(1, "movie.mp4"), dir.path())
            .await;

        assert!(matches!(result, Err(StorageError::UploadFailed { .. })));
    }

    #[tokio::test]
    async fn cleanup_tolerates_missing_paths() {
        let dir = TempDir::new().unwrap();
        let paths = JobPaths {
            input: dir.path().join("in/7/a.mp4"),
            input_dir: dir.path().join("in/7"),
            output_dir: dir.path().join("out/7"),
        };
        std::fs::create_dir_all(&paths.output_dir).unwrap();

        cleanup(&paths).await;

        assert!(!paths.output_dir.exists());
        assert!(!paths.input_dir.exists());
    }
}
