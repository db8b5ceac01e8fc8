//! Turns a stored upload into a `processing` video row plus a queued job.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::error::{VideoError, VideoResult};
use super::events::{TranscodeJob, input_dir};
use super::model::Video;
use super::repository::VideoStore;
use crate::infrastructure::queue::{QueueError, WorkQueue};

/// A file already written to local disk by the HTTP layer.
#[derive(Debug, Clone)]
pub struct StagedUpload {
    pub path: PathBuf,
    pub filename: String,
}

#[derive(Clone)]
pub struct JobProducer {
    store: Arc<dyn VideoStore>,
    queue: Arc<dyn WorkQueue>,
    upload_dir: PathBuf,
}

impl JobProducer {
    pub fn new(store: Arc<dyn VideoStore>, queue: Arc<dyn WorkQueue>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            queue,
            upload_dir: upload_dir.into(),
        }
    }

    /// Records the upload and enqueues its transcode job.
    ///
    /// Returns as soon as the job is queued. If the push fails the row is left
    /// `processing`; nothing will ever finish it.
    pub async fn submit(&self, owner_id: i64, upload: StagedUpload) -> VideoResult<Video> {
        let filename = match sanitize_filename(&upload.filename) {
            Some(name) => name,
            None => {
                remove_quietly(&upload.path).await;
                return Err(VideoError::InvalidFilename(upload.filename));
            }
        };
        let title = derive_title(&filename);

        let video = match self.store.create(owner_id, &filename, &title).await {
            Ok(video) => video,
            Err(e) => {
                remove_quietly(&upload.path).await;
                return Err(e.into());
            }
        };
        info!(video_id = video.id, owner_id, "Created video record for {}", filename);

        let input = match self.place_input(&upload.path, video.id, &filename).await {
            Ok(path) => path,
            Err(e) => {
                error!(video_id = video.id, "Failed to move upload into place: {}", e);
                if let Err(db_err) = self.store.mark_failed(video.id).await {
                    error!(video_id = video.id, "Failed to mark video failed: {}", db_err);
                }
                remove_quietly(&upload.path).await;
                return Err(e.into());
            }
        };

        let job = TranscodeJob::new(video.id, filename);
        let payload = job.to_payload().map_err(QueueError::from)?;

        if let Err(e) = self.queue.push(&payload).await {
            error!(
                video_id = video.id,
                input = %input.display(),
                "Failed to enqueue transcode job, video stays processing: {}", e
            );
            return Err(e.into());
        }

        info!(video_id = video.id, "📤 Queued transcode job for {}", job.filename);
        Ok(video)
    }

    async fn place_input(&self, staged: &Path, video_id: i64, filename: &str) -> std::io::Result<PathBuf> {
        let dir = input_dir(&self.upload_dir, video_id);
        tokio::fs::create_dir_all(&dir).await?;
        let target = dir.join(filename);
        tokio::fs::rename(staged, &target).await?;
        Ok(target)
    }
}

/// Final path component of a client-supplied name, or `None` when nothing
/// usable is left.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let normalized = raw.replace('\\', "/");
    let name = Path::new(normalized.trim()).file_name()?.to_str()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

/// Display title: the filename without its extension.
pub fn derive_title(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
        .to_string()
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_only_the_last_component() {
        assert_eq!(sanitize_filename("movie.mp4").as_deref(), Some("movie.mp4"));
        assert_eq!(sanitize_filename("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_filename("C:\\Users\\me\\clip.mov").as_deref(), Some("clip.mov"));
        assert_eq!(sanitize_filename(" holiday.mkv ").as_deref(), Some("holiday.mkv"));
    }

    #[test]
    fn sanitize_rejects_empty_and_dot_names() {
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename(".."), None);
        assert_eq!(sanitize_filename("uploads/"), Some("uploads".to_string()));
        assert_eq!(sanitize_filename("/"), None);
    }

    #[test]
    fn title_drops_the_extension() {
        assert_eq!(derive_title("movie.mp4"), "movie");
        assert_eq!(derive_title("my.holiday.mov"), "my.holiday");
        assert_eq!(derive_title("README"), "README");
    }
}
