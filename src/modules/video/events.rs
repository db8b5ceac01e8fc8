use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::infrastructure::transcoder::MANIFEST_NAME;

/// Queue payload: `{"filename": "...", "video_id": 42}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeJob {
    pub filename: String,
    pub video_id: i64,
}

impl TranscodeJob {
    pub fn new(video_id: i64, filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            video_id,
        }
    }

    pub fn to_payload(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_payload(payload: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(payload)
    }

    /// Every object for this job lives under `videos/{video_id}/{filename}`.
    pub fn key_prefix(&self) -> String {
        format!("videos/{}/{}", self.video_id, self.filename)
    }

    pub fn manifest_key(&self) -> String {
        format!("{}/{}", self.key_prefix(), MANIFEST_NAME)
    }
}

/// Object prefix covering everything ever stored for one video.
pub fn video_prefix(video_id: i64) -> String {
    format!("videos/{}/", video_id)
}

/// Where the input for `video_id` is kept until its job finishes.
pub fn input_dir(upload_dir: &Path, video_id: i64) -> PathBuf {
    upload_dir.join(video_id.to_string())
}
