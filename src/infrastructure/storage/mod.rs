//! Object storage used for playable artifacts.

pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed for {key}: {reason}")]
    UploadFailed { key: String, reason: String },

    #[error("List failed for prefix {prefix}: {reason}")]
    ListFailed { prefix: String, reason: String },

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn upload_failed(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::UploadFailed {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    pub fn list_failed(prefix: impl Into<String>, reason: impl ToString) -> Self {
        Self::ListFailed {
            prefix: prefix.into(),
            reason: reason.to_string(),
        }
    }
}

/// Bucket-scoped object store. Implementations own their bucket name.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> StorageResult<()>;

    /// Every key under `prefix`, across all result pages.
    async fn list_prefix(&self, prefix: &str) -> StorageResult<Vec<String>>;

    async fn delete_objects(&self, keys: &[String]) -> StorageResult<()>;

    /// Removes everything under `prefix`, returning how many objects went away.
    async fn purge_prefix(&self, prefix: &str) -> StorageResult<usize> {
        let keys = self.list_prefix(prefix).await?;
        if keys.is_empty() {
            return Ok(0);
        }
        self.delete_objects(&keys).await?;
        Ok(keys.len())
    }
}

/// Content type for an HLS artifact, falling back to extension sniffing.
pub fn content_type_for(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some("m3u8") => "application/vnd.apple.mpegurl".to_string(),
        Some("ts") => "video/mp2t".to_string(),
        _ => mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hls_artifacts_get_streaming_content_types() {
        assert_eq!(
            content_type_for(Path::new("/tmp/42/playlist.m3u8")),
            "application/vnd.apple.mpegurl"
        );
        assert_eq!(content_type_for(Path::new("playlist0.ts")), "video/mp2t");
    }

    #[test]
    fn unknown_extensions_fall_back_to_octet_stream() {
        assert_eq!(
            content_type_for(Path::new("artifact.zzunknown")),
            "application/octet-stream"
        );
    }
}
