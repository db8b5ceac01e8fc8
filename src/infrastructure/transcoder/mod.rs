//! External transcoder invoked as a subprocess.

pub mod ffmpeg;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use ffmpeg::{FfmpegTranscoder, TranscoderConfig};

/// File name of the HLS manifest written into every output directory.
pub const MANIFEST_NAME: &str = "playlist.m3u8";

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Transcoder binary not found: {program}")]
    NotFound { program: String },

    #[error("Transcoder exited with code {code:?}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("Transcoder timed out after {timeout_secs} seconds")]
    TimedOut { timeout_secs: u64 },

    #[error("Transcoder produced no manifest at {0}")]
    MissingManifest(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscodeError {
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Failed { stderr, .. } if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }
}

/// Segments one input file into an HLS rendition.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Writes the manifest and its segments into `output_dir`, returning the
    /// manifest path.
    async fn transcode(&self, input: &Path, output_dir: &Path) -> Result<PathBuf, TranscodeError>;
}
