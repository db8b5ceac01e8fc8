use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::{MANIFEST_NAME, TranscodeError, Transcoder};

// Only the tail of stderr is kept; ffmpeg can be very chatty on bad input.
const STDERR_TAIL_BYTES: usize = 4096;

#[derive(Debug, Clone)]
pub struct TranscoderConfig {
    /// Executable to run.
    pub program: String,
    /// Arguments placed before the transcoder arguments, e.g. a `nice` wrapper.
    pub program_args: Vec<String>,
    pub segment_seconds: u32,
    pub timeout: Duration,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            program_args: Vec::new(),
            segment_seconds: 10,
            timeout: Duration::from_secs(3600),
        }
    }
}

impl TranscoderConfig {
    /// Splits a command line such as `nice -n 10 ffmpeg` into program and
    /// leading arguments.
    pub fn from_command_line(command: &str, segment_seconds: u32, timeout: Duration) -> Self {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_else(|| "ffmpeg".to_string());
        Self {
            program,
            program_args: parts.collect(),
            segment_seconds,
            timeout,
        }
    }
}

/// ffmpeg HLS segmenter: single rendition, zero-based numbering, every segment
/// kept in the playlist.
pub struct FfmpegTranscoder {
    config: TranscoderConfig,
}

impl FfmpegTranscoder {
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(TranscoderConfig::default())
    }

    fn build_args(&self, input: &Path, output_dir: &Path) -> Vec<String> {
        let mut args = self.config.program_args.clone();
        args.extend([
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-profile:v".to_string(),
            "main".to_string(),
            "-level".to_string(),
            "3.1".to_string(),
            "-start_number".to_string(),
            "0".to_string(),
            "-hls_time".to_string(),
            self.config.segment_seconds.to_string(),
            "-hls_list_size".to_string(),
            "0".to_string(),
            "-hls_segment_filename".to_string(),
            output_dir.join("seg%d.ts").to_string_lossy().to_string(),
            "-f".to_string(),
            "hls".to_string(),
            output_dir.join(MANIFEST_NAME).to_string_lossy().to_string(),
        ]);
        args
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, input: &Path, output_dir: &Path) -> Result<PathBuf, TranscodeError> {
        let args = self.build_args(input, output_dir);
        debug!("Running transcoder: {} {}", self.config.program, args.join(" "));

        let child = Command::new(&self.config.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => TranscodeError::NotFound {
                    program: self.config.program.clone(),
                },
                _ => TranscodeError::Io(e),
            })?;

        // Dropping the child on timeout kills it (kill_on_drop).
        let output = match timeout(self.config.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                warn!(
                    "Transcoder timed out after {:?} on {}, killed",
                    self.config.timeout,
                    input.display()
                );
                return Err(TranscodeError::TimedOut {
                    timeout_secs: self.config.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            return Err(TranscodeError::Failed {
                code: output.status.code(),
                stderr: stderr_tail(&output.stderr),
            });
        }

        let manifest = output_dir.join(MANIFEST_NAME);
        if !tokio::fs::try_exists(&manifest).await? {
            return Err(TranscodeError::MissingManifest(manifest));
        }

        Ok(manifest)
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(STDERR_TAIL_BYTES);
    String::from_utf8_lossy(&stderr[start..]).trim().to_string()
}
