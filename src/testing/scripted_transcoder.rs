use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::infrastructure::transcoder::{MANIFEST_NAME, TranscodeError, Transcoder};

/// What the fake transcoder does with each input.
#[derive(Debug, Clone)]
pub enum TranscodeScript {
    /// Writes a manifest and this many `segN.ts` files.
    Segments(usize),
    /// Exits with `code`, as ffmpeg does on an unreadable input.
    Fail { code: i32, stderr: String },
    TimeOut { timeout_secs: u64 },
}

/// Transcoder that never spawns a process.
///
/// A missing input fails the same way ffmpeg would. Every call is recorded.
#[derive(Debug)]
pub struct ScriptedTranscoder {
    script: TranscodeScript,
    delay: Duration,
    calls: RwLock<Vec<PathBuf>>,
}

impl ScriptedTranscoder {
    pub fn new(script: TranscodeScript) -> Self {
        Self {
            script,
            delay: Duration::ZERO,
            calls: RwLock::new(Vec::new()),
        }
    }

    pub fn succeeding(segments: usize) -> Self {
        Self::new(TranscodeScript::Segments(segments))
    }

    pub fn failing(code: i32, stderr: &str) -> Self {
        Self::new(TranscodeScript::Fail {
            code,
            stderr: stderr.to_string(),
        })
    }

    /// Sleeps this long before producing output.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Inputs seen so far, in call order.
    pub async fn calls(&self) -> Vec<PathBuf> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl Transcoder for ScriptedTranscoder {
    async fn transcode(&self, input: &Path, output_dir: &Path) -> Result<PathBuf, TranscodeError> {
        self.calls.write().await.push(input.to_path_buf());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if !tokio::fs::try_exists(input).await? {
            return Err(TranscodeError::Failed {
                code: Some(1),
                stderr: format!("{}: No such file or directory", input.display()),
            });
        }

        match &self.script {
            TranscodeScript::Segments(count) => {
                let mut manifest = String::from("#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:10\n");
                for i in 0..*count {
                    let name = format!("seg{}.ts", i);
                    tokio::fs::write(output_dir.join(&name), format!("segment {}", i)).await?;
                    manifest.push_str(&format!("#EXTINF:10.0,\n{}\n", name));
                }
                manifest.push_str("#EXT-X-ENDLIST\n");

                let path = output_dir.join(MANIFEST_NAME);
                tokio::fs::write(&path, manifest).await?;
                Ok(path)
            }
            TranscodeScript::Fail { code, stderr } => Err(TranscodeError::Failed {
                code: Some(*code),
                stderr: stderr.clone(),
            }),
            TranscodeScript::TimeOut { timeout_secs } => Err(TranscodeError::TimedOut {
                timeout_secs: *timeout_secs,
            }),
        }
    }
}
