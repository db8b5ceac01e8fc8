use axum::extract::multipart::Field;
use futures_util::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error};
use uuid::Uuid;

use crate::modules::video::error::{VideoError, VideoResult};
use crate::modules::video::producer::StagedUpload;

/// Streams a multipart file field to a uniquely named file under
/// `staging_dir`. A partially written file is removed on error.
pub async fn stream_to_disk(staging_dir: &Path, mut field: Field<'_>) -> VideoResult<StagedUpload> {
    let filename = field.file_name().unwrap_or_default().to_string();

    tokio::fs::create_dir_all(staging_dir).await?;
    let path = staging_dir.join(Uuid::new_v4().simple().to_string());
    let mut file = tokio::fs::File::create(&path).await?;
    let mut written: u64 = 0;

    while let Some(chunk) = field.next().await {
        let result = match chunk {
            Ok(bytes) => {
                written += bytes.len() as u64;
                file.write_all(&bytes).await.map_err(VideoError::from)
            }
            Err(e) => {
                error!("Stream error: {}", e);
                Err(VideoError::UploadInterrupted(e.to_string()))
            }
        };

        if let Err(e) = result {
            drop(file);
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e);
        }
    }

    file.flush().await?;
    debug!("Staged {} bytes for {:?} at {}", written, filename, path.display());

    Ok(StagedUpload { path, filename })
}
