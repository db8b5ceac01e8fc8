use axum::http::StatusCode;
use thiserror::Error;

use crate::common::response::ApiError;
use crate::infrastructure::queue::QueueError;
use crate::infrastructure::storage::StorageError;

pub type VideoResult<T> = Result<T, VideoError>;

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("Invalid filename: {0:?}")]
    InvalidFilename(String),

    #[error("Video not found")]
    NotFound,

    #[error("No file field found in multipart request")]
    MissingFile,

    #[error("Upload interrupted: {0}")]
    UploadInterrupted(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to enqueue job: {0}")]
    Queue(#[from] QueueError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VideoError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            VideoError::InvalidFilename(_) | VideoError::MissingFile | VideoError::UploadInterrupted(_) => {
                StatusCode::BAD_REQUEST
            }
            VideoError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<VideoError> for ApiError {
    fn from(err: VideoError) -> Self {
        let status = err.status_code();
        // Internal details stay in the logs.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            err.to_string()
        };
        ApiError(message, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(VideoError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(VideoError::MissingFile.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            VideoError::InvalidFilename("..".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let api: ApiError = VideoError::Database(sqlx::Error::PoolClosed).into();
        assert_eq!(api.1, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.0, "Internal server error");
    }
}
