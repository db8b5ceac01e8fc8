use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

use super::model::{Video, VideoStatus};

/// Multipart form accepted by the upload endpoint.
#[derive(Debug, ToSchema)]
pub struct UploadVideoForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadAccepted {
    pub video_id: i64,
    pub status: VideoStatus,
}

impl From<&Video> for UploadAccepted {
    fn from(video: &Video) -> Self {
        Self {
            video_id: video.id,
            status: video.status,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VideoResponse {
    pub id: i64,
    pub owner_id: i64,
    pub filename: String,
    pub title: String,
    pub status: VideoStatus,
    pub asset_key: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
}

impl From<Video> for VideoResponse {
    fn from(video: Video) -> Self {
        Self {
            id: video.id,
            owner_id: video.owner_id,
            filename: video.filename,
            title: video.title,
            status: video.status,
            asset_key: video.asset_key,
            created_at: video.created_at,
        }
    }
}
