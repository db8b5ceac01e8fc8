use tracing::{info, warn};

use super::dto::VideoResponse;
use super::error::{VideoError, VideoResult};
use super::events::video_prefix;
use super::model::Video;
use super::producer::StagedUpload;
use crate::state::AppState;

pub struct VideoService;

impl VideoService {
    pub async fn upload(state: &AppState, owner_id: i64, upload: StagedUpload) -> VideoResult<Video> {
        state.producer.submit(owner_id, upload).await
    }

    pub async fn list(state: &AppState, owner_id: i64) -> VideoResult<Vec<VideoResponse>> {
        let videos = state.store.list_for_owner(owner_id).await?;
        Ok(videos.into_iter().map(VideoResponse::from).collect())
    }

    pub async fn get(state: &AppState, owner_id: i64, id: i64) -> VideoResult<VideoResponse> {
        state
            .store
            .find_for_owner(id, owner_id)
            .await?
            .map(VideoResponse::from)
            .ok_or(VideoError::NotFound)
    }

    /// Deletes an owned video together with everything stored under its prefix.
    /// Object removal is best effort; the row goes either way.
    pub async fn delete(state: &AppState, owner_id: i64, id: i64) -> VideoResult<()> {
        if state.store.find_for_owner(id, owner_id).await?.is_none() {
            return Err(VideoError::NotFound);
        }

        let prefix = video_prefix(id);
        match state.storage.purge_prefix(&prefix).await {
            Ok(count) => info!(video_id = id, "Deleted {} objects under {}", count, prefix),
            Err(e) => warn!(video_id = id, "Failed to delete objects under {}: {}", prefix, e),
        }

        if !state.store.delete_for_owner(id, owner_id).await? {
            return Err(VideoError::NotFound);
        }

        Ok(())
    }
}
