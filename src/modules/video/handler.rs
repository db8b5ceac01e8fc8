use crate::common::response::{ApiError, ApiResponse, ApiResult, ApiSuccess};
use crate::common::upload::stream_to_disk;
use crate::middleware::owner::OwnerId;
use crate::modules::video::dto::*;
use crate::modules::video::error::VideoError;
use crate::modules::video::service::VideoService;
use crate::state::AppState;
use axum::{
    Extension,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use tracing::{error, info};

/// Multipart field that carries the video bytes.
pub const FILE_FIELD: &str = "file";

fn into_api_error(e: VideoError) -> ApiError {
    if e.status_code().is_server_error() {
        error!("Video request failed: {}", e);
    }
    e.into()
}

#[utoipa::path(
    post,
    path = "/api/v1/videos",
    request_body(content = UploadVideoForm, content_type = "multipart/form-data", description = "Video file in the `file` field"),
    responses(
        (status = 202, description = "File uploaded and processing started", body = ApiResponse<UploadAccepted>),
        (status = 400, description = "Missing or unusable file"),
        (status = 401, description = "Missing user id"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Videos",
    security(("user_id" = []))
)]
pub async fn upload_video(
    State(state): State<AppState>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
    mut multipart: Multipart,
) -> ApiResult<UploadAccepted> {
    let staging_dir = state.config.upload_dir.join(".staging");

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| into_api_error(VideoError::UploadInterrupted(e.to_string())))?;

        let Some(field) = field else {
            return Err(into_api_error(VideoError::MissingFile));
        };

        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let upload = stream_to_disk(&staging_dir, field).await.map_err(into_api_error)?;
        info!(owner_id, "Received upload {:?}", upload.filename);

        let video = VideoService::upload(&state, owner_id, upload)
            .await
            .map_err(into_api_error)?;

        return Ok(ApiSuccess(
            ApiResponse::success(UploadAccepted::from(&video), "File uploaded and processing started."),
            StatusCode::ACCEPTED,
        ));
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/videos",
    responses(
        (status = 200, description = "Videos owned by the caller, newest first", body = ApiResponse<Vec<VideoResponse>>),
        (status = 401, description = "Missing user id")
    ),
    tag = "Videos",
    security(("user_id" = []))
)]
pub async fn list_videos(
    State(state): State<AppState>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
) -> ApiResult<Vec<VideoResponse>> {
    let videos = VideoService::list(&state, owner_id).await.map_err(into_api_error)?;
    Ok(ApiSuccess(
        ApiResponse::success(videos, "Videos retrieved successfully"),
        StatusCode::OK,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/videos/{id}",
    params(
        ("id" = i64, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Get Video", body = ApiResponse<VideoResponse>),
        (status = 401, description = "Missing user id"),
        (status = 404, description = "Video Not Found")
    ),
    tag = "Videos",
    security(("user_id" = []))
)]
pub async fn get_video(
    State(state): State<AppState>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
    Path(id): Path<i64>,
) -> ApiResult<VideoResponse> {
    let video = VideoService::get(&state, owner_id, id).await.map_err(into_api_error)?;
    Ok(ApiSuccess(
        ApiResponse::success(video, "Video retrieved successfully"),
        StatusCode::OK,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/videos/{id}",
    params(
        ("id" = i64, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Video Deleted"),
        (status = 401, description = "Missing user id"),
        (status = 404, description = "Video Not Found")
    ),
    tag = "Videos",
    security(("user_id" = []))
)]
pub async fn delete_video(
    State(state): State<AppState>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    VideoService::delete(&state, owner_id, id).await.map_err(into_api_error)?;
    Ok(ApiSuccess(
        ApiResponse::success((), "Video deleted successfully"),
        StatusCode::OK,
    ))
}
