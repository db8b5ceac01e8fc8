//! HTTP surface exercised in-process with `tower::ServiceExt::oneshot`.

mod common;

use axum::http::StatusCode;
use std::time::Duration;

use streamify::infrastructure::queue::WorkQueue;
use streamify::modules::video::model::VideoStatus;
use streamify::modules::video::repository::VideoStore;

use common::{OWNER, TestFixture};

#[tokio::test]
async fn health_endpoint_answers_ok() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn upload_is_accepted_and_queued() {
    let fixture = TestFixture::new();

    let response = fixture.upload("file", "movie.mp4", b"fake mp4 bytes", Some(OWNER)).await;

    assert_eq!(response.status, StatusCode::ACCEPTED);
    assert_eq!(response.body["status"], "success");
    assert_eq!(response.body["message"], "File uploaded and processing started.");
    assert_eq!(response.body["data"]["video_id"], 1);
    assert_eq!(response.body["data"]["status"], "processing");

    let row = fixture.store.get(1).await.unwrap().unwrap();
    assert_eq!(row.owner_id, OWNER);
    assert_eq!(row.filename, "movie.mp4");
    assert_eq!(row.status, VideoStatus::Processing);
    assert_eq!(fixture.queue.len().await.unwrap(), 1);

    let stored = std::fs::read(fixture.upload_dir().join("1/movie.mp4")).unwrap();
    assert_eq!(stored, b"fake mp4 bytes");
}

#[tokio::test]
async fn upload_without_user_is_rejected() {
    let fixture = TestFixture::new();

    let response = fixture.upload("file", "movie.mp4", b"data", None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["status"], "error");
    assert!(fixture.store.all().await.is_empty());
    assert_eq!(fixture.queue.len().await.unwrap(), 0);
}

#[tokio::test]
async fn upload_without_file_field_is_a_bad_request() {
    let fixture = TestFixture::new();

    let response = fixture.upload("video", "movie.mp4", b"data", Some(OWNER)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(fixture.store.all().await.is_empty());
}

#[tokio::test]
async fn videos_are_listed_per_owner() {
    let fixture = TestFixture::new();
    fixture.upload("file", "a.mp4", b"a", Some(OWNER)).await;
    fixture.upload("file", "b.mp4", b"b", Some(OWNER)).await;
    fixture.upload("file", "c.mp4", b"c", Some(OWNER + 1)).await;

    let response = fixture.get("/api/v1/videos", Some(OWNER)).await;

    assert_eq!(response.status, StatusCode::OK);
    let items = response.body["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|v| v["owner_id"] == OWNER));
    assert_eq!(items[0]["filename"], "b.mp4");
}

#[tokio::test]
async fn status_is_visible_only_to_the_owner() {
    let fixture = TestFixture::new();
    fixture.upload("file", "movie.mp4", b"data", Some(OWNER)).await;

    let own = fixture.get("/api/v1/videos/1", Some(OWNER)).await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.body["data"]["status"], "processing");
    assert_eq!(own.body["data"]["title"], "movie");
    assert!(own.body["data"]["asset_key"].is_null());

    let other = fixture.get("/api/v1/videos/1", Some(OWNER + 1)).await;
    assert_eq!(other.status, StatusCode::NOT_FOUND);

    let missing = fixture.get("/api/v1/videos/99", Some(OWNER)).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ready_video_reports_its_manifest_key() {
    let fixture = TestFixture::new();
    fixture.upload("file", "movie.mp4", b"data", Some(OWNER)).await;

    let payload = fixture.queue.pop(Duration::from_millis(100)).await.unwrap().unwrap();
    fixture.worker.handle_payload(&payload).await;

    let response = fixture.get("/api/v1/videos/1", Some(OWNER)).await;
    assert_eq!(response.body["data"]["status"], "ready");
    assert_eq!(response.body["data"]["asset_key"], "videos/1/movie.mp4/playlist.m3u8");
}

#[tokio::test]
async fn delete_removes_row_and_objects() {
    let fixture = TestFixture::new();
    fixture.upload("file", "movie.mp4", b"data", Some(OWNER)).await;
    let payload = fixture.queue.pop(Duration::from_millis(100)).await.unwrap().unwrap();
    fixture.worker.handle_payload(&payload).await;
    assert!(!fixture.storage.keys().await.is_empty());

    let forbidden = fixture.delete("/api/v1/videos/1", OWNER + 1).await;
    assert_eq!(forbidden.status, StatusCode::NOT_FOUND);
    assert!(!fixture.storage.keys().await.is_empty());

    let response = fixture.delete("/api/v1/videos/1", OWNER).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(fixture.storage.keys().await.is_empty());
    assert!(fixture.store.get(1).await.unwrap().is_none());

    let again = fixture.delete("/api/v1/videos/1", OWNER).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}
