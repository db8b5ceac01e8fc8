use async_trait::async_trait;
use sqlx::PgPool;

use super::model::{Video, VideoStatus};

pub type StoreResult<T> = Result<T, sqlx::Error>;

const VIDEO_COLUMNS: &str = "id, owner_id, filename, title, status, asset_key, created_at";

/// Durable record of every upload and its lifecycle state.
///
/// Terminal updates only apply to rows still `processing`; they return
/// `false` when no such row matched.
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn create(&self, owner_id: i64, filename: &str, title: &str) -> StoreResult<Video>;

    async fn get(&self, id: i64) -> StoreResult<Option<Video>>;

    async fn mark_ready(&self, id: i64, asset_key: &str) -> StoreResult<bool>;

    async fn mark_failed(&self, id: i64) -> StoreResult<bool>;

    async fn find_for_owner(&self, id: i64, owner_id: i64) -> StoreResult<Option<Video>>;

    async fn list_for_owner(&self, owner_id: i64) -> StoreResult<Vec<Video>>;

    async fn delete_for_owner(&self, id: i64, owner_id: i64) -> StoreResult<bool>;
}

pub struct VideoRepository;

impl VideoRepository {
    pub async fn create(pool: &PgPool, owner_id: i64, filename: &str, title: &str) -> StoreResult<Video> {
        let query = format!(
            "INSERT INTO videos (owner_id, filename, title, status) VALUES ($1, $2, $3, $4) RETURNING {VIDEO_COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(owner_id)
            .bind(filename)
            .bind(title)
            .bind(VideoStatus::Processing.as_str())
            .fetch_one(pool)
            .await
    }

    pub async fn get(pool: &PgPool, id: i64) -> StoreResult<Option<Video>> {
        let query = format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn update_status(
        pool: &PgPool,
        id: i64,
        status: VideoStatus,
        asset_key: Option<&str>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE videos SET status = $1, asset_key = $2 WHERE id = $3 AND status = 'processing'",
        )
        .bind(status.as_str())
        .bind(asset_key)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn find_for_owner(pool: &PgPool, id: i64, owner_id: i64) -> StoreResult<Option<Video>> {
        let query = format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1 AND owner_id = $2");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_owner(pool: &PgPool, owner_id: i64) -> StoreResult<Vec<Video>> {
        let query = format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE owner_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    pub async fn delete_for_owner(pool: &PgPool, id: i64, owner_id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl VideoStore for PgPool {
    async fn create(&self, owner_id: i64, filename: &str, title: &str) -> StoreResult<Video> {
        VideoRepository::create(self, owner_id, filename, title).await
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Video>> {
        VideoRepository::get(self, id).await
    }

    async fn mark_ready(&self, id: i64, asset_key: &str) -> StoreResult<bool> {
        VideoRepository::update_status(self, id, VideoStatus::Ready, Some(asset_key)).await
    }

    async fn mark_failed(&self, id: i64) -> StoreResult<bool> {
        VideoRepository::update_status(self, id, VideoStatus::Failed, None).await
    }

    async fn find_for_owner(&self, id: i64, owner_id: i64) -> StoreResult<Option<Video>> {
        VideoRepository::find_for_owner(self, id, owner_id).await
    }

    async fn list_for_owner(&self, owner_id: i64) -> StoreResult<Vec<Video>> {
        VideoRepository::list_for_owner(self, owner_id).await
    }

    async fn delete_for_owner(&self, id: i64, owner_id: i64) -> StoreResult<bool> {
        VideoRepository::delete_for_owner(self, id, owner_id).await
    }
}
