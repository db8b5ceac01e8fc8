use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::modules::video::model::{Video, VideoStatus};
use crate::modules::video::repository::{StoreResult, VideoStore};

/// Video table kept in memory, with the same guarded terminal updates as the
/// SQL repository.
#[derive(Debug)]
pub struct MemoryVideoStore {
    rows: RwLock<BTreeMap<i64, Video>>,
    next_id: AtomicI64,
    /// Terminal update attempts per video id, successful or not.
    updates: RwLock<HashMap<i64, usize>>,
    fail_creates: AtomicBool,
    fail_updates: AtomicBool,
}

impl Default for MemoryVideoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryVideoStore {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Store whose next created row gets `id`.
    pub fn starting_at(id: i64) -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(id),
            updates: RwLock::new(HashMap::new()),
            fail_creates: AtomicBool::new(false),
            fail_updates: AtomicBool::new(false),
        }
    }

    pub fn set_fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    /// Makes `mark_ready` and `mark_failed` return a database error.
    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub async fn insert(&self, video: Video) {
        self.next_id.fetch_max(video.id + 1, Ordering::SeqCst);
        self.rows.write().await.insert(video.id, video);
    }

    pub async fn all(&self) -> Vec<Video> {
        self.rows.read().await.values().cloned().collect()
    }

    pub async fn update_attempts(&self, id: i64) -> usize {
        self.updates.read().await.get(&id).copied().unwrap_or(0)
    }

    pub async fn total_update_attempts(&self) -> usize {
        self.updates.read().await.values().sum()
    }

    async fn finish(&self, id: i64, status: VideoStatus, asset_key: Option<&str>) -> StoreResult<bool> {
        *self.updates.write().await.entry(id).or_default() += 1;

        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolClosed);
        }

        let mut rows = self.rows.write().await;
        match rows.get_mut(&id) {
            Some(video) if video.status == VideoStatus::Processing => {
                video.status = status;
                video.asset_key = asset_key.map(str::to_string);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl VideoStore for MemoryVideoStore {
    async fn create(&self, owner_id: i64, filename: &str, title: &str) -> StoreResult<Video> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolClosed);
        }

        let video = Video {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            owner_id,
            filename: filename.to_string(),
            title: title.to_string(),
            status: VideoStatus::Processing,
            asset_key: None,
            created_at: OffsetDateTime::now_utc(),
        };
        self.rows.write().await.insert(video.id, video.clone());
        Ok(video)
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Video>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn mark_ready(&self, id: i64, asset_key: &str) -> StoreResult<bool> {
        self.finish(id, VideoStatus::Ready, Some(asset_key)).await
    }

    async fn mark_failed(&self, id: i64) -> StoreResult<bool> {
        self.finish(id, VideoStatus::Failed, None).await
    }

    async fn find_for_owner(&self, id: i64, owner_id: i64) -> StoreResult<Option<Video>> {
        Ok(self
            .rows
            .read()
            .await
            .get(&id)
            .filter(|v| v.owner_id == owner_id)
            .cloned())
    }

    async fn list_for_owner(&self, owner_id: i64) -> StoreResult<Vec<Video>> {
        let mut videos: Vec<Video> = self
            .rows
            .read()
            .await
            .values()
            .filter(|v| v.owner_id == owner_id)
            .cloned()
            .collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(videos)
    }

    async fn delete_for_owner(&self, id: i64, owner_id: i64) -> StoreResult<bool> {
        let mut rows = self.rows.write().await;
        if rows.get(&id).is_some_and(|v| v.owner_id == owner_id) {
            rows.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}
