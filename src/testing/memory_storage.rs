use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::infrastructure::storage::{ObjectStorage, StorageError, StorageResult};

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: String,
}

/// Bucket kept in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    puts: AtomicUsize,
    /// Puts fail once this many have succeeded.
    fail_after: RwLock<Option<usize>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lets `successful` puts through, then fails every following one.
    pub async fn fail_puts_after(&self, successful: usize) {
        *self.fail_after.write().await = Some(successful);
    }

    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    pub async fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    /// Put attempts so far, including failed ones.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> StorageResult<()> {
        let attempt = self.puts.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = *self.fail_after.read().await {
            if attempt >= limit {
                return Err(StorageError::upload_failed(key, "injected failure"));
            }
        }

        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn list_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        Ok(self
            .objects
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete_objects(&self, keys: &[String]) -> StorageResult<()> {
        let mut objects = self.objects.write().await;
        for key in keys {
            objects.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn purge_removes_only_the_prefix() {
        let storage = MemoryStorage::new();
        storage.put_object("videos/1/a.mp4/playlist.m3u8", Bytes::new(), "x").await.unwrap();
        storage.put_object("videos/1/a.mp4/seg0.ts", Bytes::new(), "x").await.unwrap();
        storage.put_object("videos/10/b.mp4/seg0.ts", Bytes::new(), "x").await.unwrap();

        assert_eq!(storage.purge_prefix("videos/1/").await.unwrap(), 2);
        assert_eq!(storage.keys().await, vec!["videos/10/b.mp4/seg0.ts".to_string()]);
    }

    #[tokio::test]
    async fn injected_failures_start_after_the_limit() {
        let storage = MemoryStorage::new();
        storage.fail_puts_after(1).await;

        assert!(storage.put_object("a", Bytes::new(), "x").await.is_ok());
        assert!(storage.put_object("b", Bytes::new(), "x").await.is_err());
        assert_eq!(storage.put_count(), 2);
        assert_eq!(storage.keys().await, vec!["a".to_string()]);
    }
}
