use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use super::{QueueResult, WorkQueue};
use crate::infrastructure::redis::client::RedisService;

/// Redis list used as a queue: `LPUSH` at the tail, `BRPOP` from the head.
///
/// A blocked `BRPOP` holds its connection, so every concurrent pop gets its
/// own. Idle ones are kept and reused; one that errored is dropped.
#[derive(Clone)]
pub struct RedisQueue {
    redis: RedisService,
    key: String,
    idle: Arc<Mutex<Vec<MultiplexedConnection>>>,
}

impl RedisQueue {
    pub fn new(redis: RedisService, key: impl Into<String>) -> Self {
        Self {
            redis,
            key: key.into(),
            idle: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Blocking connections waiting to be reused.
    pub async fn idle_connections(&self) -> usize {
        self.idle.lock().await.len()
    }
}

#[async_trait]
impl WorkQueue for RedisQueue {
    async fn push(&self, payload: &[u8]) -> QueueResult<()> {
        let mut conn = self.redis.get_conn().await?;
        let depth: u64 = conn.lpush(&self.key, payload).await?;
        debug!("Pushed job onto '{}' (depth {})", self.key, depth);
        Ok(())
    }

    async fn pop(&self, wait: Duration) -> QueueResult<Option<Vec<u8>>> {
        let pooled = self.idle.lock().await.pop();
        let mut conn = match pooled {
            Some(conn) => conn,
            None => self.redis.get_blocking_conn().await?,
        };

        let reply: Option<(String, Vec<u8>)> = redis::cmd("BRPOP")
            .arg(&self.key)
            .arg(wait.as_secs_f64())
            .query_async(&mut conn)
            .await?;

        self.idle.lock().await.push(conn);
        Ok(reply.map(|(_, payload)| payload))
    }

    async fn len(&self) -> QueueResult<u64> {
        let mut conn = self.redis.get_conn().await?;
        let len: u64 = conn.llen(&self.key).await?;
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn queue() -> RedisQueue {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let redis = RedisService::new(&url).await.unwrap();
        RedisQueue::new(redis, format!("streamify-test-{}", uuid::Uuid::new_v4().simple()))
    }

    #[tokio::test]
    #[ignore = "requires a running Redis (REDIS_URL)"]
    async fn sequential_pops_reuse_one_blocking_connection() {
        let queue = queue().await;
        queue.push(b"first").await.unwrap();
        queue.push(b"second").await.unwrap();

        assert_eq!(queue.pop(Duration::from_secs(1)).await.unwrap(), Some(b"first".to_vec()));
        assert_eq!(queue.pop(Duration::from_secs(1)).await.unwrap(), Some(b"second".to_vec()));
        assert_eq!(queue.pop(Duration::from_millis(100)).await.unwrap(), None);

        assert_eq!(queue.idle_connections().await, 1);
        assert_eq!(queue.len().await.unwrap(), 0);
    }
}
