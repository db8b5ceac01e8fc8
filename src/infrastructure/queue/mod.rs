//! Durable FIFO of serialized transcode jobs.

pub mod redis_list;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use redis_list::RedisQueue;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Queue closed")]
    Closed,
}

/// Multi-producer, multi-consumer work queue.
///
/// `pop` removes an item atomically: two concurrent callers never receive the
/// same payload. There is no acknowledgement, so a popped item is gone even if
/// the caller never finishes with it.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Appends `payload` to the tail.
    async fn push(&self, payload: &[u8]) -> QueueResult<()>;

    /// Waits up to `wait` for an item at the head. `Ok(None)` means the wait
    /// elapsed with the queue empty.
    async fn pop(&self, wait: Duration) -> QueueResult<Option<Vec<u8>>>;

    async fn len(&self) -> QueueResult<u64>;
}
