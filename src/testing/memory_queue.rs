use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::infrastructure::queue::{QueueError, QueueResult, WorkQueue};

/// FIFO queue with the same blocking-pop contract as the Redis list.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    items: Mutex<VecDeque<Vec<u8>>>,
    notify: Notify,
    fail_pushes: AtomicBool,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following push fail with `QueueError::Closed`.
    pub fn set_fail_pushes(&self, fail: bool) {
        self.fail_pushes.store(fail, Ordering::SeqCst);
    }

    /// Payloads still waiting, oldest first.
    pub async fn pending(&self) -> Vec<Vec<u8>> {
        self.items.lock().await.iter().cloned().collect()
    }
}

#[async_trait]
impl WorkQueue for MemoryQueue {
    async fn push(&self, payload: &[u8]) -> QueueResult<()> {
        if self.fail_pushes.load(Ordering::SeqCst) {
            return Err(QueueError::Closed);
        }
        self.items.lock().await.push_back(payload.to_vec());
        self.notify.notify_one();
        Ok(())
    }

    async fn pop(&self, wait: Duration) -> QueueResult<Option<Vec<u8>>> {
        let deadline = Instant::now() + wait;
        loop {
            let notified = self.notify.notified();
            if let Some(payload) = self.items.lock().await.pop_front() {
                return Ok(Some(payload));
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn len(&self) -> QueueResult<u64> {
        Ok(self.items.lock().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pops_in_push_order() {
        let queue = MemoryQueue::new();
        queue.push(b"a").await.unwrap();
        queue.push(b"b").await.unwrap();

        assert_eq!(queue.len().await.unwrap(), 2);
        assert_eq!(queue.pop(Duration::ZERO).await.unwrap(), Some(b"a".to_vec()));
        assert_eq!(queue.pop(Duration::ZERO).await.unwrap(), Some(b"b".to_vec()));
        assert_eq!(queue.pop(Duration::from_millis(10)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn blocked_pop_wakes_on_push() {
        let queue = std::sync::Arc::new(MemoryQueue::new());
        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.pop(Duration::from_secs(5)).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.push(b"job").await.unwrap();

        assert_eq!(waiter.await.unwrap().unwrap(), Some(b"job".to_vec()));
    }

    #[tokio::test]
    async fn failing_pushes_leave_the_queue_empty() {
        let queue = MemoryQueue::new();
        queue.set_fail_pushes(true);

        assert!(matches!(queue.push(b"x").await, Err(QueueError::Closed)));
        assert_eq!(queue.len().await.unwrap(), 0);
    }
}
