//! In-memory queue backend
//!
//! Provides local-only FIFO queues backed by `VecDeque`:
//! - Process crash = all messages lost (no persistence)
//! - Single-process only (no cross-process coordination)
//!
//! Suitable for development and tests. For production durability use the
//! Redis backend.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::Notify;

use super::backend::QueueBackend;
use super::error::QueueError;

/// Shared state for memory backend
struct SharedState {
    /// Pending messages by queue name
    queues: RwLock<HashMap<String, VecDeque<String>>>,
    /// Per-queue notifiers for immediate consumer wakeup (avoids polling)
    notifiers: RwLock<HashMap<String, Arc<Notify>>>,
}

/// In-memory queue backend
pub struct MemoryQueueBackend {
    state: Arc<SharedState>,
}

impl Clone for MemoryQueueBackend {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for MemoryQueueBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryQueueBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(SharedState {
                queues: RwLock::new(HashMap::new()),
                notifiers: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Get or create a Notify for a queue (for immediate consumer wakeup)
    fn get_or_create_notifier(&self, queue: &str) -> Arc<Notify> {
        {
            let notifiers = self.state.notifiers.read();
            if let Some(n) = notifiers.get(queue) {
                return Arc::clone(n);
            }
        }
        let mut notifiers = self.state.notifiers.write();
        // Double-check after acquiring write lock
        if let Some(n) = notifiers.get(queue) {
            return Arc::clone(n);
        }
        let n = Arc::new(Notify::new());
        notifiers.insert(queue.to_string(), Arc::clone(&n));
        n
    }

    fn try_pop(&self, queue: &str) -> Option<String> {
        let mut queues = self.state.queues.write();
        queues.get_mut(queue).and_then(|q| q.pop_front())
    }
}

#[async_trait]
impl QueueBackend for MemoryQueueBackend {
    async fn pop(&self, queue: &str, timeout: Duration) -> Result<Option<String>, QueueError> {
        let deadline = tokio::time::Instant::now() + timeout;
        let notifier = self.get_or_create_notifier(queue);

        loop {
            if let Some(msg) = self.try_pop(queue) {
                return Ok(Some(msg));
            }

            // notify_one stores a permit, so a push between the check above
            // and this await still wakes us
            if tokio::time::timeout_at(deadline, notifier.notified())
                .await
                .is_err()
            {
                return Ok(None);
            }
        }
    }

    async fn push(&self, queue: &str, payload: &str) -> Result<(), QueueError> {
        {
            let mut queues = self.state.queues.write();
            queues
                .entry(queue.to_string())
                .or_default()
                .push_back(payload.to_string());
        }
        self.get_or_create_notifier(queue).notify_one();
        Ok(())
    }

    async fn len(&self, queue: &str) -> Result<u64, QueueError> {
        let queues = self.state.queues.read();
        Ok(queues.get(queue).map(|q| q.len() as u64).unwrap_or(0))
    }

    async fn health_check(&self) -> Result<(), QueueError> {
        // In-memory backend is always healthy
        Ok(())
    }

    async fn close(&self) {}

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_push_pop_fifo() {
        let backend = MemoryQueueBackend::new();
        backend.push("q", "first").await.unwrap();
        backend.push("q", "second").await.unwrap();

        let msg = backend.pop("q", Duration::from_millis(100)).await.unwrap();
        assert_eq!(msg.as_deref(), Some("first"));
        let msg = backend.pop("q", Duration::from_millis(100)).await.unwrap();
        assert_eq!(msg.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_pop_timeout_returns_none() {
        let backend = MemoryQueueBackend::new();
        let msg = backend
            .pop("empty", Duration::from_millis(20))
            .await
            .unwrap();
        assert!(msg.is_none());
    }

    #[tokio::test]
    async fn test_pop_wakes_on_push() {
        let backend = MemoryQueueBackend::new();
        let consumer = backend.clone();

        let handle =
            tokio::spawn(async move { consumer.pop("q", Duration::from_secs(5)).await });

        tokio::task::yield_now().await;
        backend.push("q", "payload").await.unwrap();

        let msg = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(msg.as_deref(), Some("payload"));
    }

    #[tokio::test]
    async fn test_queues_are_isolated() {
        let backend = MemoryQueueBackend::new();
        backend.push("a", "for-a").await.unwrap();

        let msg = backend.pop("b", Duration::from_millis(20)).await.unwrap();
        assert!(msg.is_none());
        assert_eq!(backend.len("a").await.unwrap(), 1);
    }

    #[test]
    fn test_backend_name() {
        let backend = MemoryQueueBackend::new();
        assert_eq!(backend.backend_name(), "memory");
    }
}
