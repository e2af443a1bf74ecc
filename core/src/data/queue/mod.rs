//! Work queue system
//!
//! Provides FIFO list queues with pluggable backends:
//! - In-memory (for development and tests, single-process)
//! - Redis (default, for production pipelines fed by external producers)
//!
//! Two queues are derived from one configured name: the work queue itself,
//! and a completion queue (`{name}-dataset-done`) that downstream services
//! consume once all stores have accepted a dataset.

mod backend;
mod error;
mod memory;
mod redis;

use std::sync::Arc;
use std::time::Duration;

pub use backend::QueueBackend;
pub use error::QueueError;
use memory::MemoryQueueBackend;

use crate::core::config::QueueBackendType;
use crate::core::constants::DONE_QUEUE_SUFFIX;

/// Central queue service
///
/// Owns the backend plus the queue naming scheme, so callers only ever
/// talk about "work" and "done" messages.
pub struct QueueService {
    backend: Arc<dyn QueueBackend>,
    work_queue: String,
    done_queue: String,
}

impl QueueService {
    /// Initialize the configured backend and validate its connection
    pub async fn init(
        backend_type: QueueBackendType,
        url: &str,
        name: &str,
    ) -> Result<Self, QueueError> {
        let backend: Arc<dyn QueueBackend> = match backend_type {
            QueueBackendType::Memory => Arc::new(MemoryQueueBackend::new()),
            QueueBackendType::Redis => {
                if url.is_empty() {
                    return Err(QueueError::Config(
                        "queue url required for Redis backend".into(),
                    ));
                }
                Arc::new(redis::RedisQueueBackend::new(url).await?)
            }
        };

        Ok(Self {
            backend,
            work_queue: name.to_string(),
            done_queue: format!("{}{}", name, DONE_QUEUE_SUFFIX),
        })
    }

    /// Create a service over an in-memory backend (tests and local tooling)
    pub fn in_memory(name: &str) -> Self {
        Self {
            backend: Arc::new(MemoryQueueBackend::new()),
            work_queue: name.to_string(),
            done_queue: format!("{}{}", name, DONE_QUEUE_SUFFIX),
        }
    }

    /// Pop the next raw message from the work queue
    ///
    /// Returns `None` when `timeout` elapses with the queue empty.
    pub async fn pop_work(&self, timeout: Duration) -> Result<Option<String>, QueueError> {
        self.backend.pop(&self.work_queue, timeout).await
    }

    /// Push a raw message onto the work queue (producers and tests)
    pub async fn push_work(&self, payload: &str) -> Result<(), QueueError> {
        self.backend.push(&self.work_queue, payload).await
    }

    /// Push a completion payload onto the done queue
    pub async fn push_done(&self, payload: &str) -> Result<(), QueueError> {
        self.backend.push(&self.done_queue, payload).await
    }

    /// Pop from the done queue (used by tests and downstream tooling)
    pub async fn pop_done(&self, timeout: Duration) -> Result<Option<String>, QueueError> {
        self.backend.pop(&self.done_queue, timeout).await
    }

    /// Depth of the work queue
    pub async fn work_len(&self) -> Result<u64, QueueError> {
        self.backend.len(&self.work_queue).await
    }

    /// Health check against the backend
    pub async fn health_check(&self) -> Result<(), QueueError> {
        self.backend.health_check().await
    }

    /// Close backend connections
    pub async fn close(&self) {
        self.backend.close().await;
    }

    /// Get the backend name
    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    pub fn work_queue(&self) -> &str {
        &self.work_queue
    }

    pub fn done_queue(&self) -> &str {
        &self.done_queue
    }
}
