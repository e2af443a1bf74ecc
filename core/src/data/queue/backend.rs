//! Queue backend trait definition
//!
//! Defines the interface for list-queue implementations (memory and Redis).
//! Queues carry opaque string payloads so external producers keep full
//! control of the wire format.

use std::time::Duration;

use async_trait::async_trait;

use super::error::QueueError;

/// Work queue backend trait
///
/// Semantics follow Redis lists: `push` appends to the head (LPUSH) and
/// `pop` blocks on the tail (BRPOP), so each queue is FIFO and each
/// message is claimed by exactly one consumer.
#[async_trait]
pub trait QueueBackend: Send + Sync {
    /// Pop the next message from a queue, blocking up to `timeout`
    ///
    /// Returns `None` when the timeout elapses with no message available.
    async fn pop(&self, queue: &str, timeout: Duration) -> Result<Option<String>, QueueError>;

    /// Push a message onto a queue
    async fn push(&self, queue: &str, payload: &str) -> Result<(), QueueError>;

    /// Number of messages currently waiting in a queue
    async fn len(&self, queue: &str) -> Result<u64, QueueError>;

    /// Health check (validates connection)
    async fn health_check(&self) -> Result<(), QueueError>;

    /// Close connections held by the backend
    async fn close(&self);

    /// Backend name for debugging/logging
    fn backend_name(&self) -> &'static str;
}
