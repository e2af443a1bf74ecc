//! Queue error types

use std::fmt;

/// Error type for work queue operations
#[derive(Debug)]
pub enum QueueError {
    /// Connection error (Redis)
    Connection(String),
    /// Queue command failed
    Command(String),
    /// Configuration error
    Config(String),
    /// Queue closed during shutdown
    Closed,
}

impl std::error::Error for QueueError {}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::Connection(msg) => write!(f, "connection error: {}", msg),
            QueueError::Command(msg) => write!(f, "queue command failed: {}", msg),
            QueueError::Config(msg) => write!(f, "configuration error: {}", msg),
            QueueError::Closed => write!(f, "queue closed"),
        }
    }
}

impl From<deadpool_redis::PoolError> for QueueError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        QueueError::Connection(err.to_string())
    }
}

impl From<deadpool_redis::redis::RedisError> for QueueError {
    fn from(err: deadpool_redis::redis::RedisError) -> Self {
        QueueError::Command(err.to_string())
    }
}
