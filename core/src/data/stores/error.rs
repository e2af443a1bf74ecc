//! Unified error type for store backends

use thiserror::Error;

/// Error type for store backend operations
///
/// Wraps transport errors while preserving which store rejected the work,
/// since a single batch fans out to several backends at once.
#[derive(Error, Debug)]
pub enum StoreError {
    /// HTTP transport error (graph and search stores)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// PostgreSQL error (geo store)
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// Store accepted the request but rejected the batch contents
    #[error("{store} store rejected batch: {reason}")]
    Rejected {
        store: &'static str,
        reason: String,
    },

    /// Serialization error building a request body
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    pub fn rejected(store: &'static str, reason: impl Into<String>) -> Self {
        Self::Rejected {
            store,
            reason: reason.into(),
        }
    }
}
