//! Parallel store fan-out
//!
//! Applies one batch's work messages to every backend concurrently and
//! reports a single outcome. All backends run to completion even when one
//! fails early, so each store sees every batch exactly once and partial
//! failures are visible per backend in the logs.

use std::sync::Arc;

use futures::future::join_all;

use crate::data::stores::{StoreBackend, StoreError};
use crate::domain::message::Message;

pub struct FanoutExecutor {
    backends: Vec<Arc<dyn StoreBackend>>,
}

impl FanoutExecutor {
    pub fn new(backends: Vec<Arc<dyn StoreBackend>>) -> Self {
        Self { backends }
    }

    /// Apply the work slice to every backend in parallel
    ///
    /// Succeeds only when every backend accepted the batch. With no
    /// backends enabled (or an empty slice) this is a successful no-op.
    pub async fn execute(&self, work: &[Message]) -> Result<(), StoreError> {
        if self.backends.is_empty() || work.is_empty() {
            return Ok(());
        }

        let results = join_all(self.backends.iter().map(|backend| async move {
            let result = backend.bulk(work).await;
            (backend.name(), result)
        }))
        .await;

        let mut first_error = None;
        for (name, result) in results {
            match result {
                Ok(()) => {}
                Err(e) => {
                    tracing::error!(store = name, error = %e, "Store rejected batch");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
