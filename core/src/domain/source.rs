//! Queue message source
//!
//! Pulls raw messages off the work queue on a dedicated task, decodes and
//! preprocesses them, and feeds survivors into a bounded channel. Running
//! the blocking pop on its own task keeps the rest of the pipeline
//! cancel-safe: a message is only ever lost if the process dies between
//! pop and send, never because a `select!` dropped a half-finished pop.
//!
//! The channel is the backpressure seam: when batches are applied slower
//! than messages arrive, the channel fills and popping pauses, leaving
//! the backlog in the queue where it is durable.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::message::Message;
use super::preprocess::preprocess;
use crate::core::constants::{
    SOURCE_CHANNEL_CAPACITY, SOURCE_POP_TIMEOUT_SECS, SOURCE_RETRY_DELAY_SECS,
};
use crate::data::queue::QueueService;

pub struct MessageSource {
    queue: Arc<QueueService>,
}

impl MessageSource {
    pub fn new(queue: Arc<QueueService>) -> Self {
        Self { queue }
    }

    /// Start the source task
    ///
    /// Returns the channel of preprocessed messages plus the task handle.
    /// On shutdown the task stops popping and drops its sender, which the
    /// batcher observes as end of input.
    pub fn start(
        self,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> (mpsc::Receiver<Message>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(SOURCE_CHANNEL_CAPACITY);
        let pop_timeout = Duration::from_secs(SOURCE_POP_TIMEOUT_SECS);
        let retry_delay = Duration::from_secs(SOURCE_RETRY_DELAY_SECS);

        let handle = tokio::spawn(async move {
            tracing::debug!(queue = self.queue.work_queue(), "Message source started");

            loop {
                if *shutdown_rx.borrow() {
                    break;
                }

                match self.queue.pop_work(pop_timeout).await {
                    Ok(Some(raw)) => {
                        let message = match Message::decode(&raw) {
                            Ok(m) => m,
                            Err(e) => {
                                tracing::warn!(error = %e, "Discarding undecodable message");
                                continue;
                            }
                        };

                        // Compaction: preprocessing failures vanish here
                        if let Some(message) = preprocess(message)
                            && tx.send(message).await.is_err()
                        {
                            // Batcher gone, nothing left to feed
                            break;
                        }
                    }
                    Ok(None) => {
                        // Pop timed out; loop around to re-check shutdown
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Queue pop failed, retrying");
                        tokio::select! {
                            _ = tokio::time::sleep(retry_delay) => {}
                            _ = shutdown_rx.changed() => {}
                        }
                    }
                }
            }

            tracing::debug!("Message source stopped");
        });

        (rx, handle)
    }
}
