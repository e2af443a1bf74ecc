//! Time-or-count batching
//!
//! Groups incoming messages into batches that close on whichever comes
//! first: the batch reaching its size limit, or the timeout measured from
//! the batch's first message. An empty pipeline arms no timer, so an idle
//! process wakes only when work arrives.

use std::time::Duration;

use tokio::sync::mpsc;

use super::message::Message;

pub struct Batcher {
    rx: mpsc::Receiver<Message>,
    max_size: usize,
    timeout: Duration,
}

impl Batcher {
    pub fn new(rx: mpsc::Receiver<Message>, max_size: usize, timeout: Duration) -> Self {
        Self {
            rx,
            max_size,
            timeout,
        }
    }

    /// Collect the next batch
    ///
    /// Blocks until at least one message arrives, then keeps collecting
    /// until the size limit or the deadline. Returns `None` once the
    /// channel is closed and drained; a partial batch in flight at close
    /// time is returned first, so shutdown never discards messages.
    pub async fn next_batch(&mut self) -> Option<Vec<Message>> {
        let first = self.rx.recv().await?;

        let mut batch = Vec::with_capacity(self.max_size.min(64));
        batch.push(first);

        // Deadline armed by the first message, never reset by later ones
        let deadline = tokio::time::Instant::now() + self.timeout;

        while batch.len() < self.max_size {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => break,
                next = self.rx.recv() => match next {
                    Some(message) => batch.push(message),
                    None => break,
                },
            }
        }

        Some(batch)
    }
}
