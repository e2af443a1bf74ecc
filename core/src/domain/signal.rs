//! Completion signaling
//!
//! Relays dataset-done payloads to the completion queue. Callers invoke
//! this only after the enclosing batch was accepted by every store, which
//! is the whole contract: downstream consumers treat a completion payload
//! as proof the data before it is queryable.

use std::sync::Arc;

use crate::data::queue::{QueueError, QueueService};
use crate::domain::message::Message;

pub struct CompletionSignaler {
    queue: Arc<QueueService>,
}

impl CompletionSignaler {
    pub fn new(queue: Arc<QueueService>) -> Self {
        Self { queue }
    }

    /// Push each completion payload, in batch order
    ///
    /// Payloads are forwarded verbatim; metadata and the `type` tag are
    /// not part of the downstream contract.
    pub async fn signal(&self, completions: &[Message]) -> Result<(), QueueError> {
        for message in completions {
            let payload = serde_json::to_string(&message.payload)
                .map_err(|e| QueueError::Command(format!("unserializable payload: {}", e)))?;
            self.queue.push_done(&payload).await?;
            tracing::info!(dataset = %message.meta.dataset, "Dataset completion signaled");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::message::{MessageKind, Meta};
    use serde_json::json;
    use std::time::Duration;

    fn done(dataset: &str, payload: serde_json::Value) -> Message {
        Message {
            kind: MessageKind::DatasetDone,
            meta: Meta::for_dataset(dataset),
            payload,
        }
    }

    #[tokio::test]
    async fn test_payload_forwarded_verbatim() {
        let queue = Arc::new(QueueService::in_memory("q"));
        let signaler = CompletionSignaler::new(Arc::clone(&queue));

        let payload = json!({ "dataset": "ds1", "count": 42, "nested": { "ok": true } });
        signaler.signal(&[done("ds1", payload.clone())]).await.unwrap();

        let raw = queue
            .pop_done(Duration::from_millis(100))
            .await
            .unwrap()
            .unwrap();
        let decoded: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(decoded, payload);
    }

    #[tokio::test]
    async fn test_completions_pushed_in_order() {
        let queue = Arc::new(QueueService::in_memory("q"));
        let signaler = CompletionSignaler::new(Arc::clone(&queue));

        signaler
            .signal(&[
                done("ds1", json!({ "seq": 1 })),
                done("ds2", json!({ "seq": 2 })),
            ])
            .await
            .unwrap();

        let first = queue
            .pop_done(Duration::from_millis(100))
            .await
            .unwrap()
            .unwrap();
        let second = queue
            .pop_done(Duration::from_millis(100))
            .await
            .unwrap()
            .unwrap();
        assert!(first.contains("\"seq\":1"));
        assert!(second.contains("\"seq\":2"));
    }
}
