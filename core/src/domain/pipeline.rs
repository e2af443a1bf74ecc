//! Ingest pipeline orchestration
//!
//! Wires the stages together:
//!
//! ```text
//! work queue -> source (decode + preprocess) -> batcher -> fan-out -> completion queue
//! ```
//!
//! Batches apply strictly one at a time: batch N+1's fan-out does not
//! start until batch N's outcome is known. That serial barrier is what
//! keeps completion signals behind the data that causally precedes them,
//! and it doubles as backpressure against the source channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::batcher::Batcher;
use super::fanout::FanoutExecutor;
use super::message::Message;
use super::signal::CompletionSignaler;
use super::source::MessageSource;
use crate::core::config::CoreConfig;
use crate::data::queue::QueueService;
use crate::data::stores::StoreService;

pub struct IngestPipeline {
    queue: Arc<QueueService>,
    stores: Arc<StoreService>,
    batch_size: usize,
    batch_timeout: Duration,
}

impl IngestPipeline {
    pub fn new(queue: Arc<QueueService>, stores: Arc<StoreService>, config: &CoreConfig) -> Self {
        Self {
            queue,
            stores,
            batch_size: config.batch_size,
            batch_timeout: config.batch_timeout,
        }
    }

    /// Start the pipeline
    ///
    /// Runs until shutdown, then drains: the source stops feeding, the
    /// batcher flushes its partial batch, and the final fan-out completes
    /// before the handle resolves.
    pub fn start(self, shutdown_rx: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let (rx, source_handle) =
                MessageSource::new(Arc::clone(&self.queue)).start(shutdown_rx);
            let mut batcher = Batcher::new(rx, self.batch_size, self.batch_timeout);
            let executor = FanoutExecutor::new(self.stores.backends().to_vec());
            let signaler = CompletionSignaler::new(Arc::clone(&self.queue));

            tracing::debug!(
                batch_size = self.batch_size,
                batch_timeout_ms = self.batch_timeout.as_millis() as u64,
                stores = self.stores.backends().len(),
                "Ingest pipeline started"
            );

            while let Some(batch) = batcher.next_batch().await {
                Self::process_batch(&executor, &signaler, batch).await;
            }

            let _ = source_handle.await;
            tracing::debug!("Ingest pipeline stopped");
        })
    }

    /// Apply one batch and, on success, signal its completions
    async fn process_batch(
        executor: &FanoutExecutor,
        signaler: &CompletionSignaler,
        batch: Vec<Message>,
    ) {
        let size = batch.len();
        let (completions, work): (Vec<Message>, Vec<Message>) = batch
            .into_iter()
            .partition(|message| message.kind.is_dataset_done());

        match executor.execute(&work).await {
            Ok(()) => {
                tracing::debug!(size, work = work.len(), "Batch applied");
                if let Err(e) = signaler.signal(&completions).await {
                    tracing::error!(error = %e, "Failed to push completion signal");
                }
            }
            Err(e) => {
                // Per-store failures were already logged; completions for
                // this batch are withheld
                tracing::error!(
                    error = %e,
                    size,
                    withheld = completions.len(),
                    "Batch failed, withholding completions"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::stores::{StoreBackend, StoreError};
    use parking_lot::Mutex;
    use serde_json::{Value, json};

    /// Store that records batches and fails a configurable number of times
    struct FlakyStore {
        failures_left: Mutex<u32>,
        batches: Mutex<Vec<Vec<Value>>>,
    }

    impl FlakyStore {
        fn new(failures: u32) -> Arc<Self> {
            Arc::new(Self {
                failures_left: Mutex::new(failures),
                batches: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl StoreBackend for FlakyStore {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn initialize(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn health_check(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn bulk(&self, messages: &[Message]) -> Result<(), StoreError> {
            self.batches
                .lock()
                .push(messages.iter().map(|m| m.payload.clone()).collect());
            let mut failures = self.failures_left.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(StoreError::rejected("flaky", "induced failure"));
            }
            Ok(())
        }
    }

    fn entity_json(id: &str) -> String {
        json!({ "type": "entity", "meta": { "dataset": "ds1" }, "payload": { "id": id } })
            .to_string()
    }

    fn done_json(seq: u64) -> String {
        json!({ "type": "dataset-done", "meta": { "dataset": "ds1" }, "payload": { "seq": seq } })
            .to_string()
    }

    struct Harness {
        queue: Arc<QueueService>,
        shutdown_tx: watch::Sender<bool>,
        handle: JoinHandle<()>,
    }

    fn start_pipeline(store: Arc<dyn StoreBackend>, batch_size: usize) -> Harness {
        let queue = Arc::new(QueueService::in_memory("test"));
        let stores = Arc::new(StoreService::from_backends(vec![store]));
        let config = CoreConfig {
            batch_size,
            batch_timeout: Duration::from_millis(100),
        };
        let pipeline = IngestPipeline::new(Arc::clone(&queue), stores, &config);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = pipeline.start(shutdown_rx);
        Harness {
            queue,
            shutdown_tx,
            handle,
        }
    }

    async fn stop(harness: Harness) {
        harness.shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(10), harness.handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_completion_follows_successful_batch() {
        let store = FlakyStore::new(0);
        let harness = start_pipeline(store.clone(), 2);

        harness.queue.push_work(&entity_json("ds1/a")).await.unwrap();
        harness.queue.push_work(&done_json(1)).await.unwrap();

        let raw = tokio::time::timeout(
            Duration::from_secs(5),
            harness.queue.pop_done(Duration::from_secs(5)),
        )
        .await
        .unwrap()
        .unwrap()
        .unwrap();
        let payload: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(payload, json!({ "seq": 1 }));

        // The store saw the work message but not the dataset-done
        let batches = store.batches.lock().clone();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], vec![json!({ "id": "ds1/a" })]);

        stop(harness).await;
    }

    #[tokio::test]
    async fn test_failed_batch_withholds_completions_and_next_proceeds() {
        let store = FlakyStore::new(1);
        let harness = start_pipeline(store.clone(), 2);

        // Batch 1 fails (store's single induced failure)
        harness.queue.push_work(&entity_json("ds1/a")).await.unwrap();
        harness.queue.push_work(&done_json(1)).await.unwrap();
        // Batch 2 succeeds
        harness.queue.push_work(&entity_json("ds1/b")).await.unwrap();
        harness.queue.push_work(&done_json(2)).await.unwrap();

        // Only batch 2's completion arrives
        let raw = tokio::time::timeout(
            Duration::from_secs(5),
            harness.queue.pop_done(Duration::from_secs(5)),
        )
        .await
        .unwrap()
        .unwrap()
        .unwrap();
        let payload: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(payload, json!({ "seq": 2 }));

        // And nothing else follows
        let next = harness
            .queue
            .pop_done(Duration::from_millis(200))
            .await
            .unwrap();
        assert!(next.is_none());

        // Both batches reached the store, in order
        let batches = store.batches.lock().clone();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0], vec![json!({ "id": "ds1/a" })]);
        assert_eq!(batches[1], vec![json!({ "id": "ds1/b" })]);

        stop(harness).await;
    }

    #[tokio::test]
    async fn test_completions_only_batch_skips_stores() {
        let store = FlakyStore::new(0);
        let harness = start_pipeline(store.clone(), 1);

        harness.queue.push_work(&done_json(7)).await.unwrap();

        let raw = tokio::time::timeout(
            Duration::from_secs(5),
            harness.queue.pop_done(Duration::from_secs(5)),
        )
        .await
        .unwrap()
        .unwrap()
        .unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&raw).unwrap(),
            json!({ "seq": 7 })
        );

        // Empty work never reaches the store
        assert!(store.batches.lock().is_empty());

        stop(harness).await;
    }

    #[tokio::test]
    async fn test_unknown_kind_flows_to_stores() {
        let store = FlakyStore::new(0);
        let harness = start_pipeline(store.clone(), 2);

        let unknown = json!({
            "type": "snapshot",
            "meta": { "dataset": "ds1" },
            "payload": { "marker": true }
        })
        .to_string();
        harness.queue.push_work(&unknown).await.unwrap();
        harness.queue.push_work(&done_json(1)).await.unwrap();

        tokio::time::timeout(
            Duration::from_secs(5),
            harness.queue.pop_done(Duration::from_secs(5)),
        )
        .await
        .unwrap()
        .unwrap()
        .unwrap();

        let batches = store.batches.lock().clone();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], vec![json!({ "marker": true })]);

        stop(harness).await;
    }

    #[tokio::test]
    async fn test_zero_stores_consume_and_signal() {
        let queue = Arc::new(QueueService::in_memory("test"));
        let stores = Arc::new(StoreService::from_backends(vec![]));
        let config = CoreConfig {
            batch_size: 2,
            batch_timeout: Duration::from_millis(100),
        };
        let pipeline = IngestPipeline::new(Arc::clone(&queue), stores, &config);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = pipeline.start(shutdown_rx);

        queue.push_work(&entity_json("ds1/a")).await.unwrap();
        queue.push_work(&done_json(1)).await.unwrap();

        let raw = tokio::time::timeout(
            Duration::from_secs(5),
            queue.pop_done(Duration::from_secs(5)),
        )
        .await
        .unwrap()
        .unwrap()
        .unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&raw).unwrap(),
            json!({ "seq": 1 })
        );

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
