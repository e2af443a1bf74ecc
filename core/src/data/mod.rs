//! Data layer
//!
//! Connection-owning services: the work queue (memory or Redis) and the
//! store backends (graph, search, geo).

pub mod queue;
pub mod stores;

pub use queue::{QueueError, QueueService};
pub use stores::{StoreBackend, StoreError, StoreService};
