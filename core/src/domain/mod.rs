//! Domain logic for the ingestion pipeline
//!
//! - `message` - wire message model
//! - `normalize` - identifier and fuzzy-date canonicalization
//! - `preprocess` - per-message normalization, applied before batching
//! - `source` - work queue consumer feeding the pipeline
//! - `batcher` - time-or-count batch formation
//! - `fanout` - parallel store application
//! - `signal` - completion queue relay
//! - `pipeline` - orchestration and the serial batch barrier

pub mod batcher;
pub mod fanout;
pub mod message;
pub mod normalize;
pub mod pipeline;
pub mod preprocess;
pub mod signal;
pub mod source;

pub use message::{Message, MessageKind, Meta};
pub use pipeline::IngestPipeline;
