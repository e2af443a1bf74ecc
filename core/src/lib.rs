//! Chronotope Core
//!
//! A continuous ingestion worker: consumes change messages (entity upserts,
//! relations, dataset-completion markers) from a durable work queue,
//! normalizes identifiers and date fields, groups messages into bounded
//! batches, and applies each batch to every enabled storage backend in
//! parallel. Dataset completion is signaled downstream only after a batch has
//! been durably applied to all backends.

pub mod app;
pub mod core;
pub mod data;
pub mod domain;
