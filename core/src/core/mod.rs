//! Core application infrastructure

pub(crate) mod banner;
pub mod cli;
pub mod config;
pub mod constants;
pub mod shutdown;

pub use crate::app::CoreApp;
pub use cli::{CliConfig, Commands};
pub use config::{AppConfig, QueueBackendType, StoreKind};
pub use shutdown::ShutdownService;

// Re-export the queue service from the data layer
pub use crate::data::queue::QueueService;
