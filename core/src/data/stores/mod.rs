//! Store backends
//!
//! Each enabled backend receives every batch in full and decides which
//! message kinds it cares about. A batch only counts as stored once all
//! backends accepted it, so backends must treat `bulk` as atomic: either
//! the whole slice is applied or an error comes back.

mod error;
mod geo;
mod graph;
mod search;

use std::sync::Arc;

use async_trait::async_trait;

pub use error::StoreError;
pub use geo::GeoStore;
pub use graph::GraphStore;
pub use search::SearchStore;

use crate::core::config::{StoreKind, StoresConfig};
use crate::domain::message::Message;

/// A storage backend participating in batch fan-out
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// One-time setup (schemas, indices, constraints)
    async fn initialize(&self) -> Result<(), StoreError>;

    /// Validate the connection
    async fn health_check(&self) -> Result<(), StoreError>;

    /// Apply a slice of work messages
    ///
    /// The slice never contains dataset-done messages; those are handled
    /// by the completion signaler after every backend accepted the batch.
    async fn bulk(&self, messages: &[Message]) -> Result<(), StoreError>;
}

/// Central store service
///
/// Builds the enabled backends from configuration and runs their shared
/// lifecycle (initialize, health check).
pub struct StoreService {
    backends: Vec<Arc<dyn StoreBackend>>,
}

impl StoreService {
    /// Connect the enabled backends
    pub async fn init(config: &StoresConfig) -> Result<Self, StoreError> {
        let mut backends: Vec<Arc<dyn StoreBackend>> = Vec::new();

        for kind in &config.enabled {
            let backend: Arc<dyn StoreBackend> = match kind {
                StoreKind::Graph => Arc::new(GraphStore::new(&config.graph)?),
                StoreKind::Search => Arc::new(SearchStore::new(&config.search)?),
                StoreKind::Geo => {
                    let geo_config = config.geo.as_ref().ok_or_else(|| {
                        StoreError::Config("geo store enabled without a url".into())
                    })?;
                    Arc::new(GeoStore::init(geo_config).await?)
                }
            };
            backends.push(backend);
        }

        if backends.is_empty() {
            tracing::warn!("No store backends enabled; batches will be consumed without storage");
        }

        Ok(Self { backends })
    }

    /// Build a service from pre-constructed backends (tests)
    pub fn from_backends(backends: Vec<Arc<dyn StoreBackend>>) -> Self {
        Self { backends }
    }

    /// Run one-time setup on every backend
    pub async fn initialize(&self) -> Result<(), StoreError> {
        for backend in &self.backends {
            backend.initialize().await?;
            tracing::info!(store = backend.name(), "Store initialized");
        }
        Ok(())
    }

    /// Health-check every backend, failing on the first unhealthy one
    pub async fn health_check(&self) -> Result<(), StoreError> {
        for backend in &self.backends {
            backend.health_check().await?;
        }
        Ok(())
    }

    pub fn backends(&self) -> &[Arc<dyn StoreBackend>] {
        &self.backends
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{GraphConfig, SearchConfig};

    fn stores_config(enabled: Vec<StoreKind>) -> StoresConfig {
        StoresConfig {
            enabled,
            graph: GraphConfig {
                url: "http://localhost:7474".to_string(),
                database: "neo4j".to_string(),
                user: None,
                password: None,
            },
            search: SearchConfig {
                url: "http://localhost:9200".to_string(),
                index: "chronotope".to_string(),
            },
            geo: None,
        }
    }

    #[tokio::test]
    async fn test_init_with_no_backends() {
        let service = StoreService::init(&stores_config(vec![])).await.unwrap();
        assert!(service.is_empty());
        assert!(service.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_init_geo_without_url_fails() {
        let result = StoreService::init(&stores_config(vec![StoreKind::Geo])).await;
        assert!(matches!(result, Err(StoreError::Config(_))));
    }

    #[tokio::test]
    async fn test_init_http_backends_builds_without_io() {
        // Graph and search clients connect lazily, so construction succeeds
        // with nothing listening
        let service = StoreService::init(&stores_config(vec![StoreKind::Graph, StoreKind::Search]))
            .await
            .unwrap();
        assert_eq!(service.backends().len(), 2);
        assert_eq!(service.backends()[0].name(), "graph");
        assert_eq!(service.backends()[1].name(), "search");
    }
}
