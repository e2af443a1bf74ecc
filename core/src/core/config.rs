use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::cli::CliConfig;
use super::constants::{
    CONFIG_FILE_NAME, DEFAULT_BATCH_SIZE, DEFAULT_BATCH_TIMEOUT_MS, DEFAULT_GEO_MAX_CONNECTIONS,
    DEFAULT_GEO_STATEMENT_TIMEOUT_SECS, DEFAULT_GRAPH_DATABASE, DEFAULT_GRAPH_URL,
    DEFAULT_QUEUE_NAME, DEFAULT_QUEUE_URL, DEFAULT_SEARCH_INDEX, DEFAULT_SEARCH_URL,
};

// =============================================================================
// Queue Backend Enum
// =============================================================================

/// Work queue backend type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueBackendType {
    Memory,
    #[default]
    Redis,
}

impl fmt::Display for QueueBackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueBackendType::Memory => write!(f, "memory"),
            QueueBackendType::Redis => write!(f, "redis"),
        }
    }
}

// =============================================================================
// Store Kind Enum
// =============================================================================

/// A store backend that can participate in batch fan-out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Graph store (Neo4j)
    Graph,
    /// Search store (Elasticsearch)
    Search,
    /// Geo store (PostgreSQL)
    Geo,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Graph => write!(f, "graph"),
            StoreKind::Search => write!(f, "search"),
            StoreKind::Geo => write!(f, "geo"),
        }
    }
}

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// Queue configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct QueueFileConfig {
    pub backend: Option<QueueBackendType>,
    pub url: Option<String>,
    pub name: Option<String>,
}

/// Batching configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CoreFileConfig {
    pub batch_size: Option<usize>,
    pub batch_timeout_ms: Option<u64>,
}

/// Graph store configuration section (nested under stores)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct GraphFileConfig {
    pub url: Option<String>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// Search store configuration section (nested under stores)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchFileConfig {
    pub url: Option<String>,
    pub index: Option<String>,
}

/// Geo store configuration section (nested under stores)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct GeoFileConfig {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub statement_timeout_secs: Option<u64>,
}

/// Store configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StoresFileConfig {
    pub enabled: Option<Vec<StoreKind>>,
    pub graph: Option<GraphFileConfig>,
    pub search: Option<SearchFileConfig>,
    pub geo: Option<GeoFileConfig>,
}

/// Root config file structure
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FileConfig {
    pub queue: Option<QueueFileConfig>,
    pub core: Option<CoreFileConfig>,
    pub stores: Option<StoresFileConfig>,

    /// Unknown fields, collected for warnings
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FileConfig {
    /// Load and parse a config file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: FileConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Warn about unrecognized top-level fields
    pub fn warn_unknown_fields(&self) {
        for key in self.extra.keys() {
            tracing::warn!(field = %key, "Unknown config file field ignored");
        }
    }
}

// =============================================================================
// Resolved Config
// =============================================================================

/// Resolved work queue configuration
#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub backend: QueueBackendType,
    pub url: String,
    pub name: String,
}

/// Resolved batching configuration
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Close a batch once it holds this many messages
    pub batch_size: usize,
    /// Close a batch this long after its first message arrived
    pub batch_timeout: Duration,
}

/// Resolved graph store configuration
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub url: String,
    pub database: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// Resolved search store configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub url: String,
    pub index: String,
}

/// Resolved geo store configuration
#[derive(Debug, Clone)]
pub struct GeoConfig {
    pub url: String,
    pub max_connections: u32,
    pub statement_timeout_secs: u64,
}

/// Resolved store configuration
#[derive(Debug, Clone)]
pub struct StoresConfig {
    pub enabled: Vec<StoreKind>,
    pub graph: GraphConfig,
    pub search: SearchConfig,
    pub geo: Option<GeoConfig>,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub queue: QueueConfig,
    pub core: CoreConfig,
    pub stores: StoresConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Config file (CLI-specified path, or `chronotope.json` in the
    ///    working directory)
    /// 3. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");

        let file_config = if let Some(ref path) = cli.config {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            let config = FileConfig::load_from_file(path)?;
            tracing::debug!(path = %path.display(), "Config file loaded");
            config
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() {
                let config = FileConfig::load_from_file(&local)?;
                tracing::debug!(path = %local.display(), "Config file loaded");
                config
            } else {
                FileConfig::default()
            }
        };
        file_config.warn_unknown_fields();

        Self::resolve(file_config, cli)
    }

    /// Layer defaults, file config, and CLI/env overrides
    fn resolve(file_config: FileConfig, cli: &CliConfig) -> Result<Self> {
        let file_queue = file_config.queue.unwrap_or_default();
        let file_core = file_config.core.unwrap_or_default();
        let file_stores = file_config.stores.unwrap_or_default();
        let file_graph = file_stores.graph.unwrap_or_default();
        let file_search = file_stores.search.unwrap_or_default();
        let file_geo = file_stores.geo.unwrap_or_default();

        let queue = QueueConfig {
            backend: cli
                .queue_backend
                .or(file_queue.backend)
                .unwrap_or_default(),
            url: cli
                .queue_url
                .clone()
                .or(file_queue.url)
                .unwrap_or_else(|| DEFAULT_QUEUE_URL.to_string()),
            name: cli
                .queue_name
                .clone()
                .or(file_queue.name)
                .unwrap_or_else(|| DEFAULT_QUEUE_NAME.to_string()),
        };

        let batch_size = cli
            .batch_size
            .or(file_core.batch_size)
            .unwrap_or(DEFAULT_BATCH_SIZE);
        let batch_timeout_ms = cli
            .batch_timeout_ms
            .or(file_core.batch_timeout_ms)
            .unwrap_or(DEFAULT_BATCH_TIMEOUT_MS);

        let enabled = cli.stores.clone().or(file_stores.enabled).unwrap_or_else(
            || vec![StoreKind::Graph, StoreKind::Search, StoreKind::Geo],
        );

        let graph = GraphConfig {
            url: cli
                .graph_url
                .clone()
                .or(file_graph.url)
                .unwrap_or_else(|| DEFAULT_GRAPH_URL.to_string()),
            database: cli
                .graph_database
                .clone()
                .or(file_graph.database)
                .unwrap_or_else(|| DEFAULT_GRAPH_DATABASE.to_string()),
            user: cli.graph_user.clone().or(file_graph.user),
            password: cli.graph_password.clone().or(file_graph.password),
        };

        let search = SearchConfig {
            url: cli
                .search_url
                .clone()
                .or(file_search.url)
                .unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string()),
            index: cli
                .search_index
                .clone()
                .or(file_search.index)
                .unwrap_or_else(|| DEFAULT_SEARCH_INDEX.to_string()),
        };

        // Geo store has no sensible default URL; it stays unconfigured unless
        // a connection string is provided.
        let geo = cli
            .geo_url
            .clone()
            .or(file_geo.url)
            .map(|url| GeoConfig {
                url,
                max_connections: file_geo
                    .max_connections
                    .unwrap_or(DEFAULT_GEO_MAX_CONNECTIONS),
                statement_timeout_secs: file_geo
                    .statement_timeout_secs
                    .unwrap_or(DEFAULT_GEO_STATEMENT_TIMEOUT_SECS),
            });

        let config = Self {
            queue,
            core: CoreConfig {
                batch_size,
                batch_timeout: Duration::from_millis(batch_timeout_ms),
            },
            stores: StoresConfig {
                enabled,
                graph,
                search,
                geo,
            },
        };

        config.validate()?;

        tracing::debug!(
            queue_backend = %config.queue.backend,
            queue = %config.queue.name,
            batch_size = config.core.batch_size,
            batch_timeout_ms = config.core.batch_timeout.as_millis() as u64,
            stores = ?config.stores.enabled,
            "Configuration resolved"
        );

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.core.batch_size == 0 {
            anyhow::bail!("batch_size must be at least 1");
        }
        if self.core.batch_timeout.is_zero() {
            anyhow::bail!("batch_timeout_ms must be at least 1");
        }
        if self.queue.backend == QueueBackendType::Redis && self.queue.url.is_empty() {
            anyhow::bail!("queue.url is required for the redis queue backend");
        }
        if self.stores.enabled.contains(&StoreKind::Geo) && self.stores.geo.is_none() {
            anyhow::bail!("stores.geo.url is required when the geo store is enabled");
        }
        Ok(())
    }
}
