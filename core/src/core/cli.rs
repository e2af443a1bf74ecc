use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::config::{QueueBackendType, StoreKind};
use super::constants::{
    ENV_BATCH_SIZE, ENV_BATCH_TIMEOUT_MS, ENV_CONFIG, ENV_GEO_URL, ENV_GRAPH_DATABASE,
    ENV_GRAPH_PASSWORD, ENV_GRAPH_URL, ENV_GRAPH_USER, ENV_QUEUE_BACKEND, ENV_QUEUE_NAME,
    ENV_QUEUE_URL, ENV_SEARCH_INDEX, ENV_SEARCH_URL, ENV_STORES,
};

#[derive(Parser)]
#[command(name = "chronotope")]
#[command(version, about = "Batching ingestion core", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Work queue backend (memory or redis)
    #[arg(long, global = true, env = ENV_QUEUE_BACKEND, value_parser = parse_queue_backend)]
    pub queue_backend: Option<QueueBackendType>,

    /// Redis queue URL
    #[arg(long, global = true, env = ENV_QUEUE_URL)]
    pub queue_url: Option<String>,

    /// Inbound queue name (completions go to `<name>-dataset-done`)
    #[arg(long, short = 'q', global = true, env = ENV_QUEUE_NAME)]
    pub queue_name: Option<String>,

    /// Close a batch once it holds this many messages
    #[arg(long, global = true, env = ENV_BATCH_SIZE)]
    pub batch_size: Option<usize>,

    /// Close a batch this many milliseconds after its first message
    #[arg(long, global = true, env = ENV_BATCH_TIMEOUT_MS)]
    pub batch_timeout_ms: Option<u64>,

    /// Enabled store backends, comma-separated (graph, search, geo)
    #[arg(long, global = true, env = ENV_STORES, value_parser = parse_store_kinds)]
    pub stores: Option<StoreKinds>,

    /// Graph store (Neo4j) base URL
    #[arg(long, global = true, env = ENV_GRAPH_URL)]
    pub graph_url: Option<String>,

    /// Graph store database name
    #[arg(long, global = true, env = ENV_GRAPH_DATABASE)]
    pub graph_database: Option<String>,

    /// Graph store user
    #[arg(long, global = true, env = ENV_GRAPH_USER)]
    pub graph_user: Option<String>,

    /// Graph store password
    #[arg(long, global = true, env = ENV_GRAPH_PASSWORD)]
    pub graph_password: Option<String>,

    /// Search store (Elasticsearch) base URL
    #[arg(long, global = true, env = ENV_SEARCH_URL)]
    pub search_url: Option<String>,

    /// Search store index name
    #[arg(long, global = true, env = ENV_SEARCH_INDEX)]
    pub search_index: Option<String>,

    /// Geo store (PostgreSQL) connection URL
    #[arg(long, global = true, env = ENV_GEO_URL)]
    pub geo_url: Option<String>,
}

/// Comma-separated list of store kinds, as parsed from CLI/env
#[derive(Debug, Clone)]
pub struct StoreKinds(pub Vec<StoreKind>);

/// Parse queue backend from CLI/env string
fn parse_queue_backend(s: &str) -> Result<QueueBackendType, String> {
    match s.to_lowercase().as_str() {
        "memory" => Ok(QueueBackendType::Memory),
        "redis" => Ok(QueueBackendType::Redis),
        _ => Err(format!(
            "Invalid queue backend '{}'. Valid options: memory, redis",
            s
        )),
    }
}

/// Parse a comma-separated list of store kinds from CLI/env string
fn parse_store_kinds(s: &str) -> Result<StoreKinds, String> {
    let mut kinds = Vec::new();
    for part in s.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let kind = match part.to_lowercase().as_str() {
            "graph" => StoreKind::Graph,
            "search" => StoreKind::Search,
            "geo" => StoreKind::Geo,
            _ => {
                return Err(format!(
                    "Invalid store '{}'. Valid options: graph, search, geo",
                    part
                ));
            }
        };
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(StoreKinds(kinds))
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the ingestion pipeline (default command)
    Start,
    /// Validate configuration and connectivity to the queue and stores
    Check,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub queue_backend: Option<QueueBackendType>,
    pub queue_url: Option<String>,
    pub queue_name: Option<String>,
    pub batch_size: Option<usize>,
    pub batch_timeout_ms: Option<u64>,
    pub stores: Option<Vec<StoreKind>>,
    pub graph_url: Option<String>,
    pub graph_database: Option<String>,
    pub graph_user: Option<String>,
    pub graph_password: Option<String>,
    pub search_url: Option<String>,
    pub search_index: Option<String>,
    pub geo_url: Option<String>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        queue_backend: cli.queue_backend,
        queue_url: cli.queue_url,
        queue_name: cli.queue_name,
        batch_size: cli.batch_size,
        batch_timeout_ms: cli.batch_timeout_ms,
        stores: cli.stores.map(|s| s.0),
        graph_url: cli.graph_url,
        graph_database: cli.graph_database,
        graph_user: cli.graph_user,
        graph_password: cli.graph_password,
        search_url: cli.search_url,
        search_index: cli.search_index,
        geo_url: cli.geo_url,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_queue_backend() {
        assert_eq!(
            parse_queue_backend("redis").unwrap(),
            QueueBackendType::Redis
        );
        assert_eq!(
            parse_queue_backend("MEMORY").unwrap(),
            QueueBackendType::Memory
        );
        assert!(parse_queue_backend("kafka").is_err());
    }

    #[test]
    fn test_parse_store_kinds() {
        let kinds = parse_store_kinds("graph,search,geo").unwrap();
        assert_eq!(
            kinds.0,
            vec![StoreKind::Graph, StoreKind::Search, StoreKind::Geo]
        );
    }

    #[test]
    fn test_parse_store_kinds_dedup_and_whitespace() {
        let kinds = parse_store_kinds(" graph , graph ,search").unwrap();
        assert_eq!(kinds.0, vec![StoreKind::Graph, StoreKind::Search]);
    }

    #[test]
    fn test_parse_store_kinds_invalid() {
        assert!(parse_store_kinds("graph,mongo").is_err());
    }

    #[test]
    fn test_parse_store_kinds_empty() {
        assert!(parse_store_kinds("").unwrap().0.is_empty());
    }
}
