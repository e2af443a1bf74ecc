// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "Chronotope";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "chronotope";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "chronotope.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "CHRONOTOPE_CONFIG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "CHRONOTOPE_LOG";

// =============================================================================
// Environment Variables - Queue
// =============================================================================

/// Environment variable for queue backend (memory or redis)
pub const ENV_QUEUE_BACKEND: &str = "CHRONOTOPE_QUEUE_BACKEND";

/// Environment variable for the Redis queue URL
pub const ENV_QUEUE_URL: &str = "CHRONOTOPE_QUEUE_URL";

/// Environment variable for the inbound queue name
pub const ENV_QUEUE_NAME: &str = "CHRONOTOPE_QUEUE_NAME";

// =============================================================================
// Environment Variables - Batching
// =============================================================================

/// Environment variable for batch size threshold
pub const ENV_BATCH_SIZE: &str = "CHRONOTOPE_BATCH_SIZE";

/// Environment variable for batch timeout in milliseconds
pub const ENV_BATCH_TIMEOUT_MS: &str = "CHRONOTOPE_BATCH_TIMEOUT_MS";

// =============================================================================
// Environment Variables - Stores
// =============================================================================

/// Environment variable for enabled store backends (comma-separated)
pub const ENV_STORES: &str = "CHRONOTOPE_STORES";

/// Environment variable for the graph store (Neo4j) base URL
pub const ENV_GRAPH_URL: &str = "CHRONOTOPE_GRAPH_URL";

/// Environment variable for the graph store database name
pub const ENV_GRAPH_DATABASE: &str = "CHRONOTOPE_GRAPH_DATABASE";

/// Environment variable for the graph store user
pub const ENV_GRAPH_USER: &str = "CHRONOTOPE_GRAPH_USER";

/// Environment variable for the graph store password
pub const ENV_GRAPH_PASSWORD: &str = "CHRONOTOPE_GRAPH_PASSWORD";

/// Environment variable for the search store (Elasticsearch) base URL
pub const ENV_SEARCH_URL: &str = "CHRONOTOPE_SEARCH_URL";

/// Environment variable for the search store index name
pub const ENV_SEARCH_INDEX: &str = "CHRONOTOPE_SEARCH_INDEX";

/// Environment variable for the geo store (PostgreSQL) connection URL
pub const ENV_GEO_URL: &str = "CHRONOTOPE_GEO_URL";

// =============================================================================
// Queue Defaults
// =============================================================================

/// Default Redis queue URL
pub const DEFAULT_QUEUE_URL: &str = "redis://127.0.0.1:6379";

/// Default inbound queue name
pub const DEFAULT_QUEUE_NAME: &str = "chronotope";

/// Suffix for the downstream dataset-completion queue
pub const DONE_QUEUE_SUFFIX: &str = "-dataset-done";

/// Blocking-pop timeout per queue poll (seconds)
pub const SOURCE_POP_TIMEOUT_SECS: u64 = 5;

/// Delay before retrying the queue after a transport error (seconds)
pub const SOURCE_RETRY_DELAY_SECS: u64 = 1;

/// Capacity of the source-to-batcher channel
pub const SOURCE_CHANNEL_CAPACITY: usize = 1024;

// =============================================================================
// Batching Defaults
// =============================================================================

/// Default batch size threshold
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default batch timeout in milliseconds
pub const DEFAULT_BATCH_TIMEOUT_MS: u64 = 1000;

// =============================================================================
// Store Defaults
// =============================================================================

/// Default graph store (Neo4j) base URL
pub const DEFAULT_GRAPH_URL: &str = "http://127.0.0.1:7474";

/// Default graph store database name
pub const DEFAULT_GRAPH_DATABASE: &str = "neo4j";

/// Default search store (Elasticsearch) base URL
pub const DEFAULT_SEARCH_URL: &str = "http://127.0.0.1:9200";

/// Default search store index name
pub const DEFAULT_SEARCH_INDEX: &str = "chronotope";

/// Default geo store connection pool size
pub const DEFAULT_GEO_MAX_CONNECTIONS: u32 = 8;

/// Default geo store statement timeout (seconds)
pub const DEFAULT_GEO_STATEMENT_TIMEOUT_SECS: u64 = 30;

/// HTTP client timeout for store backends (seconds)
pub const STORE_HTTP_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Shutdown
// =============================================================================

/// Maximum time to wait for background tasks during shutdown (seconds)
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 30;
