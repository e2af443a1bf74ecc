//! Geo store backend (PostgreSQL)
//!
//! Keeps one row per entity with its geometry and remaining fields as
//! jsonb, upserted by canonical id. Schema setup happens at startup:
//! the table and its dataset index are created when missing, checked
//! through `information_schema` so reruns are safe.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};

use super::StoreBackend;
use super::error::StoreError;
use crate::core::config::GeoConfig;
use crate::domain::message::{Message, MessageKind};

/// Entity table name
const TABLE: &str = "entities";

/// Pool acquire timeout
const ACQUIRE_TIMEOUT_SECS: u64 = 10;

pub struct GeoStore {
    pool: PgPool,
}

impl GeoStore {
    /// Connect and configure the pool
    pub async fn init(config: &GeoConfig) -> Result<Self, StoreError> {
        let mut options: PgConnectOptions = config
            .url
            .parse()
            .map_err(|e| StoreError::Config(format!("Invalid PostgreSQL URL: {}", e)))?;

        options = options.disable_statement_logging();

        // Statement timeout at connection level to stop runaway queries
        if config.statement_timeout_secs > 0 {
            options = options.options([(
                "statement_timeout",
                format!("{}s", config.statement_timeout_secs),
            )]);
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
            .connect_with(options)
            .await?;

        tracing::debug!(
            max_connections = config.max_connections,
            "Geo store connected"
        );

        Ok(Self { pool })
    }

    async fn table_exists(&self) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_name = $1)",
        )
        .bind(TABLE)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create_table(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE entities (\
                id text PRIMARY KEY, \
                dataset text NOT NULL, \
                type text, \
                name text, \
                geometry jsonb, \
                properties jsonb NOT NULL DEFAULT '{}'::jsonb\
             )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX entities_dataset_idx ON entities(dataset)")
            .execute(&self.pool)
            .await?;

        tracing::debug!(table = TABLE, "Geo table created");
        Ok(())
    }
}

#[async_trait]
impl StoreBackend for GeoStore {
    fn name(&self) -> &'static str {
        "geo"
    }

    async fn initialize(&self) -> Result<(), StoreError> {
        if !self.table_exists().await? {
            self.create_table().await?;
        }
        tracing::debug!("Geo store initialized");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn bulk(&self, messages: &[Message]) -> Result<(), StoreError> {
        let entities: Vec<&Message> = messages
            .iter()
            .filter(|m| m.kind == MessageKind::Entity && m.payload_str("id").is_some())
            .collect();

        if entities.is_empty() {
            return Ok(());
        }

        // One transaction per batch so a partial failure leaves no
        // half-applied rows
        let mut tx = self.pool.begin().await?;

        for message in &entities {
            let id = message.payload_str("id").unwrap_or_default();

            if message.is_delete() {
                sqlx::query("DELETE FROM entities WHERE id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                continue;
            }

            let row = EntityRow::from_message(message);
            sqlx::query(
                "INSERT INTO entities (id, dataset, type, name, geometry, properties) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 ON CONFLICT (id) DO UPDATE SET \
                    dataset = EXCLUDED.dataset, \
                    type = EXCLUDED.type, \
                    name = EXCLUDED.name, \
                    geometry = EXCLUDED.geometry, \
                    properties = EXCLUDED.properties",
            )
            .bind(id)
            .bind(&message.meta.dataset)
            .bind(row.entity_type)
            .bind(row.name)
            .bind(row.geometry)
            .bind(row.properties)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(entities = entities.len(), "Geo bulk applied");
        Ok(())
    }
}

/// Column values extracted from an entity payload
struct EntityRow {
    entity_type: Option<String>,
    name: Option<String>,
    geometry: Option<Value>,
    properties: Value,
}

impl EntityRow {
    /// Known columns are lifted out of the payload; whatever remains lands
    /// in `properties`
    fn from_message(message: &Message) -> Self {
        let entity_type = message.payload_str("type").map(str::to_string);
        let name = message.payload_str("name").map(str::to_string);
        let geometry = message.payload.get("geometry").cloned();

        let properties = match message.payload.as_object() {
            Some(fields) => Value::Object(
                fields
                    .iter()
                    .filter(|(key, _)| {
                        !matches!(
                            key.as_str(),
                            "id" | "type" | "name" | "geometry" | "action"
                        )
                    })
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            ),
            None => Value::Object(serde_json::Map::new()),
        };

        Self {
            entity_type,
            name,
            geometry,
            properties,
        }
    }
}
