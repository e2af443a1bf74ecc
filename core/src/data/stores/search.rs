//! Search store backend (Elasticsearch)
//!
//! Indexes entities via the `_bulk` NDJSON endpoint, one document per
//! entity keyed by canonical id. Relations are graph-only and are not
//! indexed. The raw `data` field is stripped before indexing, matching
//! what downstream search consumers actually query.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::StoreBackend;
use super::error::StoreError;
use crate::core::config::SearchConfig;
use crate::core::constants::STORE_HTTP_TIMEOUT_SECS;
use crate::domain::message::{Message, MessageKind};

/// Payload fields never sent to the index
const EXCLUDED_FIELDS: [&str; 2] = ["data", "action"];

pub struct SearchStore {
    client: reqwest::Client,
    base_url: String,
    index: String,
}

impl SearchStore {
    pub fn new(config: &SearchConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(STORE_HTTP_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            index: config.index.clone(),
        })
    }

    fn index_url(&self) -> String {
        format!("{}/{}", self.base_url, self.index)
    }

    async fn index_exists(&self) -> Result<bool, StoreError> {
        let response = self.client.head(self.index_url()).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        response.error_for_status()?;
        Ok(true)
    }

    async fn create_index(&self) -> Result<(), StoreError> {
        // Geometry is stored but not indexed; spatial queries belong to the
        // geo store
        let mapping = json!({
            "mappings": {
                "properties": {
                    "id": { "type": "keyword" },
                    "dataset": { "type": "keyword" },
                    "type": { "type": "keyword" },
                    "name": { "type": "text" },
                    "validSince": { "type": "keyword" },
                    "validUntil": { "type": "keyword" },
                    "geometry": { "type": "object", "enabled": false }
                }
            }
        });

        self.client
            .put(self.index_url())
            .json(&mapping)
            .send()
            .await?
            .error_for_status()?;

        tracing::debug!(index = %self.index, "Search index created");
        Ok(())
    }

    /// Build the NDJSON `_bulk` body for a slice of messages
    fn bulk_body(&self, messages: &[Message]) -> Result<String, StoreError> {
        let mut body = String::new();

        for message in messages {
            if message.kind != MessageKind::Entity {
                continue;
            }
            let Some(id) = message.payload_str("id") else {
                continue;
            };

            if message.is_delete() {
                let action = json!({ "delete": { "_index": self.index, "_id": id } });
                body.push_str(&serde_json::to_string(&action)?);
                body.push('\n');
            } else {
                let action = json!({ "index": { "_index": self.index, "_id": id } });
                body.push_str(&serde_json::to_string(&action)?);
                body.push('\n');
                body.push_str(&serde_json::to_string(&document(message))?);
                body.push('\n');
            }
        }

        Ok(body)
    }
}

/// Document body for an entity, with excluded fields stripped
fn document(message: &Message) -> Value {
    let Some(fields) = message.payload.as_object() else {
        return json!({});
    };

    let mut doc: serde_json::Map<String, Value> = fields
        .iter()
        .filter(|(key, _)| !EXCLUDED_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    doc.insert(
        "dataset".to_string(),
        Value::String(message.meta.dataset.clone()),
    );
    Value::Object(doc)
}

#[async_trait]
impl StoreBackend for SearchStore {
    fn name(&self) -> &'static str {
        "search"
    }

    async fn initialize(&self) -> Result<(), StoreError> {
        if !self.index_exists().await? {
            self.create_index().await?;
        }
        tracing::debug!(index = %self.index, "Search store initialized");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.client
            .get(&self.base_url)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn bulk(&self, messages: &[Message]) -> Result<(), StoreError> {
        let body = self.bulk_body(messages)?;
        // _bulk rejects empty bodies; a batch with no entities is a no-op
        if body.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .post(format!("{}/_bulk", self.base_url))
            .header("content-type", "application/x-ndjson")
            .body(body)
            .send()
            .await?
            .error_for_status()?;

        let result: Value = response.json().await?;
        if result.get("errors").and_then(Value::as_bool) == Some(true) {
            let reason = first_item_error(&result)
                .unwrap_or_else(|| "bulk response reported errors".to_string());
            return Err(StoreError::rejected("search", reason));
        }

        tracing::debug!("Search bulk applied");
        Ok(())
    }
}

/// Extract the first per-item error from a `_bulk` response
fn first_item_error(result: &Value) -> Option<String> {
    result
        .get("items")?
        .as_array()?
        .iter()
        .filter_map(|item| item.as_object()?.values().next())
        .find_map(|op| op.get("error"))
        .map(|error| error.to_string())
}
