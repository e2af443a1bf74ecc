//! Graph store backend (Neo4j)
//!
//! Talks to the Neo4j transactional HTTP endpoint
//! (`/db/{database}/tx/commit`). Entities become `:Entity` nodes keyed by
//! canonical id; relations become `:RELATES` edges carrying their type as
//! a property, so edge kinds stay data instead of schema.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::StoreBackend;
use super::error::StoreError;
use crate::core::config::GraphConfig;
use crate::core::constants::STORE_HTTP_TIMEOUT_SECS;
use crate::domain::message::{Message, MessageKind};

pub struct GraphStore {
    client: reqwest::Client,
    tx_url: String,
    auth: Option<(String, String)>,
}

impl GraphStore {
    pub fn new(config: &GraphConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(STORE_HTTP_TIMEOUT_SECS))
            .build()?;

        let base = config.url.trim_end_matches('/');
        let tx_url = format!("{}/db/{}/tx/commit", base, config.database);

        let auth = match (&config.user, &config.password) {
            (Some(user), Some(password)) => Some((user.clone(), password.clone())),
            _ => None,
        };

        Ok(Self {
            client,
            tx_url,
            auth,
        })
    }

    /// Execute Cypher statements in one transaction
    async fn commit(&self, statements: Vec<Value>) -> Result<(), StoreError> {
        let mut request = self
            .client
            .post(&self.tx_url)
            .json(&json!({ "statements": statements }));

        if let Some((user, password)) = &self.auth {
            request = request.basic_auth(user, Some(password));
        }

        let response = request.send().await?.error_for_status()?;
        let body: Value = response.json().await?;

        // The endpoint reports per-statement failures with HTTP 200
        if let Some(errors) = body.get("errors").and_then(Value::as_array)
            && let Some(first) = errors.first()
        {
            let reason = first
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(StoreError::rejected("graph", reason));
        }

        Ok(())
    }

    fn entity_statement(message: &Message) -> Option<Value> {
        let id = message.payload_str("id")?;

        if message.is_delete() {
            return Some(json!({
                "statement": "MATCH (n:Entity {id: $id}) DETACH DELETE n",
                "parameters": { "id": id }
            }));
        }

        Some(json!({
            "statement": "MERGE (n:Entity {id: $id}) SET n += $props",
            "parameters": { "id": id, "props": node_props(&message.payload) }
        }))
    }

    fn relation_statement(message: &Message) -> Option<Value> {
        let from = message.payload_str("from")?;
        let to = message.payload_str("to")?;
        let rel_type = message
            .payload_str("type")
            .or_else(|| message.payload_str("label"))
            .unwrap_or("related");

        if message.is_delete() {
            return Some(json!({
                "statement": "MATCH (f:Entity {id: $from})-[r:RELATES {type: $type}]->(t:Entity {id: $to}) DELETE r",
                "parameters": { "from": from, "to": to, "type": rel_type }
            }));
        }

        Some(json!({
            "statement": "MERGE (f:Entity {id: $from}) \
                          MERGE (t:Entity {id: $to}) \
                          MERGE (f)-[r:RELATES {type: $type}]->(t)",
            "parameters": { "from": from, "to": to, "type": rel_type }
        }))
    }
}

/// Node properties from an entity payload
///
/// Neo4j properties must be scalars or arrays of scalars; nested objects
/// (geometry, source data) are stored as JSON strings.
fn node_props(payload: &Value) -> Value {
    let Some(fields) = payload.as_object() else {
        return json!({});
    };

    let props: serde_json::Map<String, Value> = fields
        .iter()
        .filter(|(key, _)| *key != "action")
        .map(|(key, value)| {
            let flat = if value.is_object() {
                Value::String(value.to_string())
            } else {
                value.clone()
            };
            (key.clone(), flat)
        })
        .collect();

    Value::Object(props)
}

#[async_trait]
impl StoreBackend for GraphStore {
    fn name(&self) -> &'static str {
        "graph"
    }

    async fn initialize(&self) -> Result<(), StoreError> {
        self.commit(vec![json!({
            "statement": "CREATE CONSTRAINT entity_id IF NOT EXISTS \
                          FOR (n:Entity) REQUIRE n.id IS UNIQUE"
        })])
        .await?;
        tracing::debug!(url = %self.tx_url, "Graph store initialized");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.commit(vec![json!({ "statement": "RETURN 1" })]).await
    }

    async fn bulk(&self, messages: &[Message]) -> Result<(), StoreError> {
        let statements: Vec<Value> = messages
            .iter()
            .filter_map(|message| match message.kind {
                MessageKind::Entity => Self::entity_statement(message),
                MessageKind::Relation => Self::relation_statement(message),
                _ => None,
            })
            .collect();

        if statements.is_empty() {
            return Ok(());
        }

        let count = statements.len();
        self.commit(statements).await?;
        tracing::debug!(statements = count, "Graph bulk applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::message::Meta;

    fn entity(payload: Value) -> Message {
        Message {
            kind: MessageKind::Entity,
            meta: Meta::for_dataset("ds1"),
            payload,
        }
    }

    #[test]
    fn test_entity_statement_merges_by_id() {
        let msg = entity(json!({ "id": "ds1/foo", "name": "Foo" }));
        let stmt = GraphStore::entity_statement(&msg).unwrap();
        assert!(
            stmt["statement"]
                .as_str()
                .unwrap()
                .starts_with("MERGE (n:Entity")
        );
        assert_eq!(stmt["parameters"]["id"], "ds1/foo");
        assert_eq!(stmt["parameters"]["props"]["name"], "Foo");
    }

    #[test]
    fn test_entity_delete_detaches() {
        let msg = entity(json!({ "id": "ds1/foo", "action": "delete" }));
        let stmt = GraphStore::entity_statement(&msg).unwrap();
        assert!(stmt["statement"].as_str().unwrap().contains("DETACH DELETE"));
    }

    #[test]
    fn test_entity_without_id_skipped() {
        let msg = entity(json!({ "name": "No id" }));
        assert!(GraphStore::entity_statement(&msg).is_none());
    }

    #[test]
    fn test_relation_statement_uses_type_property() {
        let msg = Message {
            kind: MessageKind::Relation,
            meta: Meta::for_dataset("ds1"),
            payload: json!({ "from": "ds1/a", "to": "ds1/b", "type": "hg:liesIn" }),
        };
        let stmt = GraphStore::relation_statement(&msg).unwrap();
        assert_eq!(stmt["parameters"]["type"], "hg:liesIn");
    }

    #[test]
    fn test_node_props_flattens_objects_and_drops_action() {
        let props = node_props(&json!({
            "id": "ds1/foo",
            "action": "add",
            "geometry": { "type": "Point", "coordinates": [4.9, 52.4] },
            "validSince": ["2020-01-01", "2020-12-31"]
        }));
        assert!(props.get("action").is_none());
        assert!(props["geometry"].is_string());
        assert!(props["validSince"].is_array());
    }
}
