//! Wire message model
//!
//! Messages arrive on the work queue as JSON objects:
//!
//! ```json
//! { "type": "entity", "meta": { "dataset": "ds1" }, "payload": { ... } }
//! ```
//!
//! Unrecognized `type` tags are preserved verbatim so future kinds flow
//! through the pipeline without being rewritten or dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message kind tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageKind {
    /// Create or update a node-like entity
    Entity,
    /// Create or update an edge between two entities
    Relation,
    /// A dataset finished producing work; relay the payload downstream
    /// once everything before it is stored
    DatasetDone,
    /// Unknown tag, preserved verbatim
    Other(String),
}

impl MessageKind {
    pub fn as_str(&self) -> &str {
        match self {
            MessageKind::Entity => "entity",
            MessageKind::Relation => "relation",
            MessageKind::DatasetDone => "dataset-done",
            MessageKind::Other(tag) => tag,
        }
    }

    pub fn is_dataset_done(&self) -> bool {
        matches!(self, MessageKind::DatasetDone)
    }
}

impl From<String> for MessageKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "entity" => MessageKind::Entity,
            "relation" => MessageKind::Relation,
            "dataset-done" => MessageKind::DatasetDone,
            _ => MessageKind::Other(tag),
        }
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Message metadata
///
/// Only `dataset` is interpreted; producers may attach extra fields and
/// they survive re-encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub dataset: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Meta {
    pub fn for_dataset(dataset: &str) -> Self {
        Self {
            dataset: dataset.to_string(),
            extra: serde_json::Map::new(),
        }
    }
}

/// A single work queue message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub meta: Meta,
    pub payload: Value,
}

impl Message {
    /// Decode a raw queue payload
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Payload field accessor (object payloads only)
    pub fn payload_str(&self, field: &str) -> Option<&str> {
        self.payload.get(field).and_then(Value::as_str)
    }

    /// True when the payload asks for a deletion instead of an upsert
    pub fn is_delete(&self) -> bool {
        self.payload_str("action") == Some("delete")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_entity() {
        let raw = r#"{
            "type": "entity",
            "meta": { "dataset": "ds1" },
            "payload": { "uri": "foo", "validSince": "2020" }
        }"#;
        let msg = Message::decode(raw).unwrap();
        assert_eq!(msg.kind, MessageKind::Entity);
        assert_eq!(msg.meta.dataset, "ds1");
        assert_eq!(msg.payload_str("uri"), Some("foo"));
    }

    #[test]
    fn test_decode_unknown_kind_preserved() {
        let raw = r#"{ "type": "snapshot", "meta": { "dataset": "d" }, "payload": {} }"#;
        let msg = Message::decode(raw).unwrap();
        assert_eq!(msg.kind, MessageKind::Other("snapshot".to_string()));

        let encoded = serde_json::to_value(&msg).unwrap();
        assert_eq!(encoded["type"], "snapshot");
    }

    #[test]
    fn test_decode_rejects_missing_meta() {
        let raw = r#"{ "type": "entity", "payload": {} }"#;
        assert!(Message::decode(raw).is_err());
    }

    #[test]
    fn test_meta_extra_fields_survive_roundtrip() {
        let raw = r#"{
            "type": "relation",
            "meta": { "dataset": "d", "source": "importer-7" },
            "payload": { "from": "a", "to": "b" }
        }"#;
        let msg = Message::decode(raw).unwrap();
        let encoded = serde_json::to_value(&msg).unwrap();
        assert_eq!(encoded["meta"]["source"], "importer-7");
    }

    #[test]
    fn test_is_delete() {
        let msg = Message {
            kind: MessageKind::Entity,
            meta: Meta::for_dataset("d"),
            payload: json!({ "id": "d/1", "action": "delete" }),
        };
        assert!(msg.is_delete());

        let msg = Message {
            kind: MessageKind::Entity,
            meta: Meta::for_dataset("d"),
            payload: json!({ "id": "d/1", "action": "add" }),
        };
        assert!(!msg.is_delete());
    }

    #[test]
    fn test_dataset_done_payload_is_opaque() {
        let raw = r#"{
            "type": "dataset-done",
            "meta": { "dataset": "d" },
            "payload": { "anything": [1, 2, {"nested": true}] }
        }"#;
        let msg = Message::decode(raw).unwrap();
        assert!(msg.kind.is_dataset_done());
        assert_eq!(msg.payload["anything"][2]["nested"], true);
    }
}
