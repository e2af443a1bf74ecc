//! Message preprocessing
//!
//! Pure per-message normalization, applied before batching. Returns a new
//! message value instead of mutating in place, so the same input can be
//! inspected by every store backend without aliasing surprises.
//!
//! Messages that cannot be normalized are dropped (with a warning) rather
//! than poisoning the batch that contains them.

use serde_json::Value;

use super::message::{Message, MessageKind};
use super::normalize::{canonical_date_range, canonical_id};

/// Payload fields holding temporal validity
const DATE_FIELDS: [&str; 2] = ["validSince", "validUntil"];

/// Normalize a single message
///
/// - `entity`: canonicalize `validSince`/`validUntil` when present, compute
///   the canonical `id` from `id` or `uri`, and drop the raw `uri` field
/// - `relation`: canonicalize the `from` and `to` identifiers
/// - `dataset-done` and unrecognized kinds: pass through unchanged
///
/// Returns `None` when a required field is missing or malformed; the
/// caller compacts these away so no placeholder flows downstream.
pub fn preprocess(message: Message) -> Option<Message> {
    match message.kind {
        MessageKind::Entity => preprocess_entity(message),
        MessageKind::Relation => preprocess_relation(message),
        MessageKind::DatasetDone | MessageKind::Other(_) => Some(message),
    }
}

fn preprocess_entity(mut message: Message) -> Option<Message> {
    let dataset = message.meta.dataset.clone();
    let payload = match message.payload.as_object_mut() {
        Some(p) => p,
        None => {
            tracing::warn!(dataset = %dataset, "Dropping entity with non-object payload");
            return None;
        }
    };

    for field in DATE_FIELDS {
        if let Some(value) = payload.get(field) {
            match canonical_date_range(value) {
                Ok(range) => {
                    payload.insert(field.to_string(), range);
                }
                Err(e) => {
                    tracing::warn!(dataset = %dataset, field, error = %e, "Dropping entity with invalid date");
                    return None;
                }
            }
        }
    }

    // Prefer an explicit id, fall back to the raw uri
    let raw = payload
        .get("id")
        .or_else(|| payload.get("uri"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let raw = match raw {
        Some(r) => r,
        None => {
            tracing::warn!(dataset = %dataset, "Dropping entity without id or uri");
            return None;
        }
    };

    match canonical_id(&raw, &dataset) {
        Ok(id) => {
            payload.insert("id".to_string(), Value::String(id));
            payload.remove("uri");
            Some(message)
        }
        Err(e) => {
            tracing::warn!(dataset = %dataset, error = %e, "Dropping entity with invalid identifier");
            None
        }
    }
}

fn preprocess_relation(mut message: Message) -> Option<Message> {
    let dataset = message.meta.dataset.clone();
    let payload = match message.payload.as_object_mut() {
        Some(p) => p,
        None => {
            tracing::warn!(dataset = %dataset, "Dropping relation with non-object payload");
            return None;
        }
    };

    for field in ["from", "to"] {
        let raw = payload.get(field).and_then(Value::as_str).map(str::to_string);
        let raw = match raw {
            Some(r) => r,
            None => {
                tracing::warn!(dataset = %dataset, field, "Dropping relation without endpoint");
                return None;
            }
        };
        match canonical_id(&raw, &dataset) {
            Ok(id) => {
                payload.insert(field.to_string(), Value::String(id));
            }
            Err(e) => {
                tracing::warn!(dataset = %dataset, field, error = %e, "Dropping relation with invalid endpoint");
                return None;
            }
        }
    }

    Some(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::message::Meta;
    use serde_json::json;

    fn entity(payload: Value) -> Message {
        Message {
            kind: MessageKind::Entity,
            meta: Meta::for_dataset("ds1"),
            payload,
        }
    }

    #[test]
    fn test_entity_uri_becomes_canonical_id() {
        let msg = entity(json!({ "uri": "foo", "validSince": "2020" }));
        let out = preprocess(msg).unwrap();

        assert_eq!(out.payload["id"], "ds1/foo");
        assert!(out.payload.get("uri").is_none());
        assert_eq!(out.payload["validSince"], json!(["2020-01-01", "2020-12-31"]));
    }

    #[test]
    fn test_entity_id_preferred_over_uri() {
        let msg = entity(json!({ "id": "bar", "uri": "foo" }));
        let out = preprocess(msg).unwrap();
        assert_eq!(out.payload["id"], "ds1/bar");
        assert!(out.payload.get("uri").is_none());
    }

    #[test]
    fn test_entity_without_dates_passes() {
        let msg = entity(json!({ "id": "bar", "name": "Amsterdam" }));
        let out = preprocess(msg).unwrap();
        assert_eq!(out.payload["name"], "Amsterdam");
    }

    #[test]
    fn test_entity_missing_identifier_dropped() {
        let msg = entity(json!({ "name": "nameless" }));
        assert!(preprocess(msg).is_none());
    }

    #[test]
    fn test_entity_invalid_date_dropped() {
        let msg = entity(json!({ "id": "x", "validSince": "soonish" }));
        assert!(preprocess(msg).is_none());
    }

    #[test]
    fn test_relation_endpoints_canonicalized() {
        let msg = Message {
            kind: MessageKind::Relation,
            meta: Meta::for_dataset("ds1"),
            payload: json!({ "from": "a", "to": "urn:hg:b", "label": "owns" }),
        };
        let out = preprocess(msg).unwrap();
        assert_eq!(out.payload["from"], "ds1/a");
        assert_eq!(out.payload["to"], "urn:hg:b");
        assert_eq!(out.payload["label"], "owns");
    }

    #[test]
    fn test_relation_missing_endpoint_dropped() {
        let msg = Message {
            kind: MessageKind::Relation,
            meta: Meta::for_dataset("ds1"),
            payload: json!({ "from": "a" }),
        };
        assert!(preprocess(msg).is_none());
    }

    #[test]
    fn test_dataset_done_untouched() {
        let msg = Message {
            kind: MessageKind::DatasetDone,
            meta: Meta::for_dataset("ds1"),
            payload: json!({ "uri": "left-alone", "validSince": "2020" }),
        };
        let out = preprocess(msg.clone()).unwrap();
        assert_eq!(out, msg);
    }

    #[test]
    fn test_unknown_kind_untouched() {
        let msg = Message {
            kind: MessageKind::Other("snapshot".to_string()),
            meta: Meta::for_dataset("ds1"),
            payload: json!({ "uri": "left-alone" }),
        };
        let out = preprocess(msg.clone()).unwrap();
        assert_eq!(out, msg);
    }

    #[test]
    fn test_preprocess_is_idempotent() {
        let msg = entity(json!({ "uri": "foo", "validSince": "2020" }));
        let once = preprocess(msg).unwrap();
        let twice = preprocess(once.clone()).unwrap();
        assert_eq!(once, twice);
    }
}
