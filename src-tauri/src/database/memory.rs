//! In-process document store
//!
//! Keeps documents in memory with the same observable semantics as the
//! remote store: generated ids, server timestamps, equality filters and
//! ordering that leaves out documents lacking the ordered field.
//! Used by tests in place of the remote database.

use super::{Direction, Document, DocumentStore, Fields, Query};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

type Collections = HashMap<String, BTreeMap<String, Fields>>;

#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a document in place as-is, bypassing write accounting
    pub async fn insert(&self, collection: &str, id: &str, fields: Fields) {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }

    /// Number of create/update calls that reached the store
    pub fn write_count(&self) -> usize {
        self.writes.load(AtomicOrdering::SeqCst)
    }

    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }
}

fn server_now() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(a), Value::String(b)) => {
            match (DateTime::parse_from_rfc3339(a), DateTime::parse_from_rfc3339(b)) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                _ => a.cmp(b),
            }
        }
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or_default();
            let b = b.as_f64().unwrap_or_default();
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document {
                id: id.to_string(),
                fields: fields.clone(),
            }))
    }

    async fn create(
        &self,
        collection: &str,
        mut fields: Fields,
        server_timestamps: &[&str],
    ) -> Result<String> {
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);

        let id = Uuid::new_v4().simple().to_string();
        for field in server_timestamps {
            fields.insert(field.to_string(), server_now());
        }

        self.insert(collection, &id, fields).await;

        tracing::debug!("Created document {}/{}", collection, id);
        Ok(id)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        server_timestamps: &[&str],
    ) -> Result<()> {
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);

        let mut collections = self.collections.write().await;
        let existing = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| AppError::NotFound(format!("{}/{}", collection, id)))?;

        existing.extend(fields);
        for field in server_timestamps {
            existing.insert(field.to_string(), server_now());
        }

        tracing::debug!("Updated document {}/{}", collection, id);
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<Document> = docs
            .iter()
            .filter(|(_, fields)| {
                query
                    .filters
                    .iter()
                    .all(|(field, expected)| fields.get(field) == Some(expected))
            })
            .filter(|(_, fields)| match &query.order_by {
                Some((field, _)) => fields.get(field).is_some_and(|v| !v.is_null()),
                None => true,
            })
            .map(|(id, fields)| Document {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect();

        if let Some((field, direction)) = &query.order_by {
            matches.sort_by(|a, b| {
                let ordering = compare_values(&a.fields[field], &b.fields[field]);
                match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_create_sets_server_timestamps() {
        let store = MemoryStore::new();

        let id = store
            .create("complaints", fields(json!({ "title": "Snare" })), &["submissionTimestamp"])
            .await
            .unwrap();

        let doc = store.get("complaints", &id).await.unwrap().unwrap();
        assert_eq!(doc.fields["title"], "Snare");
        assert!(doc.fields["submissionTimestamp"].is_string());
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let store = MemoryStore::new();

        let result = store
            .update("complaints", "missing", fields(json!({ "status": "Resolved" })), &[])
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_query_filters_and_orders() {
        let store = MemoryStore::new();
        store
            .insert("complaints", "a", fields(json!({ "userId": "u1", "ts": "2025-01-01T00:00:00Z" })))
            .await;
        store
            .insert("complaints", "b", fields(json!({ "userId": "u1", "ts": "2025-02-01T00:00:00Z" })))
            .await;
        store
            .insert("complaints", "c", fields(json!({ "userId": "u2", "ts": "2025-03-01T00:00:00Z" })))
            .await;
        store
            .insert("complaints", "d", fields(json!({ "userId": "u1" })))
            .await;

        let query = Query::new()
            .where_eq("userId", "u1")
            .order_by("ts", Direction::Descending);
        let docs = store.query("complaints", &query).await.unwrap();

        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_timestamps_order_by_instant() {
        let store = MemoryStore::new();
        store
            .insert("complaints", "whole", fields(json!({ "ts": "2025-06-01T08:00:00Z" })))
            .await;
        store
            .insert("complaints", "half", fields(json!({ "ts": "2025-06-01T08:00:00.5Z" })))
            .await;
        store
            .insert("complaints", "offset", fields(json!({ "ts": "2025-06-01T09:30:00+02:00" })))
            .await;

        let query = Query::new().order_by("ts", Direction::Descending);
        let docs = store.query("complaints", &query).await.unwrap();

        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["half", "whole", "offset"]);
    }
}
