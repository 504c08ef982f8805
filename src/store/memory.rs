use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{Direction, Document, DocumentStore, Precondition, Query, StoreError, StoreResult};

#[derive(Debug, Clone)]
struct StoredDocument {
    fields: Map<String, Value>,
    update_time: DateTime<Utc>,
}

/// Process-local document store with Firestore's query semantics.
/// Used for local development and tests.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, StoredDocument>>>,
}

fn timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document under a caller-chosen id.
    pub async fn insert(&self, collection: &str, id: &str, fields: Map<String, Value>) {
        let mut collections = self.collections.write().await;
        collections.entry(collection.to_string()).or_default().insert(
            id.to_string(),
            StoredDocument {
                fields,
                update_time: Utc::now(),
            },
        );
    }

    fn to_document(id: &str, stored: &StoredDocument) -> Document {
        Document {
            id: id.to_string(),
            fields: stored.fields.clone(),
            update_time: Some(timestamp(stored.update_time)),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn query(&self, collection: &str, query: Query) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<(&String, &StoredDocument)> = docs
            .iter()
            .filter(|(_, doc)| match &query.filter {
                Some((field, value)) => doc.fields.get(field) == Some(value),
                None => true,
            })
            .collect();

        if let Some((field, direction)) = &query.order_by {
            // Documents without the ordering field are excluded, as in Firestore
            matched.retain(|(_, doc)| doc.fields.contains_key(field));
            matched.sort_by(|(_, a), (_, b)| {
                let ord = compare_values(&a.fields[field.as_str()], &b.fields[field.as_str()]);
                match direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }

        debug!("MemoryStore query on {}: {} result(s)", collection, matched.len());
        Ok(matched
            .into_iter()
            .map(|(id, doc)| Self::to_document(id, doc))
            .collect())
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|doc| Self::to_document(id, doc)))
    }

    async fn create(
        &self,
        collection: &str,
        mut fields: Map<String, Value>,
        server_timestamps: &[&str],
    ) -> StoreResult<Document> {
        let now = Utc::now();
        for name in server_timestamps {
            fields.insert(name.to_string(), Value::String(timestamp(now)));
        }

        let id = Uuid::new_v4().simple().to_string();
        let stored = StoredDocument { fields, update_time: now };
        let doc = Self::to_document(&id, &stored);

        let mut collections = self.collections.write().await;
        collections.entry(collection.to_string()).or_default().insert(id, stored);
        Ok(doc)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
        server_timestamps: &[&str],
        precondition: Precondition,
    ) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", collection, id)))?;

        if let Precondition::UpdateTime(expected) = &precondition {
            if *expected != timestamp(doc.update_time) {
                return Err(StoreError::Conflict(format!(
                    "{}/{} changed since {}",
                    collection, id, expected
                )));
            }
        }

        // Keep update times strictly increasing so preconditions stay meaningful
        let mut now = Utc::now();
        if now.timestamp_micros() <= doc.update_time.timestamp_micros() {
            now = doc.update_time + Duration::microseconds(1);
        }

        doc.fields.extend(fields);
        for name in server_timestamps {
            doc.fields.insert(name.to_string(), Value::String(timestamp(now)));
        }
        doc.update_time = now;
        Ok(())
    }
}
