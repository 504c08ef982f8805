pub mod codec;
pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

use crate::config::StoreConfig;

pub const BOOKINGS: &str = "bookings";
pub const PROVIDERS: &str = "service_providers";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("document store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not decode document: {0}")]
    Decode(String),

    #[error("document store error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A schema-free record. Timestamps surface as RFC 3339 strings.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
    pub update_time: Option<String>,
}

impl Document {
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// The document's fields with its id injected as `id`.
    pub fn into_record(self) -> Map<String, Value> {
        let mut record = self.fields;
        record.insert("id".to_string(), Value::String(self.id));
        record
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Default)]
pub struct Query {
    /// Equality filter: `field == value`
    pub filter: Option<(String, Value)>,
    pub order_by: Option<(String, Direction)>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: &str, value: Value) -> Self {
        self.filter = Some((field.to_string(), value));
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }
}

/// Write guard for partial updates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// The document must exist
    Exists,
    /// The document must not have changed since this update time
    UpdateTime(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn query(&self, collection: &str, query: Query) -> StoreResult<Vec<Document>>;

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Insert a new document with a generated id. Fields named in
    /// `server_timestamps` are set from the store's clock.
    async fn create(
        &self,
        collection: &str,
        fields: Map<String, Value>,
        server_timestamps: &[&str],
    ) -> StoreResult<Document>;

    /// Merge `fields` into an existing document and stamp `server_timestamps`.
    /// Fails with `NotFound` if the document is missing and `Conflict` if an
    /// update-time precondition no longer holds.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
        server_timestamps: &[&str],
        precondition: Precondition,
    ) -> StoreResult<()>;
}

/// Build the store named by `store.backend`
pub fn create_store(config: &StoreConfig, client: Client) -> anyhow::Result<Arc<dyn DocumentStore>> {
    info!("Initializing document store: {}", config.backend);
    match config.backend.as_str() {
        "firestore" => {
            if config.project_id.is_empty() {
                anyhow::bail!("store.project_id is required for the firestore backend");
            }
            Ok(Arc::new(FirestoreStore::new(config, client)))
        }
        "memory" => Ok(Arc::new(MemoryStore::new())),
        other => Err(anyhow::anyhow!("Unsupported store backend: {}", other)),
    }
}
