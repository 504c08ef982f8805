use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use super::codec::{decode_document, decode_value, encode_fields, encode_value};
use super::{Direction, Document, DocumentStore, Precondition, Query, StoreError, StoreResult};
use crate::config::StoreConfig;

/// Cloud Firestore over the v1 REST API
pub struct FirestoreStore {
    base_url: String,
    database_path: String,
    access_token: Option<String>,
    client: Client,
}

impl FirestoreStore {
    pub fn new(config: &StoreConfig, client: Client) -> Self {
        let database_path = format!(
            "projects/{}/databases/{}",
            config.project_id, config.database
        );
        info!(
            "Initialized FirestoreStore: base_url={}, database={}",
            config.base_url, database_path
        );
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            database_path,
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
            client,
        }
    }

    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/documents/{}/{}", self.database_path, collection, id)
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/{}{}", self.base_url, self.database_path, suffix)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn commit(&self, write: Value) -> StoreResult<Value> {
        let request = self
            .client
            .post(self.url("/documents:commit"))
            .json(&json!({ "writes": [write] }));
        let response = self.authorized(request).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

/// Map Firestore error statuses onto store errors.
async fn check_status(response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: Value = response.json().await.unwrap_or(Value::Null);
    let code = body
        .pointer("/error/status")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let message = body
        .pointer("/error/message")
        .and_then(Value::as_str)
        .unwrap_or("no message")
        .to_string();

    if status == StatusCode::NOT_FOUND || code == "NOT_FOUND" {
        Err(StoreError::NotFound(message))
    } else if status == StatusCode::CONFLICT || code == "FAILED_PRECONDITION" || code == "ABORTED" {
        Err(StoreError::Conflict(message))
    } else {
        Err(StoreError::Backend(format!("{} {}: {}", status, code, message)))
    }
}

/// Backtick-quote field names that are not simple identifiers
fn field_path(name: &str) -> String {
    let simple = name
        .chars()
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false)
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

fn server_time_transforms(fields: &[&str]) -> Vec<Value> {
    fields
        .iter()
        .map(|f| json!({ "fieldPath": field_path(f), "setToServerValue": "REQUEST_TIME" }))
        .collect()
}

fn structured_query(collection: &str, query: &Query) -> Value {
    let mut structured = json!({ "from": [{ "collectionId": collection }] });
    if let Some((field, value)) = &query.filter {
        structured["where"] = json!({
            "fieldFilter": {
                "field": { "fieldPath": field_path(field) },
                "op": "EQUAL",
                "value": encode_value(value),
            }
        });
    }
    if let Some((field, direction)) = &query.order_by {
        let direction = match direction {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        };
        structured["orderBy"] = json!([{ "field": { "fieldPath": field_path(field) }, "direction": direction }]);
    }
    json!({ "structuredQuery": structured })
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn query(&self, collection: &str, query: Query) -> StoreResult<Vec<Document>> {
        let body = structured_query(collection, &query);
        debug!("Firestore runQuery on {}: {}", collection, body);

        let request = self.client.post(self.url("/documents:runQuery")).json(&body);
        let response = check_status(self.authorized(request).send().await?).await?;
        let rows: Vec<Value> = response.json().await?;

        // Rows without a document only carry progress info
        rows.iter()
            .filter_map(|row| row.get("document"))
            .map(decode_document)
            .collect()
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let url = format!("{}/{}", self.base_url, self.document_name(collection, id));
        let response = self.authorized(self.client.get(&url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response).await?;
        let doc: Value = response.json().await?;
        decode_document(&doc).map(Some)
    }

    async fn create(
        &self,
        collection: &str,
        fields: Map<String, Value>,
        server_timestamps: &[&str],
    ) -> StoreResult<Document> {
        let id = Uuid::new_v4().simple().to_string();
        let write = json!({
            "update": {
                "name": self.document_name(collection, &id),
                "fields": encode_fields(&fields),
            },
            "updateTransforms": server_time_transforms(server_timestamps),
            "currentDocument": { "exists": false },
        });

        let result = self.commit(write).await?;
        let write_result = result.pointer("/writeResults/0").cloned().unwrap_or(Value::Null);

        // Transform results come back in the order the transforms were sent
        let mut fields = fields;
        if let Some(values) = write_result.get("transformResults").and_then(Value::as_array) {
            for (name, value) in server_timestamps.iter().zip(values) {
                fields.insert(name.to_string(), decode_value(value)?);
            }
        }
        let update_time = write_result
            .get("updateTime")
            .and_then(Value::as_str)
            .map(str::to_string);

        info!("Created {}/{}", collection, id);
        Ok(Document { id, fields, update_time })
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
        server_timestamps: &[&str],
        precondition: Precondition,
    ) -> StoreResult<()> {
        let field_paths: Vec<String> = fields.keys().map(|k| field_path(k)).collect();
        let current_document = match precondition {
            Precondition::Exists => json!({ "exists": true }),
            Precondition::UpdateTime(time) => json!({ "updateTime": time }),
        };
        let write = json!({
            "update": {
                "name": self.document_name(collection, id),
                "fields": encode_fields(&fields),
            },
            "updateMask": { "fieldPaths": field_paths },
            "updateTransforms": server_time_transforms(server_timestamps),
            "currentDocument": current_document,
        });

        match self.commit(write).await {
            Err(StoreError::NotFound(_)) => Err(StoreError::NotFound(format!("{}/{}", collection, id))),
            other => other.map(|_| ()),
        }
    }
}
