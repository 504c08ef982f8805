use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{info, warn};

use super::records::{provider_record, service_request_record, CREATED_AT};
use crate::error::{ApiError, ApiResult};
use crate::store::{Direction, DocumentStore, Precondition, Query, StoreError, BOOKINGS, PROVIDERS};

pub const STATUS_ACCEPTED: &str = "accepted";

/// Reads and updates bookings and provider profiles for the provider dashboard.
pub struct MarketplaceService {
    store: Arc<dyn DocumentStore>,
    guard_accept: bool,
}

impl MarketplaceService {
    pub fn new(store: Arc<dyn DocumentStore>, guard_accept: bool) -> Self {
        Self { store, guard_accept }
    }

    /// Service requests, newest first, optionally restricted to one status.
    pub async fn list_requests(&self, status: Option<&str>) -> ApiResult<Vec<Map<String, Value>>> {
        let mut query = Query::all();
        if let Some(status) = status.filter(|s| !s.is_empty()) {
            query = query.where_eq("status", json!(status));
        }
        let query = query.order_by(CREATED_AT, Direction::Descending);

        let docs = self.store.query(BOOKINGS, query).await?;
        Ok(docs.into_iter().map(service_request_record).collect())
    }

    pub async fn get_request(&self, id: &str) -> ApiResult<Map<String, Value>> {
        self.store
            .get(BOOKINGS, id)
            .await?
            .map(service_request_record)
            .ok_or_else(|| ApiError::NotFound("Service request".to_string()))
    }

    /// Assign a provider and mark the request accepted.
    ///
    /// Unless `guard_accept` is set the write is unconditional: a second
    /// accept overwrites the first provider, and two concurrent accepts race
    /// with the last write winning. With the guard, an accepted request is
    /// refused and the write only lands if the document is unchanged since it
    /// was read.
    pub async fn accept_request(&self, id: &str, provider_id: &str, provider_name: &str) -> ApiResult<()> {
        if provider_id.trim().is_empty() || provider_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("Provider ID and name are required".to_string()));
        }

        let doc = self
            .store
            .get(BOOKINGS, id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Service request".to_string()))?;

        let precondition = if self.guard_accept {
            if doc.get_str("status") == Some(STATUS_ACCEPTED) {
                return Err(ApiError::Conflict("Service request already accepted".to_string()));
            }
            match doc.update_time {
                Some(time) => Precondition::UpdateTime(time),
                None => Precondition::Exists,
            }
        } else {
            Precondition::Exists
        };

        let mut fields = Map::new();
        fields.insert("status".to_string(), json!(STATUS_ACCEPTED));
        fields.insert("preferredProvider".to_string(), json!(provider_id));
        fields.insert("providerName".to_string(), json!(provider_name));

        self.store
            .update(BOOKINGS, id, fields, &["acceptedAt"], precondition)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => ApiError::NotFound("Service request".to_string()),
                StoreError::Conflict(msg) => {
                    warn!("Accept of {} lost a race: {}", id, msg);
                    ApiError::Conflict("Service request was modified concurrently".to_string())
                }
                other => other.into(),
            })?;

        info!("Service request {} accepted by {}", id, provider_id);
        Ok(())
    }

    pub async fn list_providers(&self) -> ApiResult<Vec<Map<String, Value>>> {
        let docs = self.store.query(PROVIDERS, Query::all()).await?;
        Ok(docs.into_iter().map(provider_record).collect())
    }

    pub async fn get_provider(&self, id: &str) -> ApiResult<Map<String, Value>> {
        self.store
            .get(PROVIDERS, id)
            .await?
            .map(provider_record)
            .ok_or_else(|| ApiError::NotFound("Provider".to_string()))
    }
}
