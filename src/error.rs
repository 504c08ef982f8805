use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::store::StoreError;

/// Errors returned by HTTP handlers. Each kind maps to one status code and a
/// message that is safe to show to the caller.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Language '{0}' not supported.")]
    UnsupportedLanguage(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("upstream call failed: {0:#}")]
    Upstream(anyhow::Error),

    #[error("internal failure: {0:#}")]
    Internal(anyhow::Error),

    #[error("booking creation failed: {0:#}")]
    BookingCreate(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) | ApiError::UnsupportedLanguage(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) | ApiError::BookingCreate(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Upstream(_) => "Upstream service unavailable".to_string(),
            ApiError::Internal(_) => "Internal server error".to_string(),
            ApiError::BookingCreate(_) => "Failed to create booking".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::NotFound(what),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Internal(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        } else {
            warn!("Rejected request: {}", self);
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_do_not_leak_their_cause() {
        let err = ApiError::Internal(anyhow::anyhow!("permission denied on projects/secret"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal server error");

        let err = ApiError::Upstream(anyhow::anyhow!("quota exceeded"));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert!(!err.public_message().contains("quota"));
    }

    #[test]
    fn store_errors_map_to_client_statuses() {
        let err: ApiError = StoreError::NotFound("Service request".into()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.public_message(), "Service request not found");

        let err: ApiError = StoreError::Conflict("busy".into()).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn unsupported_language_message() {
        let err = ApiError::UnsupportedLanguage("klingon".into());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Language 'klingon' not supported.");
    }
}
