use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::state::{AssistantState, MarketplaceState};
use crate::upload::{save_images, PUBLIC_PREFIX};

pub fn assistant_router(state: AssistantState) -> Router {
    let cors = cors_layer(&state.cors_origins);
    let upload_dir = state.upload_dir.clone();
    let max_upload_bytes = state.max_upload_bytes;

    Router::new()
        .route("/api/health", get(health_check))
        .route("/welcome", get(welcome))
        .route("/ask", post(ask))
        .route("/upload", post(upload_images))
        .route("/bookings", post(create_booking))
        .nest_service(PUBLIC_PREFIX, ServeDir::new(upload_dir))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn marketplace_router(state: MarketplaceState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/service-requests", get(list_service_requests))
        .route("/api/service-requests/:id", get(get_service_request))
        .route("/api/service-requests/:id/accept", post(accept_service_request))
        .route("/api/providers", get(list_providers))
        .route("/api/providers/:id", get(get_provider))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Credentialed CORS for the listed origins; permissive when none are configured.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// Assistant

#[derive(Debug, Deserialize)]
struct WelcomeParams {
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AskRequest {
    question: Option<String>,
    language: Option<String>,
    session_id: Option<String>,
}

async fn welcome(
    State(state): State<AssistantState>,
    Query(params): Query<WelcomeParams>,
) -> ApiResult<Json<Value>> {
    let message = state.service.welcome(params.language.as_deref()).await?;
    Ok(Json(json!({ "welcome_message": message })))
}

/// Parsed from the raw body so every malformed request gets a JSON 400,
/// whatever its content type.
async fn ask(
    State(state): State<AssistantState>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let payload: AskRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::InvalidInput(format!("Invalid request body: {}", e)))?;
    debug!("Ask: {:?}", payload);
    let reply = state
        .service
        .ask(
            payload.question.as_deref(),
            payload.language.as_deref(),
            payload.session_id.as_deref(),
        )
        .await?;
    Ok(Json(json!({ "response": reply })))
}

async fn upload_images(
    State(state): State<AssistantState>,
    multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let files = save_images(&state.upload_dir, multipart).await?;
    Ok(Json(json!({
        "message": "Files uploaded successfully",
        "files": files,
    })))
}

/// The raw body is parsed here so malformed JSON gets the same opaque 500 as
/// a failed write.
async fn create_booking(
    State(state): State<AssistantState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Map<String, Value>>)> {
    let payload: Value =
        serde_json::from_slice(&body).map_err(|e| ApiError::BookingCreate(e.into()))?;
    let record = state.service.create_booking(payload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

// Marketplace

#[derive(Debug, Deserialize)]
struct ListParams {
    status: Option<String>,
}

async fn list_service_requests(
    State(state): State<MarketplaceState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Map<String, Value>>>> {
    let records = state.service.list_requests(params.status.as_deref()).await?;
    Ok(Json(records))
}

async fn get_service_request(
    State(state): State<MarketplaceState>,
    Path(request_id): Path<String>,
) -> ApiResult<Json<Map<String, Value>>> {
    Ok(Json(state.service.get_request(&request_id).await?))
}

/// Provider ids may arrive as strings or numbers.
fn text_field(payload: &Value, key: &str) -> String {
    match payload.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

async fn accept_service_request(
    State(state): State<MarketplaceState>,
    Path(request_id): Path<String>,
    payload: Option<Json<Value>>,
) -> ApiResult<Json<Value>> {
    let payload = payload.map(|Json(v)| v).unwrap_or(Value::Null);
    let provider_id = text_field(&payload, "providerId");
    let provider_name = text_field(&payload, "providerName");

    state
        .service
        .accept_request(&request_id, &provider_id, &provider_name)
        .await?;
    Ok(Json(json!({ "message": "Service request accepted successfully" })))
}

async fn list_providers(
    State(state): State<MarketplaceState>,
) -> ApiResult<Json<Vec<Map<String, Value>>>> {
    Ok(Json(state.service.list_providers().await?))
}

async fn get_provider(
    State(state): State<MarketplaceState>,
    Path(provider_id): Path<String>,
) -> ApiResult<Json<Map<String, Value>>> {
    Ok(Json(state.service.get_provider(&provider_id).await?))
}
