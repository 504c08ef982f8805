use std::path::Path;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use regex::Regex;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use homeserve_backend::assistant::prompt::WELCOME_MESSAGE;
use homeserve_backend::assistant::AssistantService;
use homeserve_backend::llm::StatelessLLMInterface;
use homeserve_backend::routes::assistant_router;
use homeserve_backend::state::AssistantState;
use homeserve_backend::store::MemoryStore;
use homeserve_backend::testing::{FailingLLM, FailingTranslator, ScriptedLLM, TaggingTranslator};
use homeserve_backend::translate::TranslateInterface;
use homeserve_backend::Language;

const RAW_ANSWER: &str = "An electrician can fix that socket today.";
const BOUNDARY: &str = "homeserveboundary";

fn app_with(llm: Arc<dyn StatelessLLMInterface>, upload_dir: &Path) -> Router {
    app_with_translator(llm, Arc::new(TaggingTranslator::default()), upload_dir)
}

fn app_with_translator(
    llm: Arc<dyn StatelessLLMInterface>,
    translator: Arc<dyn TranslateInterface>,
    upload_dir: &Path,
) -> Router {
    let service = AssistantService::new(llm, translator, Arc::new(MemoryStore::new()), None);
    assistant_router(AssistantState {
        service: Arc::new(service),
        upload_dir: upload_dir.to_path_buf(),
        max_upload_bytes: 1024 * 1024,
        cors_origins: vec![],
    })
}

fn app(upload_dir: &Path) -> Router {
    app_with(Arc::new(ScriptedLLM::new(RAW_ANSWER)), upload_dir)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    post_raw(uri, "application/json", body.to_string())
}

fn post_raw(uri: &str, content_type: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", content_type)
        .body(body.into())
        .unwrap()
}

fn multipart(parts: &[(&str, &str, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (field, filename, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                field, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn welcome_is_translated_for_every_other_language() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());

    let (status, body) = send(&app, get("/welcome")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["welcome_message"], WELCOME_MESSAGE);

    for lang in Language::ALL {
        let (status, body) = send(&app, get(&format!("/welcome?language={}", lang.name()))).await;
        assert_eq!(status, StatusCode::OK);
        let message = body["welcome_message"].as_str().unwrap();
        if lang.is_english() {
            assert_eq!(message, WELCOME_MESSAGE);
        } else {
            assert_eq!(message, format!("[{}] {}", lang.code(), WELCOME_MESSAGE));
        }
    }
}

#[tokio::test]
async fn welcome_language_is_case_insensitive_and_lenient() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());

    let (_, body) = send(&app, get("/welcome?language=ENGLISH")).await;
    assert_eq!(body["welcome_message"], WELCOME_MESSAGE);

    let (status, body) = send(&app, get("/welcome?language=klingon")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["welcome_message"], format!("[en] {}", WELCOME_MESSAGE));
}

#[tokio::test]
async fn ask_without_question_is_rejected_for_any_language() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());

    for language in ["english", "hindi", "klingon"] {
        let (status, body) = send(&app, post_json("/ask", json!({ "question": "", "language": language }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Please provide a question");
    }
    let (status, _) = send(&app, post_json("/ask", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ask_rejects_unsupported_language() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());

    let (status, body) = send(
        &app,
        post_json("/ask", json!({ "question": "Need AC service", "language": "Klingon" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Language 'klingon' not supported.");
}

#[tokio::test]
async fn ask_in_english_returns_raw_answer() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());

    let (status, body) = send(&app, post_json("/ask", json!({ "question": "Socket sparks" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], RAW_ANSWER);
}

#[tokio::test]
async fn ask_in_other_language_returns_translation() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());

    let (status, body) = send(
        &app,
        post_json("/ask", json!({ "question": "Socket sparks", "language": "Telugu" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let response = body["response"].as_str().unwrap();
    assert_ne!(response, RAW_ANSWER);
    assert_eq!(response, format!("[te] {}", RAW_ANSWER));
}

#[tokio::test]
async fn model_failure_is_a_bad_gateway() {
    let dir = TempDir::new().unwrap();
    let app = app_with(Arc::new(FailingLLM), dir.path());

    let (status, body) = send(&app, post_json("/ask", json!({ "question": "hello" }))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Upstream service unavailable");
}

#[tokio::test]
async fn ask_with_malformed_body_is_a_json_bad_request() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());

    let (status, body) = send(&app, post_json("/ask", json!({ "question": 42 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));

    let (status, body) = send(&app, post_raw("/ask", "application/json", "{bad")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn ask_accepts_json_sent_without_json_content_type() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());

    let request = post_raw("/ask", "text/plain", r#"{"question":"Socket sparks"}"#);
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], RAW_ANSWER);
}

#[tokio::test]
async fn translation_failure_is_a_bad_gateway() {
    let dir = TempDir::new().unwrap();
    let app = app_with_translator(
        Arc::new(ScriptedLLM::new(RAW_ANSWER)),
        Arc::new(FailingTranslator),
        dir.path(),
    );

    let (status, body) = send(&app, get("/welcome?language=hindi")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, json!({ "error": "Upstream service unavailable" }));

    let (status, body) = send(
        &app,
        post_json("/ask", json!({ "question": "Socket sparks", "language": "hindi" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, json!({ "error": "Upstream service unavailable" }));

    let (status, body) = send(&app, get("/welcome")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["welcome_message"], WELCOME_MESSAGE);
}

#[tokio::test]
async fn upload_keeps_images_and_drops_other_files() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());

    let request = multipart(&[
        ("images", "x.png", b"png-bytes"),
        ("images", "x.exe", b"MZ"),
    ]);
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Files uploaded successfully");

    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    let path = files[0].as_str().unwrap();
    assert!(Regex::new(r"^/uploads/\d{8}_\d{6}_x\.png$").unwrap().is_match(path));

    let stored = dir.path().join(path.trim_start_matches("/uploads/"));
    assert_eq!(std::fs::read(stored).unwrap(), b"png-bytes");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

    let response = app.clone().oneshot(get(path)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"png-bytes");
}

#[tokio::test]
async fn upload_without_images_field_is_rejected() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());

    let (status, body) = send(&app, multipart(&[("avatar", "me.png", b"data")])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file part");
}

#[tokio::test]
async fn missing_upload_is_not_found() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());

    let response = app.clone().oneshot(get("/uploads/nothing.png")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn booking_is_created() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());

    let (status, body) = send(
        &app,
        post_json("/bookings", json!({ "serviceType": "Cleaning", "location": "Pune" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["serviceType"], "Cleaning");
    assert_eq!(body["status"], "pending");
    assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn malformed_booking_fails_with_generic_message() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());

    let (status, body) = send(&app, post_raw("/bookings", "application/json", "{not json")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to create booking" }));

    let (status, _) = send(&app, post_json("/bookings", json!("just a string"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
