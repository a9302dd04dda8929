//! HTTP-level tests for the gateway's dispatch table

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use bytes::Bytes;
use chatgate_core::config::FramingMode;
use chatgate_core::http::RequestOptions;
use chatgate_core::protocol::Conversation;
use chatgate_core::providers::gemini::extract_fragment;
use chatgate_core::providers::{
    FailoverRouter, InferenceInput, InferenceOutput, InferenceRunner, PrimaryStream,
    ProviderError, ProviderResult, SecondaryAdapter, StreamingBackend,
};
use chatgate_server::{build_router, AppState};
use futures::stream;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

/// Primary that streams fixed Gemini chunks, or fails with a 503
struct StubPrimary {
    texts: Option<Vec<&'static str>>,
}

#[async_trait]
impl StreamingBackend for StubPrimary {
    fn name(&self) -> &str {
        "stub-primary"
    }

    async fn open_stream(
        &self,
        _conversation: &Conversation,
        _options: &RequestOptions,
    ) -> ProviderResult<PrimaryStream> {
        let texts = self.texts.clone().ok_or(ProviderError::Status {
            status: 503,
            message: "Service Unavailable".to_string(),
        })?;
        let items: Vec<ProviderResult<Bytes>> = texts
            .into_iter()
            .map(|t| {
                Ok(Bytes::from(
                    serde_json::json!({"candidates": [{"content": {"parts": [{"text": t}]}}]})
                        .to_string(),
                ))
            })
            .collect();
        Ok(PrimaryStream {
            body: Box::pin(stream::iter(items)),
            framing: FramingMode::Chunk,
            extract: extract_fragment,
        })
    }
}

struct StubRunner {
    answer: Result<&'static str, &'static str>,
    calls: AtomicUsize,
}

#[async_trait]
impl InferenceRunner for StubRunner {
    fn name(&self) -> &str {
        "stub-runner"
    }

    async fn run(
        &self,
        _model: &str,
        _input: InferenceInput,
        _options: &RequestOptions,
    ) -> ProviderResult<InferenceOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer
            .map(|r| InferenceOutput {
                response: r.to_string(),
            })
            .map_err(|e| ProviderError::Application(e.to_string()))
    }
}

fn app(
    texts: Option<Vec<&'static str>>,
    answer: Result<&'static str, &'static str>,
    static_dir: Option<PathBuf>,
) -> (Router, Arc<StubRunner>) {
    let runner = Arc::new(StubRunner {
        answer,
        calls: AtomicUsize::new(0),
    });
    let router = FailoverRouter::new(
        Arc::new(StubPrimary { texts }),
        SecondaryAdapter::new(runner.clone(), "@cf/test/model"),
    );
    (build_router(AppState::new(router), static_dir), runner)
}

fn chat_request(body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn content_type(response: &Response) -> &str {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_chat_streams_ndjson() {
    let (app, runner) = app(Some(vec!["He", "llo"]), Ok("unused"), None);

    let response = app
        .oneshot(chat_request(r#"{"messages":[{"role":"user","content":"hi"}]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "application/x-ndjson");
    assert_eq!(
        body_string(response).await,
        "{\"response\":\"He\"}\n{\"response\":\"llo\"}\n"
    );
    assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_chat_empty_messages() {
    let (app, runner) = app(Some(vec!["x"]), Ok("unused"), None);

    let response = app
        .oneshot(chat_request(r#"{"messages":[]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(content_type(&response).starts_with("text/plain"));
    assert_eq!(body_string(response).await, "No messages provided.");
    assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_chat_malformed_body() {
    let (app, _) = app(Some(vec!["x"]), Ok("unused"), None);

    let response = app.oneshot(chat_request("{not json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response)
        .await
        .starts_with("Invalid request body"));
}

#[tokio::test]
async fn test_chat_accepts_any_message_shape() {
    let bodies = [
        r#"{"messages":[{"role":"tool","content":"x"}]}"#,
        r#"{"messages":[{"role":"user","content":[{"text":"hi"}]}]}"#,
        r#"{"messages":[{"role":"user"}]}"#,
    ];
    for body in bodies {
        let (app, _) = app(Some(vec!["ok"]), Ok("unused"), None);
        let response = app.oneshot(chat_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "{\"response\":\"ok\"}\n");
    }
}

#[tokio::test]
async fn test_chat_fallback() {
    let (app, runner) = app(None, Ok("Hello from the fallback"), None);

    let response = app
        .oneshot(chat_request(r#"{"messages":[{"role":"user","content":"hi"}]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "application/x-ndjson");
    assert_eq!(
        body_string(response).await,
        "{\"response\":\"(Fallback from Workers AI): Hello from the fallback\"}\n"
    );
    assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_chat_both_failed() {
    let (app, _) = app(None, Err("quota exhausted"), None);

    let response = app
        .oneshot(chat_request(r#"{"messages":[{"role":"user","content":"hi"}]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(content_type(&response), "application/x-ndjson");
    assert_eq!(
        body_string(response).await,
        "{\"error\":\"Both APIs failed. Error: quota exhausted\"}\n"
    );
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app(None, Ok("unused"), None);

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "OK");
}

#[tokio::test]
async fn test_unknown_path_without_static_dir() {
    let (app, _) = app(None, Ok("unused"), None);

    let response = app.oneshot(get("/index.html")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_static_assets_served() {
    let dir = tempfile::TempDir::new().unwrap();
    fs::write(dir.path().join("index.html"), "<h1>chat</h1>").unwrap();
    fs::write(dir.path().join("app.js"), "console.log('hi');").unwrap();

    let (app, _) = app(None, Ok("unused"), Some(dir.path().to_path_buf()));

    let response = app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "<h1>chat</h1>");

    let response = app.clone().oneshot(get("/app.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "console.log('hi');");

    let response = app.oneshot(get("/missing.css")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chat_route_is_post_only() {
    let (app, _) = app(None, Ok("unused"), None);

    let response = app.oneshot(get("/api/chat")).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
