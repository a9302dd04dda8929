//! Failover routing between the primary and secondary backends
//!
//! A request moves through an explicit state machine:
//!
//! ```text
//! start ──invalid──────────────────────────────▶ Done(Rejected)    400
//!   │
//!   ▼
//! PrimaryAttempt ──ok─────────────────────────▶ Done(Streaming)   200 stream
//!   │ err
//!   ▼
//! SecondaryAttempt ──ok───────────────────────▶ Done(Fallback)    200 one line
//!   │ err
//!   └─────────────────────────────────────────▶ Done(Failed)      500 one line
//! ```
//!
//! Every transition is a pure function of the previous backend result; only
//! [`FailoverRouter`] performs I/O. Each backend is tried at most once per
//! request and nothing is retried.

use crate::config::GatewayConfig;
use crate::http::{HttpClient, RequestOptions};
use crate::protocol::{parse_request, validate, ChatRequest, Conversation, OutputRecord};
use crate::providers::adapter::{PrimaryStream, SecondaryAdapter, StreamingBackend};
use crate::providers::error::{ProviderError, ProviderResult};
use crate::providers::gemini::GeminiClient;
use crate::providers::workers_ai::WorkersAiClient;
use crate::streaming::spawn_reformatter;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use http::StatusCode;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Marks an answer that came from the secondary backend
pub const FALLBACK_PREFIX: &str = "(Fallback from Workers AI): ";

/// Content type of the record stream
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Content type of plain-text rejections
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Default capacity of the reformatter's output channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Request-level failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// Caller error; the message is the response body
    #[error("{0}")]
    InvalidRequest(String),

    /// Primary transport failure or non-2xx; only ever triggers failover
    #[error("Primary backend unavailable: {0}")]
    PrimaryUnavailable(ProviderError),

    /// Secondary transport or application failure; the message is kept verbatim
    #[error("{0}")]
    SecondaryUnavailable(ProviderError),
}

impl GatewayError {
    /// HTTP status this failure maps to when it ends a request
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::PrimaryUnavailable(_) | GatewayError::SecondaryUnavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Terminal result of a routed request
#[derive(Debug)]
pub enum Outcome {
    /// Validation failed
    Rejected(GatewayError),
    /// The primary answered; its body is still open
    Streaming(PrimaryStream),
    /// The secondary answered in full
    Fallback(String),
    /// Both backends failed; carries the secondary failure
    Failed(GatewayError),
}

/// Router state
#[derive(Debug)]
pub enum RouteState {
    PrimaryAttempt(Conversation),
    SecondaryAttempt {
        conversation: Conversation,
        /// Kept for diagnostics only; never shown to the caller
        cause: GatewayError,
    },
    Done(Outcome),
}

impl RouteState {
    /// Initial transition from the validator's verdict
    pub fn start(validated: Result<Conversation, GatewayError>) -> Self {
        match validated {
            Ok(conversation) => RouteState::PrimaryAttempt(conversation),
            Err(e) => RouteState::Done(Outcome::Rejected(e)),
        }
    }

    /// Transition out of `PrimaryAttempt`
    pub fn after_primary(
        conversation: Conversation,
        result: ProviderResult<PrimaryStream>,
    ) -> Self {
        match result {
            Ok(stream) => RouteState::Done(Outcome::Streaming(stream)),
            Err(e) => RouteState::SecondaryAttempt {
                conversation,
                cause: GatewayError::PrimaryUnavailable(e),
            },
        }
    }

    /// Transition out of `SecondaryAttempt`
    pub fn after_secondary(result: ProviderResult<String>) -> Self {
        match result {
            Ok(answer) => RouteState::Done(Outcome::Fallback(answer)),
            Err(e) => RouteState::Done(Outcome::Failed(GatewayError::SecondaryUnavailable(e))),
        }
    }

    /// Whether this is a terminal state
    pub fn is_done(&self) -> bool {
        matches!(self, RouteState::Done(_))
    }
}

/// Which backend produced a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Primary,
    Secondary,
}

/// Body of a [`GatewayResponse`]
pub enum ResponseBody {
    /// Fully buffered body
    Full(Bytes),
    /// Live record stream fed by the reformatter task
    Stream(ReceiverStream<Bytes>),
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Full(bytes) => f.debug_tuple("Full").field(bytes).finish(),
            ResponseBody::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Transport-neutral response produced by the router
#[derive(Debug)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: ResponseBody,
    /// Backend that served the request; not part of the wire protocol
    pub origin: Option<Origin>,
}

impl GatewayResponse {
    fn full(status: StatusCode, content_type: &'static str, body: Bytes) -> Self {
        Self {
            status,
            content_type,
            body: ResponseBody::Full(body),
            origin: None,
        }
    }

    /// Drain the body into memory, waiting for the stream to finish
    pub async fn into_bytes(self) -> Bytes {
        match self.body {
            ResponseBody::Full(bytes) => bytes,
            ResponseBody::Stream(mut stream) => {
                let mut buf = BytesMut::new();
                while let Some(line) = stream.next().await {
                    buf.extend_from_slice(&line);
                }
                buf.freeze()
            }
        }
    }
}

/// Dispatches each request through the failover state machine
#[derive(Clone)]
pub struct FailoverRouter {
    primary: Arc<dyn StreamingBackend>,
    secondary: SecondaryAdapter,
    default_system_prompt: Option<String>,
    channel_capacity: usize,
    secondary_timeout: Option<Duration>,
}

impl FailoverRouter {
    /// Create a router over the two backends
    pub fn new(primary: Arc<dyn StreamingBackend>, secondary: SecondaryAdapter) -> Self {
        Self {
            primary,
            secondary,
            default_system_prompt: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            secondary_timeout: None,
        }
    }

    /// Build the Gemini / Workers AI pair from configuration
    ///
    /// Both clients share one connection pool.
    pub fn from_config(config: &GatewayConfig) -> ProviderResult<Self> {
        let client = HttpClient::from_config(&config.connection)?;
        let primary = Arc::new(GeminiClient::new(config.primary.clone(), client.clone()));
        let runner = Arc::new(WorkersAiClient::new(&config.secondary, client));
        let secondary = SecondaryAdapter::new(runner, config.secondary.model.clone());

        Ok(Self::new(primary, secondary)
            .with_default_system_prompt(config.primary.default_system_prompt.clone())
            .with_channel_capacity(config.streaming.channel_capacity)
            .with_secondary_timeout(Duration::from_secs(config.connection.request_timeout_secs)))
    }

    /// System prompt injected on the primary path when a conversation has none
    pub fn with_default_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.default_system_prompt = prompt;
        self
    }

    /// Capacity of the reformatter's output channel
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Total deadline for the secondary call
    ///
    /// The primary stream has none; it is only bounded by the client's idle
    /// read timeout.
    pub fn with_secondary_timeout(mut self, timeout: Duration) -> Self {
        self.secondary_timeout = Some(timeout);
        self
    }

    /// Handle a raw `POST /api/chat` body
    pub async fn handle(&self, body: &[u8]) -> GatewayResponse {
        self.dispatch(parse_request(body)).await
    }

    /// Handle an already decoded request
    pub async fn route(&self, request: ChatRequest) -> GatewayResponse {
        self.dispatch(validate(request)).await
    }

    async fn dispatch(&self, validated: Result<Conversation, GatewayError>) -> GatewayResponse {
        let request_id = Uuid::new_v4();
        let options = RequestOptions::new(request_id);
        let mut state = RouteState::start(validated);

        loop {
            state = match state {
                RouteState::PrimaryAttempt(conversation) => {
                    info!(
                        "Routing {} messages to {} [request_id: {}]",
                        conversation.len(),
                        self.primary.name(),
                        request_id
                    );
                    let result = self.call_primary(&conversation, &options).await;
                    RouteState::after_primary(conversation, result)
                }
                RouteState::SecondaryAttempt {
                    conversation,
                    cause,
                } => {
                    warn!(
                        "{}; falling back to {} [request_id: {}]",
                        cause,
                        self.secondary.name(),
                        request_id
                    );
                    let result = self.call_secondary(conversation, &options).await;
                    RouteState::after_secondary(result)
                }
                RouteState::Done(outcome) => return self.respond(outcome, request_id),
            };
        }
    }

    async fn call_primary(
        &self,
        conversation: &Conversation,
        options: &RequestOptions,
    ) -> ProviderResult<PrimaryStream> {
        match &self.default_system_prompt {
            Some(prompt) => {
                let conversation = conversation.with_default_system(prompt);
                self.primary.open_stream(&conversation, options).await
            }
            None => self.primary.open_stream(conversation, options).await,
        }
    }

    /// Run the secondary call on its own task
    ///
    /// If the caller disconnects and this future is dropped, the spawned call
    /// still runs to completion.
    async fn call_secondary(
        &self,
        conversation: Conversation,
        options: &RequestOptions,
    ) -> ProviderResult<String> {
        let secondary = self.secondary.clone();
        let options = match self.secondary_timeout {
            Some(timeout) => options.clone().with_timeout(timeout),
            None => options.clone(),
        };
        let handle =
            tokio::spawn(async move { secondary.complete(&conversation, &options).await });

        match handle.await {
            Ok(result) => result,
            Err(e) => Err(ProviderError::Application(format!(
                "Secondary call did not complete: {}",
                e
            ))),
        }
    }

    fn respond(&self, outcome: Outcome, request_id: Uuid) -> GatewayResponse {
        match outcome {
            Outcome::Rejected(e) => {
                info!("Rejected request: {} [request_id: {}]", e, request_id);
                GatewayResponse::full(
                    e.status_code(),
                    TEXT_CONTENT_TYPE,
                    Bytes::from(e.to_string()),
                )
            }
            Outcome::Streaming(stream) => {
                let rx = spawn_reformatter(stream, self.channel_capacity, request_id);
                GatewayResponse {
                    status: StatusCode::OK,
                    content_type: NDJSON_CONTENT_TYPE,
                    body: ResponseBody::Stream(ReceiverStream::new(rx)),
                    origin: Some(Origin::Primary),
                }
            }
            Outcome::Fallback(answer) => {
                info!(
                    "Served by {} ({} chars) [request_id: {}]",
                    self.secondary.name(),
                    answer.len(),
                    request_id
                );
                let record = OutputRecord::response(format!("{}{}", FALLBACK_PREFIX, answer));
                let mut response =
                    GatewayResponse::full(StatusCode::OK, NDJSON_CONTENT_TYPE, record.to_line());
                response.origin = Some(Origin::Secondary);
                response
            }
            Outcome::Failed(e) => {
                error!("Both backends failed: {} [request_id: {}]", e, request_id);
                let record = OutputRecord::error(format!("Both APIs failed. Error: {}", e));
                GatewayResponse::full(e.status_code(), NDJSON_CONTENT_TYPE, record.to_line())
            }
        }
    }
}

impl fmt::Debug for FailoverRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailoverRouter")
            .field("primary", &self.primary.name())
            .field("secondary", &self.secondary)
            .field("default_system_prompt", &self.default_system_prompt)
            .field("channel_capacity", &self.channel_capacity)
            .field("secondary_timeout", &self.secondary_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FramingMode;
    use crate::protocol::{Message, NO_MESSAGES};
    use crate::providers::adapter::{InferenceInput, InferenceOutput, InferenceRunner};
    use crate::providers::gemini::extract_fragment;
    use async_trait::async_trait;
    use futures::stream;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Primary that either streams fixed chunks or fails with a status
    struct StubPrimary {
        chunks: Option<Vec<&'static str>>,
        seen: Mutex<Vec<Conversation>>,
    }

    impl StubPrimary {
        fn streaming(chunks: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                chunks: Some(chunks),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                chunks: None,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl StreamingBackend for StubPrimary {
        fn name(&self) -> &str {
            "stub-primary"
        }

        async fn open_stream(
            &self,
            conversation: &Conversation,
            _options: &RequestOptions,
        ) -> ProviderResult<PrimaryStream> {
            self.seen.lock().unwrap().push(conversation.clone());
            match &self.chunks {
                Some(chunks) => {
                    let items: Vec<ProviderResult<Bytes>> = chunks
                        .iter()
                        .map(|c| Ok(Bytes::from_static(c.as_bytes())))
                        .collect();
                    Ok(PrimaryStream {
                        body: Box::pin(stream::iter(items)),
                        framing: FramingMode::Chunk,
                        extract: extract_fragment,
                    })
                }
                None => Err(ProviderError::Status {
                    status: 503,
                    message: "Service Unavailable".to_string(),
                }),
            }
        }
    }

    struct StubRunner {
        answer: Result<String, ProviderError>,
        calls: Mutex<Vec<InferenceInput>>,
    }

    impl StubRunner {
        fn new(answer: Result<String, ProviderError>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl InferenceRunner for StubRunner {
        fn name(&self) -> &str {
            "stub-runner"
        }

        async fn run(
            &self,
            _model: &str,
            input: InferenceInput,
            _options: &RequestOptions,
        ) -> ProviderResult<InferenceOutput> {
            self.calls.lock().unwrap().push(input);
            self.answer
                .clone()
                .map(|response| InferenceOutput { response })
        }
    }

    /// Runner that parks until released, then records that it finished
    #[derive(Default)]
    struct GatedRunner {
        started: Notify,
        release: Notify,
        finished: AtomicBool,
        done: Notify,
    }

    #[async_trait]
    impl InferenceRunner for GatedRunner {
        fn name(&self) -> &str {
            "gated-runner"
        }

        async fn run(
            &self,
            _model: &str,
            _input: InferenceInput,
            _options: &RequestOptions,
        ) -> ProviderResult<InferenceOutput> {
            self.started.notify_one();
            self.release.notified().await;
            self.finished.store(true, Ordering::SeqCst);
            self.done.notify_one();
            Ok(InferenceOutput {
                response: "late".to_string(),
            })
        }
    }

    fn router(primary: Arc<StubPrimary>, runner: Arc<StubRunner>) -> FailoverRouter {
        FailoverRouter::new(primary, SecondaryAdapter::new(runner, "@cf/test/model"))
    }

    const HE: &str = r#"{"candidates":[{"content":{"parts":[{"text":"He"}]}}]}"#;
    const LLO: &str = r#"{"candidates":[{"content":{"parts":[{"text":"llo"}]}}]}"#;
    const HI: &[u8] = br#"{"messages":[{"role":"user","content":"hi"}]}"#;

    #[test]
    fn test_start_rejects_invalid() {
        let state = RouteState::start(Err(GatewayError::InvalidRequest("bad".into())));
        assert!(matches!(state, RouteState::Done(Outcome::Rejected(_))));
    }

    #[test]
    fn test_primary_failure_moves_to_secondary() {
        let conversation = Conversation::new(vec![Message::user("hi")]).unwrap();
        let state = RouteState::after_primary(conversation, Err(ProviderError::Timeout));
        match state {
            RouteState::SecondaryAttempt { cause, .. } => {
                assert_eq!(cause, GatewayError::PrimaryUnavailable(ProviderError::Timeout));
            }
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[test]
    fn test_secondary_result_is_terminal() {
        assert!(RouteState::after_secondary(Ok("a".into())).is_done());
        let failed = RouteState::after_secondary(Err(ProviderError::Timeout));
        assert!(matches!(failed, RouteState::Done(Outcome::Failed(_))));
    }

    #[tokio::test]
    async fn test_empty_messages_touch_no_backend() {
        let primary = StubPrimary::streaming(vec![HE]);
        let runner = StubRunner::new(Ok("x".into()));
        let router = router(primary.clone(), runner.clone());

        let response = router.handle(br#"{"messages":[]}"#).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.content_type, TEXT_CONTENT_TYPE);
        assert_eq!(response.into_bytes().await, NO_MESSAGES.as_bytes());
        assert!(primary.seen.lock().unwrap().is_empty());
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_primary_stream_is_reformatted() {
        let primary = StubPrimary::streaming(vec![HE, LLO]);
        let runner = StubRunner::new(Ok("unused".into()));
        let router = router(primary, runner.clone());

        let response = router.handle(HI).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.content_type, NDJSON_CONTENT_TYPE);
        assert_eq!(response.origin, Some(Origin::Primary));
        assert_eq!(
            response.into_bytes().await,
            "{\"response\":\"He\"}\n{\"response\":\"llo\"}\n".as_bytes()
        );
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fallback_answer_is_prefixed() {
        let runner = StubRunner::new(Ok("Hi there".into()));
        let router = router(StubPrimary::failing(), runner.clone());

        let body = br#"{"messages":[
            {"role":"user","content":"first"},
            {"role":"assistant","content":"ok"},
            {"role":"user","content":"second"}]}"#;
        let response = router.handle(body).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.origin, Some(Origin::Secondary));
        assert_eq!(
            response.into_bytes().await,
            "{\"response\":\"(Fallback from Workers AI): Hi there\"}\n".as_bytes()
        );

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].messages, vec![Message::user("second")]);
    }

    #[tokio::test]
    async fn test_secondary_outlives_disconnected_caller() {
        let runner = Arc::new(GatedRunner::default());
        let router = FailoverRouter::new(
            StubPrimary::failing(),
            SecondaryAdapter::new(runner.clone(), "@cf/test/model"),
        );

        let caller = tokio::spawn(async move { router.handle(HI).await });
        runner.started.notified().await;

        // The caller goes away while the secondary call is in flight
        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());
        assert!(!runner.finished.load(Ordering::SeqCst));

        runner.release.notify_one();
        tokio::time::timeout(Duration::from_secs(5), runner.done.notified())
            .await
            .expect("secondary call was cancelled with its caller");
        assert!(runner.finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_both_failed_is_500() {
        let runner = StubRunner::new(Err(ProviderError::Application("model overloaded".into())));
        let router = router(StubPrimary::failing(), runner);

        let response = router.handle(HI).await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.content_type, NDJSON_CONTENT_TYPE);
        assert_eq!(
            response.into_bytes().await,
            "{\"error\":\"Both APIs failed. Error: model overloaded\"}\n".as_bytes()
        );
    }

    #[tokio::test]
    async fn test_default_system_prompt_only_on_primary() {
        let primary = StubPrimary::failing();
        let runner = StubRunner::new(Ok("ok".into()));
        let router = router(primary.clone(), runner.clone())
            .with_default_system_prompt(Some("Be brief.".into()));

        router.handle(HI).await.into_bytes().await;

        let seen = primary.seen.lock().unwrap();
        assert_eq!(
            seen[0].messages(),
            &[Message::system("Be brief."), Message::user("hi")]
        );
        assert_eq!(
            runner.calls.lock().unwrap()[0].messages,
            vec![Message::user("hi")]
        );
    }

    #[tokio::test]
    async fn test_existing_system_message_is_kept() {
        let primary = StubPrimary::streaming(vec![HE]);
        let router = router(primary.clone(), StubRunner::new(Ok("x".into())))
            .with_default_system_prompt(Some("Be brief.".into()));

        let body = br#"{"messages":[{"role":"system","content":"Be verbose."},{"role":"user","content":"hi"}]}"#;
        router.handle(body).await.into_bytes().await;

        let seen = primary.seen.lock().unwrap();
        assert_eq!(seen[0].len(), 2);
        assert_eq!(seen[0].messages()[0], Message::system("Be verbose."));
    }

    #[tokio::test]
    async fn test_route_typed_request() {
        let router = router(
            StubPrimary::streaming(vec![HE]),
            StubRunner::new(Ok("x".into())),
        );
        let response = router.route(ChatRequest::new(vec![Message::user("hi")])).await;
        assert_eq!(
            response.into_bytes().await,
            "{\"response\":\"He\"}\n".as_bytes()
        );
    }
}
