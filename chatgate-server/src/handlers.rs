//! Request handlers

use crate::app::AppState;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::Response;
use chatgate_core::providers::{GatewayResponse, ResponseBody};
use futures::StreamExt;
use std::convert::Infallible;
use std::sync::Arc;

/// `POST /api/chat`
pub async fn chat(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    into_http_response(state.router.handle(&body).await)
}

/// `GET /health`
pub async fn health() -> &'static str {
    "OK"
}

/// Fallback when no static directory is configured
pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Convert the router's response into an HTTP response
///
/// A streamed body is forwarded record by record. When the client goes away
/// the body is dropped, which closes the channel and stops the reformatter.
pub fn into_http_response(response: GatewayResponse) -> Response {
    let body = match response.body {
        ResponseBody::Full(bytes) => Body::from(bytes),
        ResponseBody::Stream(stream) => Body::from_stream(stream.map(Ok::<_, Infallible>)),
    };

    let mut http_response = Response::new(body);
    *http_response.status_mut() = response.status;
    http_response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(response.content_type));
    http_response
}
