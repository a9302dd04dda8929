//! HTTP error mapping utilities

use crate::providers::error::ProviderError;
use reqwest::StatusCode;
use serde_json::Value;
use uuid::Uuid;

/// Map an HTTP status code and response body to a `ProviderError`
pub fn map_http_error(status: StatusCode, body: Option<String>, request_id: Uuid) -> ProviderError {
    let error_message = body
        .as_deref()
        .and_then(|b| serde_json::from_str::<Value>(b).ok())
        .and_then(|v| extract_error_message(&v))
        .or_else(|| body.filter(|b| !b.trim().is_empty()))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("HTTP error")
                .to_string()
        });

    ProviderError::Status {
        status: status.as_u16(),
        message: format!("{} [request_id: {}]", error_message, request_id),
    }
}

/// Extract a human readable message from a JSON error body
fn extract_error_message(json: &Value) -> Option<String> {
    // Google format: { "error": { "code": 503, "message": "...", "status": "UNAVAILABLE" } }
    if let Some(error) = json.get("error") {
        if let Some(message) = error.get("message").and_then(|v| v.as_str()) {
            return Some(message.to_string());
        }
        if let Some(message) = error.as_str() {
            return Some(message.to_string());
        }
    }

    // Cloudflare format: { "errors": [ { "code": 7000, "message": "..." } ], "success": false }
    if let Some(message) = json
        .get("errors")
        .and_then(|v| v.as_array())
        .and_then(|errors| errors.first())
        .and_then(|e| e.get("message"))
        .and_then(|v| v.as_str())
    {
        return Some(message.to_string());
    }

    // Generic format: { "message": "..." }
    json.get("message")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Read a failed response's body and map it to a `ProviderError`
pub async fn error_from_response(response: reqwest::Response, request_id: Uuid) -> ProviderError {
    let status = response.status();
    let body = response.text().await.ok();
    map_http_error(status, body, request_id)
}
