//! HTTP client module for calling the generative backends
//!
//! This module implements the outbound HTTP layer, handling:
//! - Connection pooling and client management
//! - Error mapping from status codes and error bodies
//! - Request ID generation and correlation

pub mod client;
pub mod error;

pub use client::HttpClient;
pub use error::{error_from_response, map_http_error};

use std::time::Duration;
use uuid::Uuid;

/// Header carrying the gateway request id to the backends
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Options for an outbound HTTP request
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Unique request ID for correlation
    pub request_id: Uuid,

    /// Per-request timeout overriding the client default
    pub timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            timeout: None,
        }
    }
}

impl RequestOptions {
    /// Create options bound to an existing request id
    pub fn new(request_id: Uuid) -> Self {
        Self {
            request_id,
            timeout: None,
        }
    }

    /// Set the timeout for this request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Apply the options to a request builder
    pub(crate) fn apply(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.header(REQUEST_ID_HEADER, self.request_id.to_string());
        match self.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }
}
