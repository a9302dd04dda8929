//! Gemini streaming client

use super::converter::{extract_fragment, to_gemini_request};
use crate::config::{FramingMode, PrimaryConfig};
use crate::http::{error_from_response, HttpClient, RequestOptions};
use crate::protocol::Conversation;
use crate::providers::adapter::{PrimaryStream, StreamingBackend};
use crate::providers::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, warn};
use url::Url;

/// Gemini provider implementation
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: PrimaryConfig,
    client: HttpClient,
}

impl GeminiClient {
    /// Create a new Gemini client sharing the given HTTP pool
    pub fn new(config: PrimaryConfig, client: HttpClient) -> Self {
        Self { config, client }
    }

    /// Build the streaming endpoint URL, credential included
    pub fn stream_url(&self) -> ProviderResult<Url> {
        let endpoint = format!(
            "{}/models/{}:streamGenerateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        let mut url = Url::parse(&endpoint).map_err(|e| {
            ProviderError::Configuration(format!("Invalid Gemini endpoint '{}': {}", endpoint, e))
        })?;

        {
            let mut query = url.query_pairs_mut();
            if self.config.framing == FramingMode::Sse {
                query.append_pair("alt", "sse");
            }
            query.append_pair("key", self.config.api_key.expose_secret());
        }

        Ok(url)
    }
}

#[async_trait]
impl StreamingBackend for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn open_stream(
        &self,
        conversation: &Conversation,
        options: &RequestOptions,
    ) -> ProviderResult<PrimaryStream> {
        let request_id = options.request_id;
        let url = self.stream_url()?;
        let body = to_gemini_request(
            conversation,
            self.config.temperature,
            self.config.request_format,
        );

        debug!(
            "Opening Gemini stream for model {} with {} messages [request_id: {}]",
            self.config.model,
            conversation.len(),
            request_id
        );

        let response = options
            .apply(self.client.inner().post(url))
            .json(&body)
            .send()
            .await
            .map_err(ProviderError::from)?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                "Gemini responded with status {} [request_id: {}]",
                status, request_id
            );
            return Err(error_from_response(response, request_id).await);
        }

        debug!(
            "Gemini stream open with status {} [request_id: {}]",
            status, request_id
        );

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ProviderError::from));

        Ok(PrimaryStream {
            body: Box::pin(body),
            framing: self.config.framing,
            extract: extract_fragment,
        })
    }
}
