//! Workers AI inference client

use super::types::WorkersAiEnvelope;
use crate::config::{SecondaryConfig, SecretString};
use crate::http::{error_from_response, HttpClient, RequestOptions};
use crate::providers::adapter::{InferenceInput, InferenceOutput, InferenceRunner};
use crate::providers::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Inference runner backed by the Workers AI REST API
#[derive(Debug, Clone)]
pub struct WorkersAiClient {
    base_url: String,
    account_id: String,
    api_token: SecretString,
    client: HttpClient,
}

impl WorkersAiClient {
    /// Create a new client sharing the given HTTP pool
    pub fn new(config: &SecondaryConfig, client: HttpClient) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            account_id: config.account_id.clone(),
            api_token: config.api_token.clone(),
            client,
        }
    }

    /// Endpoint for running `model`
    ///
    /// Model ids such as `@cf/meta/llama-3-8b-instruct` are path-like and
    /// go into the URL unescaped.
    pub fn run_url(&self, model: &str) -> String {
        format!(
            "{}/accounts/{}/ai/run/{}",
            self.base_url, self.account_id, model
        )
    }
}

#[async_trait]
impl InferenceRunner for WorkersAiClient {
    fn name(&self) -> &str {
        "workers-ai"
    }

    async fn run(
        &self,
        model: &str,
        input: InferenceInput,
        options: &RequestOptions,
    ) -> ProviderResult<InferenceOutput> {
        let request_id = options.request_id;
        let url = self.run_url(model);
        debug!("Running Workers AI model {} [request_id: {}]", model, request_id);

        let response = options
            .apply(self.client.inner().post(&url))
            .bearer_auth(self.api_token.expose_secret())
            .json(&input)
            .send()
            .await
            .map_err(ProviderError::from)?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                "Workers AI responded with status {} [request_id: {}]",
                status, request_id
            );
            return Err(error_from_response(response, request_id).await);
        }

        let envelope: WorkersAiEnvelope = response.json().await.map_err(ProviderError::from)?;

        if envelope.success == Some(false) {
            return Err(ProviderError::Application(envelope.error_message()));
        }

        envelope
            .result
            .and_then(|r| r.response)
            .map(|response| InferenceOutput { response })
            .ok_or_else(|| ProviderError::Application("Workers AI returned no response".to_string()))
    }
}
