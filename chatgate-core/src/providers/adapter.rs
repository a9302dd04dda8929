//! Backend adapter traits
//!
//! Defines the two seams the router depends on:
//! - [`StreamingBackend`]: the primary, multi-turn, streaming backend
//! - [`InferenceRunner`]: the injected single-call inference capability
//!   behind the secondary backend

use crate::config::FramingMode;
use crate::http::RequestOptions;
use crate::protocol::{Conversation, Message};
use crate::providers::error::{ProviderError, ProviderResult};
use crate::streaming::FragmentExtractor;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

/// Raw response body of a streaming backend
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ProviderError>> + Send>>;

/// An open primary response, together with how to decode it
pub struct PrimaryStream {
    /// Raw bytes as delivered by the transport
    pub body: ByteStream,

    /// How the body is split into decode units
    pub framing: FramingMode,

    /// Pulls the text fragment out of one decode unit
    pub extract: FragmentExtractor,
}

impl fmt::Debug for PrimaryStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimaryStream")
            .field("framing", &self.framing)
            .finish_non_exhaustive()
    }
}

/// Primary backend: forwards the whole conversation and streams the answer
#[async_trait]
pub trait StreamingBackend: Send + Sync {
    /// Backend name used in logs
    fn name(&self) -> &str;

    /// Issue the request; `Ok` only for a 2xx response whose body is still open
    async fn open_stream(
        &self,
        conversation: &Conversation,
        options: &RequestOptions,
    ) -> ProviderResult<PrimaryStream>;
}

/// Input of a single inference call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceInput {
    pub messages: Vec<Message>,
}

/// Output of a single inference call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceOutput {
    pub response: String,
}

/// The injected inference capability: `run(model, {messages}) -> {response}`
#[async_trait]
pub trait InferenceRunner: Send + Sync {
    /// Runner name used in logs
    fn name(&self) -> &str;

    /// Run one non-streaming inference
    async fn run(
        &self,
        model: &str,
        input: InferenceInput,
        options: &RequestOptions,
    ) -> ProviderResult<InferenceOutput>;
}

/// Secondary backend adapter
///
/// The secondary backend has no multi-turn support, so only the content of
/// the conversation's last message is sent, as a single user message.
#[derive(Clone)]
pub struct SecondaryAdapter {
    runner: Arc<dyn InferenceRunner>,
    model: String,
}

impl SecondaryAdapter {
    /// Create an adapter around an inference runner and model id
    pub fn new(runner: Arc<dyn InferenceRunner>, model: impl Into<String>) -> Self {
        Self {
            runner,
            model: model.into(),
        }
    }

    /// Runner name used in logs
    pub fn name(&self) -> &str {
        self.runner.name()
    }

    /// Model identifier sent with every call
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask for one complete answer to the conversation's last message
    pub async fn complete(
        &self,
        conversation: &Conversation,
        options: &RequestOptions,
    ) -> ProviderResult<String> {
        let input = single_turn_input(conversation);
        let output = self.runner.run(&self.model, input, options).await?;
        Ok(output.response)
    }
}

impl fmt::Debug for SecondaryAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecondaryAdapter")
            .field("runner", &self.runner.name())
            .field("model", &self.model)
            .finish()
    }
}

/// Reduce a conversation to the single user turn the secondary backend accepts
pub fn single_turn_input(conversation: &Conversation) -> InferenceInput {
    InferenceInput {
        messages: vec![Message::user(conversation.last().text())],
    }
}
