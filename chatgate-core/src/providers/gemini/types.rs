//! Gemini API types
//!
//! These types match the `streamGenerateContent` request and response
//! formats and are only used at the edge of the Gemini adapter.

use crate::protocol::Message;
use serde::{Deserialize, Serialize};

/// Gemini `streamGenerateContent` request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeminiRequest {
    pub contents: GeminiContents,

    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiContent>,

    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
}

/// The `contents` field in either supported shape
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GeminiContents {
    /// The conversation exactly as received
    Passthrough(Vec<Message>),
    /// Gemini content objects
    Native(Vec<GeminiContent>),
}

/// Gemini content object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

/// One part of a content object; only text parts matter to the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Sampling parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationConfig {
    pub temperature: f32,
}

/// One streamed response object
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeminiStreamChunk {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

/// A response candidate
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeminiCandidate {
    #[serde(default)]
    pub content: Option<GeminiContent>,

    #[serde(default, rename = "finishReason")]
    pub finish_reason: Option<String>,
}

impl GeminiStreamChunk {
    /// Text of the first part of the first candidate, if present and non-empty
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
            .filter(|text| !text.is_empty())
    }
}
