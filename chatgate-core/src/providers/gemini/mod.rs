//! Gemini provider implementation
//!
//! The primary backend: sends the full conversation to
//! `streamGenerateContent` and hands the open body to the reformatter.

mod client;
pub mod converter;
pub mod types;

pub use client::GeminiClient;
pub use converter::{extract_fragment, to_gemini_request};
pub use types::{GeminiRequest, GeminiStreamChunk};
