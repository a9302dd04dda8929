//! Workers AI REST envelope types

use serde::Deserialize;

/// Cloudflare API response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct WorkersAiEnvelope {
    #[serde(default)]
    pub result: Option<WorkersAiResult>,

    #[serde(default)]
    pub success: Option<bool>,

    #[serde(default)]
    pub errors: Vec<CloudflareMessage>,
}

/// Text generation result
#[derive(Debug, Clone, Deserialize)]
pub struct WorkersAiResult {
    #[serde(default)]
    pub response: Option<String>,
}

/// An entry of the envelope's `errors` list
#[derive(Debug, Clone, Deserialize)]
pub struct CloudflareMessage {
    #[serde(default)]
    pub code: Option<i64>,

    #[serde(default)]
    pub message: String,
}

impl WorkersAiEnvelope {
    /// Joined error messages, or a generic one when the list is empty
    pub fn error_message(&self) -> String {
        if self.errors.is_empty() {
            return "Workers AI reported failure without details".to_string();
        }
        self.errors
            .iter()
            .map(|e| match e.code {
                Some(code) => format!("{} (code {})", e.message, code),
                None => e.message.clone(),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}
