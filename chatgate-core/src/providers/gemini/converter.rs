//! Conversion from the gateway protocol to Gemini's request format

use super::types::*;
use crate::config::RequestFormat;
use crate::protocol::{Conversation, Message, MessageRole};
use crate::streaming::DecodeSkip;

/// Build the `streamGenerateContent` body for a conversation
pub fn to_gemini_request(
    conversation: &Conversation,
    temperature: f32,
    format: RequestFormat,
) -> GeminiRequest {
    let generation_config = GenerationConfig { temperature };

    match format {
        RequestFormat::Passthrough => GeminiRequest {
            contents: GeminiContents::Passthrough(conversation.messages().to_vec()),
            system_instruction: None,
            generation_config,
        },
        RequestFormat::Native => {
            let (system, turns): (Vec<&Message>, Vec<&Message>) = conversation
                .messages()
                .iter()
                .partition(|m| m.kind() == Some(MessageRole::System));

            let system_instruction = if system.is_empty() {
                None
            } else {
                let text = system
                    .iter()
                    .map(|m| m.text())
                    .collect::<Vec<_>>()
                    .join("\n\n");
                Some(GeminiContent {
                    role: None,
                    parts: vec![text_part(text)],
                })
            };

            GeminiRequest {
                contents: GeminiContents::Native(turns.into_iter().map(to_gemini_content).collect()),
                system_instruction,
                generation_config,
            }
        }
    }
}

fn to_gemini_content(message: &Message) -> GeminiContent {
    // Anything that is not recognisably the model's turn is sent as user text
    let role = match message.kind() {
        Some(MessageRole::Assistant) => "model",
        _ => "user",
    };
    GeminiContent {
        role: Some(role.to_string()),
        parts: vec![text_part(message.text())],
    }
}

fn text_part(text: String) -> GeminiPart {
    GeminiPart { text: Some(text) }
}

/// Extract the text fragment from one streamed decode unit
pub fn extract_fragment(unit: &str) -> Result<String, DecodeSkip> {
    let chunk: GeminiStreamChunk =
        serde_json::from_str(unit).map_err(|e| DecodeSkip::InvalidJson(e.to_string()))?;
    chunk
        .first_text()
        .map(str::to_string)
        .ok_or(DecodeSkip::MissingText)
}
