//! Request validation
//!
//! Turns a raw `POST /api/chat` body into a [`Conversation`]. Only the
//! presence of a non-empty `messages` list is checked. Entries are not
//! inspected, so any role or content shape is forwarded as sent.

use super::types::{ChatRequest, Conversation};
use crate::providers::routing::GatewayError;

/// Body text returned when the conversation is missing or empty
pub const NO_MESSAGES: &str = "No messages provided.";

/// Validate an already decoded request
pub fn validate(request: ChatRequest) -> Result<Conversation, GatewayError> {
    request
        .messages
        .and_then(Conversation::new)
        .ok_or_else(|| GatewayError::InvalidRequest(NO_MESSAGES.to_string()))
}

/// Decode and validate a raw request body
pub fn parse_request(body: &[u8]) -> Result<Conversation, GatewayError> {
    let request: ChatRequest = serde_json::from_slice(body)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request body: {}", e)))?;
    validate(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Message;

    #[test]
    fn test_missing_messages() {
        let err = parse_request(br#"{}"#).unwrap_err();
        assert_eq!(err.to_string(), NO_MESSAGES);
    }

    #[test]
    fn test_null_messages() {
        let err = parse_request(br#"{"messages": null}"#).unwrap_err();
        assert_eq!(err.to_string(), NO_MESSAGES);
    }

    #[test]
    fn test_empty_messages() {
        let err = validate(ChatRequest::new(vec![])).unwrap_err();
        assert_eq!(err.to_string(), NO_MESSAGES);
    }

    #[test]
    fn test_malformed_body() {
        let err = parse_request(b"not json").unwrap_err();
        assert!(err.to_string().starts_with("Invalid request body"));
    }

    #[test]
    fn test_valid_conversation() {
        let conv = parse_request(br#"{"messages":[{"role":"user","content":"hi"}]}"#).unwrap();
        assert_eq!(conv.messages(), &[Message::user("hi")]);
    }

    #[test]
    fn test_entries_are_not_type_checked() {
        let bodies: [&[u8]; 3] = [
            br#"{"messages":[{"role":"tool","content":"x"}]}"#,
            br#"{"messages":[{"role":"user","content":[{"text":"hi"}]}]}"#,
            br#"{"messages":[{"role":"user"}]}"#,
        ];
        for body in bodies {
            let conv = parse_request(body).unwrap();
            assert_eq!(conv.len(), 1);
        }
    }

    #[test]
    fn test_entries_keep_their_shape() {
        let conv = parse_request(br#"{"messages":[{"role":"tool","content":[{"text":"hi"}],"name":"f"}]}"#)
            .unwrap();
        assert_eq!(
            conv.last().as_value(),
            &serde_json::json!({"role": "tool", "content": [{"text": "hi"}], "name": "f"})
        );
    }

    #[test]
    fn test_messages_must_be_a_list() {
        let err = parse_request(br#"{"messages":"hi"}"#).unwrap_err();
        assert!(err.to_string().starts_with("Invalid request body"));
    }

    #[test]
    fn test_extra_fields_ignored() {
        let conv =
            parse_request(br#"{"messages":[{"role":"user","content":"hi"}],"stream":true}"#)
                .unwrap();
        assert_eq!(conv.len(), 1);
    }
}
