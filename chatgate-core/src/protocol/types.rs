//! Core protocol types for the gateway
//!
//! This module contains the data structures shared by every layer:
//! - Conversation messages as they arrive on the wire
//! - The validated, non-empty `Conversation`
//! - `OutputRecord`, the one line format every caller sees

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Role of a message, as far as the gateway needs to tell roles apart
///
/// Roles are never rewritten on the wire. This classification only feeds
/// system-prompt handling and the native Gemini request shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageRole {
    /// System instructions that guide the model's behavior
    System,
    /// User input message
    User,
    /// Assistant (model) response
    Assistant,
}

impl MessageRole {
    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    /// Classify a wire role name; Gemini's `model` counts as assistant
    pub fn classify(name: &str) -> Option<Self> {
        match name {
            "system" => Some(MessageRole::System),
            "user" => Some(MessageRole::User),
            "assistant" | "model" => Some(MessageRole::Assistant),
            _ => None,
        }
    }
}

/// A single message in the conversation, kept exactly as the caller sent it
///
/// The gateway does not type-check messages. Any JSON value is accepted and
/// forwarded to the primary unchanged; accessors read the conventional
/// `role` and `content` fields when they are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message(Value);

impl Message {
    /// Create a message with an explicit role
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self(json!({ "role": role.as_str(), "content": content.into() }))
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// The raw `role` field, if it is a string
    pub fn role(&self) -> Option<&str> {
        self.0.get("role").and_then(Value::as_str)
    }

    /// The role as classified by [`MessageRole::classify`]
    pub fn kind(&self) -> Option<MessageRole> {
        self.role().and_then(MessageRole::classify)
    }

    /// The raw `content` field
    pub fn content(&self) -> Option<&Value> {
        self.0.get("content").filter(|v| !v.is_null())
    }

    /// The content as text: strings verbatim, absent content as the empty
    /// string, anything else as its compact JSON encoding.
    pub fn text(&self) -> String {
        match self.content() {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    /// The message exactly as received
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Message {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Inbound request body for `POST /api/chat`
///
/// `messages` stays optional here so that a missing field and an empty list
/// are both reported through validation rather than as a decode error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
}

impl ChatRequest {
    /// Create a request carrying the given messages
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages: Some(messages),
        }
    }
}

/// An ordered, non-empty list of messages
///
/// Only [`crate::protocol::validate`] and [`Conversation::new`] construct
/// this type, both of which reject empty input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Build a conversation, returning `None` for an empty list
    pub fn new(messages: Vec<Message>) -> Option<Self> {
        if messages.is_empty() {
            None
        } else {
            Some(Self { messages })
        }
    }

    /// All messages in conversation order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The final message; always present
    pub fn last(&self) -> &Message {
        // Non-empty by construction
        &self.messages[self.messages.len() - 1]
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false; present for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether the conversation opens with a system message
    pub fn starts_with_system(&self) -> bool {
        self.messages[0].kind() == Some(MessageRole::System)
    }

    /// Return a copy with `prompt` prepended as a system message, unless one
    /// is already present at the head of the conversation.
    pub fn with_default_system(&self, prompt: &str) -> Conversation {
        if self.starts_with_system() {
            return self.clone();
        }
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        messages.push(Message::system(prompt));
        messages.extend(self.messages.iter().cloned());
        Conversation { messages }
    }
}

/// One line of the gateway's newline-delimited JSON protocol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputRecord {
    /// A text fragment (or the complete fallback answer)
    Response { response: String },
    /// A terminal failure
    Error { error: String },
}

impl OutputRecord {
    /// Create a response record
    pub fn response(text: impl Into<String>) -> Self {
        OutputRecord::Response {
            response: text.into(),
        }
    }

    /// Create an error record
    pub fn error(message: impl Into<String>) -> Self {
        OutputRecord::Error {
            error: message.into(),
        }
    }

    /// Serialize as a single ndjson line, including the trailing newline
    pub fn to_line(&self) -> Bytes {
        // Serializing a map of two strings cannot fail
        let mut line = serde_json::to_vec(self).unwrap_or_default();
        line.push(b'\n');
        Bytes::from(line)
    }
}
