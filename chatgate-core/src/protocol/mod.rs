//! Protocol module for the gateway's request and response structures
//!
//! These structures are:
//! - Backend-agnostic
//! - The only shapes a caller of the gateway ever sees

pub mod types;
pub mod validation;

pub use types::{ChatRequest, Conversation, Message, MessageRole, OutputRecord};
pub use validation::{parse_request, validate, NO_MESSAGES};
