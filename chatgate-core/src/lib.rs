//! Chatgate Core Library
//!
//! This crate provides the core of a streaming chat gateway: request
//! validation, the Gemini and Workers AI adapters, the chunk reformatter and
//! the failover router that chooses between them.

pub mod config;
pub mod http;
pub mod protocol;
pub mod providers;
pub mod streaming;

pub use providers::{FailoverRouter, GatewayResponse};

/// Returns the version of the Chatgate Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
