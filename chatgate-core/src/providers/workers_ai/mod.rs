//! Workers AI provider implementation
//!
//! The secondary backend's production inference capability.

mod client;
pub mod types;

pub use client::WorkersAiClient;
