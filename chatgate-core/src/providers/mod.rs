//! Backend adapters and failover routing
//!
//! This module implements the gateway's backend layer:
//! - [`adapter`]: the seams between the router and the backends
//! - [`gemini`]: the streaming primary backend
//! - [`workers_ai`]: the single-call secondary backend
//! - [`routing`]: the failover state machine tying them together

pub mod adapter;
pub mod error;
pub mod gemini;
pub mod routing;
pub mod workers_ai;

pub use adapter::{
    InferenceInput, InferenceOutput, InferenceRunner, PrimaryStream, SecondaryAdapter,
    StreamingBackend,
};
pub use error::{ProviderError, ProviderResult};
pub use routing::{FailoverRouter, GatewayError, GatewayResponse, Origin, ResponseBody};

// Re-export concrete providers
pub use gemini::GeminiClient;
pub use workers_ai::WorkersAiClient;
