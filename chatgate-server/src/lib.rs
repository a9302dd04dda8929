//! Chatgate HTTP server
//!
//! Exposes the core's failover router over HTTP:
//! - [`app`]: the dispatch table built at startup
//! - [`handlers`]: request handlers and response conversion
//! - [`cli`]: command-line arguments and configuration loading
//! - [`logging`]: tracing subscriber setup

pub mod app;
pub mod cli;
pub mod handlers;
pub mod logging;

pub use app::{build_router, AppState};
