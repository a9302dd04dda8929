//! Explicit dispatch table for the gateway

use crate::handlers::{chat, health, not_found};
use axum::routing::{get, post};
use axum::Router;
use chatgate_core::FailoverRouter;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler
#[derive(Debug)]
pub struct AppState {
    pub router: FailoverRouter,
}

impl AppState {
    pub fn new(router: FailoverRouter) -> Self {
        Self { router }
    }
}

/// Build the application router
///
/// `POST /api/chat` and `GET /health` are handled here. Every other path is
/// served from `static_dir` when one is configured, and is a 404 otherwise.
pub fn build_router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let api = Router::new()
        .route("/api/chat", post(chat))
        .route("/health", get(health))
        .with_state(Arc::new(state));

    let app = match static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api.fallback(not_found),
    };

    app.layer(TraceLayer::new_for_http())
}

/// Resolves when the process receives Ctrl-C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
