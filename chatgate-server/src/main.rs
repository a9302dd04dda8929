use anyhow::Context;
use chatgate_core::FailoverRouter;
use chatgate_server::app::{self, AppState};
use chatgate_server::cli::Args;
use chatgate_server::logging;
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_logging(args.log_json);

    let config = args.load_config().context("Failed to load configuration")?;
    info!(
        "chatgate {} starting: primary {} (key {}, framing {:?}), secondary {} (account {})",
        chatgate_core::version(),
        config.primary.model,
        config.primary.api_key.partial_redact(),
        config.primary.framing,
        config.secondary.model,
        config.secondary.account_id
    );

    let router = FailoverRouter::from_config(&config).context("Failed to build backend clients")?;
    let app = app::build_router(AppState::new(router), config.server.static_dir.clone());

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("Starting server on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(app::shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
