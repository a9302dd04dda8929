//! Command-line interface

use chatgate_core::config::{self, ConfigResult, GatewayConfig};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chatgate", version)]
#[command(about = "Streaming chat gateway with Gemini to Workers AI failover")]
pub struct Args {
    /// Configuration file (.yaml, .yml or .json); without one, credentials
    /// are read from GEMINI_API_KEY, CLOUDFLARE_ACCOUNT_ID and CLOUDFLARE_API_TOKEN
    #[arg(short, long, env = "CHATGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bind address
    #[arg(long, env = "CHATGATE_HOST")]
    pub host: Option<String>,

    /// Bind port
    #[arg(long, env = "CHATGATE_PORT")]
    pub port: Option<u16>,

    /// Directory served for every path other than the API routes
    #[arg(long, env = "CHATGATE_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, env = "CHATGATE_LOG_JSON")]
    pub log_json: bool,
}

impl Args {
    /// Load the configuration and apply command-line overrides
    pub fn load_config(&self) -> ConfigResult<GatewayConfig> {
        let mut config = match &self.config {
            Some(path) => config::load_from_path(path)?,
            None => config::from_env()?,
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut GatewayConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(dir) = &self.static_dir {
            config.server.static_dir = Some(dir.clone());
        }
    }
}
