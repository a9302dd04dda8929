//! Configuration module for the gateway
//!
//! This module provides the configuration schema, loading and validation.
//! Files may reference environment variables as `${VAR}`; they are resolved
//! before parsing so credentials never need to live in the file itself.

mod env;
mod error;
mod schema;
mod secrets;
mod validator;

pub use error::{ConfigError, ConfigResult, InvalidSetting, Problem};
pub use schema::{
    ConnectionConfig, FramingMode, GatewayConfig, PrimaryConfig, RequestFormat, SecondaryConfig,
    ServerConfig, StreamingConfig, CONFIG_VERSION,
};
pub use secrets::SecretString;
pub use validator::ConfigValidator;

use std::fs;
use std::path::Path;

/// Environment variable holding the primary API key
pub const ENV_PRIMARY_API_KEY: &str = "GEMINI_API_KEY";
/// Environment variable holding the Cloudflare account id
pub const ENV_ACCOUNT_ID: &str = "CLOUDFLARE_ACCOUNT_ID";
/// Environment variable holding the Workers AI token
pub const ENV_API_TOKEN: &str = "CLOUDFLARE_API_TOKEN";
/// Environment variable overriding the secondary model
pub const ENV_SECONDARY_MODEL: &str = "WORKERS_AI_MODEL";

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> ConfigResult<GatewayConfig> {
    let path = path.as_ref();
    let content = read_interpolated(path)?;

    let config: GatewayConfig =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_string_lossy().to_string(),
            line: e.location().map(|l| l.line()),
            column: e.location().map(|l| l.column()),
            message: e.to_string(),
        })?;

    ConfigValidator::new().validate(&config)?;
    Ok(config)
}

/// Load a configuration from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> ConfigResult<GatewayConfig> {
    let path = path.as_ref();
    let content = read_interpolated(path)?;

    let config: GatewayConfig =
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_string_lossy().to_string(),
            line: Some(e.line()),
            column: Some(e.column()),
            message: e.to_string(),
        })?;

    ConfigValidator::new().validate(&config)?;
    Ok(config)
}

/// Load a configuration file, choosing the parser from its extension
pub fn load_from_path<P: AsRef<Path>>(path: P) -> ConfigResult<GatewayConfig> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => load_from_yaml(path),
        Some("json") => load_from_json(path),
        _ => Err(ConfigError::UnknownExtension {
            path: path.to_string_lossy().to_string(),
        }),
    }
}

/// Build a configuration from environment variables alone
///
/// Reads `GEMINI_API_KEY`, `CLOUDFLARE_ACCOUNT_ID`, `CLOUDFLARE_API_TOKEN`
/// and, optionally, `WORKERS_AI_MODEL`. Everything else takes its default.
pub fn from_env() -> ConfigResult<GatewayConfig> {
    let primary = PrimaryConfig::new(env::require_var(ENV_PRIMARY_API_KEY)?);
    let mut secondary = SecondaryConfig::new(
        env::require_var(ENV_ACCOUNT_ID)?,
        env::require_var(ENV_API_TOKEN)?,
    );
    if let Some(model) = env::optional_var(ENV_SECONDARY_MODEL) {
        secondary.model = model;
    }

    let config = GatewayConfig::new(primary, secondary);
    ConfigValidator::new().validate(&config)?;
    Ok(config)
}

fn read_interpolated(path: &Path) -> ConfigResult<String> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    env::interpolate_env_vars(&content)
}
