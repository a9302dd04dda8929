//! Configuration schema structures with serde support

use super::error::{InvalidSetting, Problem};
use super::secrets::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Schema version accepted by this release
pub const CONFIG_VERSION: &str = "0.1";

/// Root configuration structure for the gateway
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Schema version (required - no default)
    pub version: String,

    /// Inbound HTTP listener
    #[serde(default)]
    pub server: ServerConfig,

    /// Streaming primary backend
    pub primary: PrimaryConfig,

    /// Single-turn fallback backend
    pub secondary: SecondaryConfig,

    /// Outbound connection settings shared by both backends
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Reformatter pipeline settings
    #[serde(default)]
    pub streaming: StreamingConfig,
}

/// Inbound HTTP listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served for every path other than the API routes
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
        }
    }
}

/// Primary (Gemini) backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrimaryConfig {
    /// API key passed as the `key` query parameter
    pub api_key: SecretString,

    /// Base URL of the generative language API
    #[serde(default = "default_primary_base_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_primary_model")]
    pub model: String,

    /// Sampling temperature sent in `generationConfig`
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// How the streamed body is split into decode units
    #[serde(default)]
    pub framing: FramingMode,

    /// Shape of the `contents` field
    #[serde(default)]
    pub request_format: RequestFormat,

    /// System prompt injected when a conversation has none
    #[serde(default)]
    pub default_system_prompt: Option<String>,
}

/// Secondary (Workers AI) backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SecondaryConfig {
    /// Cloudflare account identifier
    pub account_id: String,

    /// Bearer token for the Workers AI REST API
    pub api_token: SecretString,

    /// Base URL of the Cloudflare API
    #[serde(default = "default_secondary_base_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_secondary_model")]
    pub model: String,
}

/// Framing of the primary backend's streamed body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FramingMode {
    /// Each transport read is one decode unit
    #[default]
    Chunk,
    /// Server-sent events; each `data:` line is one decode unit
    Sse,
}

/// Shape of the primary request's `contents`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestFormat {
    /// The conversation verbatim as `{role, content}` objects
    #[default]
    Passthrough,
    /// Gemini content objects with `parts`, system messages as `systemInstruction`
    Native,
}

/// Outbound connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Longest silence in seconds between two reads on a connection
    ///
    /// A healthy primary stream may run far longer than this as long as it
    /// keeps sending.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,

    /// Total timeout in seconds for the buffered secondary call
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum idle connections per host
    #[serde(default = "default_max_idle")]
    pub pool_max_idle_per_host: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            request_timeout_secs: default_request_timeout(),
            pool_max_idle_per_host: default_max_idle(),
        }
    }
}

/// Reformatter pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StreamingConfig {
    /// Bound of the channel between the reformatter task and the response body
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

// Default value functions for serde
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8787 }
fn default_primary_base_url() -> String { "https://generativelanguage.googleapis.com/v1beta".to_string() }
fn default_primary_model() -> String { "gemini-1.5-flash-latest".to_string() }
fn default_temperature() -> f32 { 0.9 }
fn default_secondary_base_url() -> String { "https://api.cloudflare.com/client/v4".to_string() }
fn default_secondary_model() -> String { "@cf/meta/llama-3-8b-instruct".to_string() }
fn default_connect_timeout() -> u64 { 10 }
fn default_read_timeout() -> u64 { 60 }
fn default_request_timeout() -> u64 { 120 }
fn default_max_idle() -> usize { 10 }
fn default_channel_capacity() -> usize { 16 }

impl PrimaryConfig {
    /// Primary configuration with defaults for everything but the key
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_primary_base_url(),
            model: default_primary_model(),
            temperature: default_temperature(),
            framing: FramingMode::default(),
            request_format: RequestFormat::default(),
            default_system_prompt: None,
        }
    }
}

impl SecondaryConfig {
    /// Secondary configuration with defaults for everything but the credentials
    pub fn new(account_id: impl Into<String>, api_token: impl Into<SecretString>) -> Self {
        Self {
            account_id: account_id.into(),
            api_token: api_token.into(),
            base_url: default_secondary_base_url(),
            model: default_secondary_model(),
        }
    }
}

impl GatewayConfig {
    /// Configuration with default server, connection and streaming sections
    pub fn new(primary: PrimaryConfig, secondary: SecondaryConfig) -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            server: ServerConfig::default(),
            primary,
            secondary,
            connection: ConnectionConfig::default(),
            streaming: StreamingConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), InvalidSetting> {
        if self.version.is_empty() {
            return Err(InvalidSetting::unset("version"));
        }

        if self.version != CONFIG_VERSION {
            return Err(InvalidSetting::new(
                "version",
                Problem::Version {
                    found: self.version.clone(),
                },
            ));
        }

        self.primary.validate("primary")?;
        self.secondary.validate("secondary")?;

        if self.connection.connect_timeout_secs == 0 {
            return Err(InvalidSetting::out_of_range(
                "connection.connect_timeout_secs",
                "Timeout must be positive",
            ));
        }
        if self.connection.read_timeout_secs == 0 {
            return Err(InvalidSetting::out_of_range(
                "connection.read_timeout_secs",
                "Timeout must be positive",
            ));
        }
        if self.connection.request_timeout_secs == 0 {
            return Err(InvalidSetting::out_of_range(
                "connection.request_timeout_secs",
                "Timeout must be positive",
            ));
        }
        if self.streaming.channel_capacity == 0 {
            return Err(InvalidSetting::out_of_range(
                "streaming.channel_capacity",
                "Channel capacity must be positive",
            ));
        }

        Ok(())
    }
}

impl PrimaryConfig {
    /// Validate primary backend configuration
    pub fn validate(&self, path: &str) -> Result<(), InvalidSetting> {
        if self.api_key.is_empty() {
            return Err(InvalidSetting::unset(format!("{}.api_key", path)));
        }
        if self.base_url.is_empty() {
            return Err(InvalidSetting::unset(format!("{}.base_url", path)));
        }
        if self.model.is_empty() {
            return Err(InvalidSetting::unset(format!("{}.model", path)));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(InvalidSetting::out_of_range(
                format!("{}.temperature", path),
                format!("Temperature must be between 0.0 and 2.0, got {}", self.temperature),
            ));
        }
        if let Some(prompt) = &self.default_system_prompt {
            if prompt.trim().is_empty() {
                return Err(InvalidSetting::malformed(
                    format!("{}.default_system_prompt", path),
                    "Prompt must not be blank",
                ));
            }
        }
        Ok(())
    }
}

impl SecondaryConfig {
    /// Validate secondary backend configuration
    pub fn validate(&self, path: &str) -> Result<(), InvalidSetting> {
        if self.account_id.is_empty() {
            return Err(InvalidSetting::unset(format!("{}.account_id", path)));
        }
        if self.api_token.is_empty() {
            return Err(InvalidSetting::unset(format!("{}.api_token", path)));
        }
        if self.base_url.is_empty() {
            return Err(InvalidSetting::unset(format!("{}.base_url", path)));
        }
        if self.model.is_empty() {
            return Err(InvalidSetting::unset(format!("{}.model", path)));
        }
        Ok(())
    }
}
