//! Shared HTTP client built on reqwest

use crate::config::ConnectionConfig;
use crate::providers::error::{ProviderError, ProviderResult};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Default user agent
const USER_AGENT: &str = concat!("chatgate/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client with connection pooling
///
/// `reqwest::Client` is reference counted internally, so clones share one
/// pool.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with default connection settings
    pub fn new() -> ProviderResult<Self> {
        Self::from_config(&ConnectionConfig::default())
    }

    /// Create a new HTTP client from connection configuration
    ///
    /// Only connection setup and idle reads are bounded here. A total
    /// deadline would cut off long but live primary streams, so callers that
    /// want one set it per request through [`RequestOptions::with_timeout`].
    ///
    /// [`RequestOptions::with_timeout`]: crate::http::RequestOptions::with_timeout
    pub fn from_config(config: &ConnectionConfig) -> ProviderResult<Self> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .map_err(|e| {
                ProviderError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    /// The underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }
}
