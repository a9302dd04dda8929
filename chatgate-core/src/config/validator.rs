//! Configuration validation utilities

use super::error::InvalidSetting;
use super::schema::GatewayConfig;
use url::Url;

/// Configuration validator with rules beyond the schema's built-in checks
#[derive(Debug, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self
    }

    /// Validate a configuration with extended rules
    pub fn validate(&self, config: &GatewayConfig) -> Result<(), InvalidSetting> {
        // First run the built-in validation
        config.validate()?;

        self.validate_base_url("primary.base_url", &config.primary.base_url)?;
        self.validate_base_url("secondary.base_url", &config.secondary.base_url)?;
        self.validate_model_id("primary.model", &config.primary.model)?;

        Ok(())
    }

    /// Base URLs must parse and use http or https
    fn validate_base_url(&self, field: &str, value: &str) -> Result<(), InvalidSetting> {
        let url = Url::parse(value).map_err(|e| InvalidSetting::malformed(field, e.to_string()))?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(InvalidSetting::malformed(
                    field,
                    format!("unsupported scheme '{}'", other),
                ))
            }
        }

        if url.query().is_some() {
            return Err(InvalidSetting::malformed(
                field,
                "must not carry a query; credentials are appended per call",
            ));
        }

        Ok(())
    }

    /// The primary model is spliced into a path segment
    fn validate_model_id(&self, field: &str, value: &str) -> Result<(), InvalidSetting> {
        if value.contains('/') || value.contains('?') || value.chars().any(char::is_whitespace) {
            return Err(InvalidSetting::malformed(
                field,
                format!("'{}' is not a valid model identifier", value),
            ));
        }
        Ok(())
    }
}
