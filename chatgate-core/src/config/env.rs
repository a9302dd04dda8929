//! Environment variable handling for configuration

use super::error::ConfigError;
use regex::Regex;
use std::env;
use std::sync::LazyLock;

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid env var pattern"));

/// Interpolate `${VAR}` references in a configuration string
pub fn interpolate_env_vars(content: &str) -> Result<String, ConfigError> {
    let mut missing_vars = Vec::new();

    let result = ENV_VAR_PATTERN.replace_all(content, |cap: &regex::Captures<'_>| {
        match env::var(&cap[1]) {
            Ok(value) => value,
            Err(_) => {
                missing_vars.push(cap[1].to_string());
                String::new()
            }
        }
    });

    // Report the first missing variable
    if let Some(var) = missing_vars.into_iter().next() {
        return Err(ConfigError::MissingEnvVar { var });
    }

    Ok(result.into_owned())
}

/// Read a required environment variable
pub fn require_var(var: &str) -> Result<String, ConfigError> {
    match env::var(var) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnvVar {
            var: var.to_string(),
        }),
    }
}

/// Read an optional environment variable, treating empty as unset
pub fn optional_var(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.is_empty())
}
