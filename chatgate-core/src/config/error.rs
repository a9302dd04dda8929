//! Errors raised while loading gateway configuration

use thiserror::Error;

/// Why a configuration could not be loaded
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{}:{}: {message}", .line.unwrap_or(0), .column.unwrap_or(0))]
    Parse {
        path: String,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    #[error(transparent)]
    Invalid(#[from] InvalidSetting),

    #[error("environment variable '{var}' is not set")]
    MissingEnvVar { var: String },

    #[error("config file '{path}' must end in .yaml, .yml or .json")]
    UnknownExtension { path: String },
}

/// A setting that parsed but cannot be used
#[derive(Debug, Error)]
#[error("{setting}: {problem}")]
pub struct InvalidSetting {
    /// Dotted path of the setting, e.g. `primary.temperature`
    pub setting: String,
    pub problem: Problem,
}

/// What is wrong with an [`InvalidSetting`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Problem {
    #[error("must be set")]
    Unset,

    #[error("{0}")]
    OutOfRange(String),

    #[error("{0}")]
    Malformed(String),

    #[error("unsupported config version '{found}'")]
    Version { found: String },
}

impl InvalidSetting {
    pub fn new(setting: impl Into<String>, problem: Problem) -> Self {
        Self {
            setting: setting.into(),
            problem,
        }
    }

    pub fn unset(setting: impl Into<String>) -> Self {
        Self::new(setting, Problem::Unset)
    }

    pub fn out_of_range(setting: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(setting, Problem::OutOfRange(reason.into()))
    }

    pub fn malformed(setting: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(setting, Problem::Malformed(reason.into()))
    }
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;
