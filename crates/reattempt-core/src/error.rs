//! Error types for reattempt-core

use thiserror::Error;

use crate::types::PolicyError;

/// Result type alias using reattempt-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration errors raised while loading retry policies
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {message}")]
    InvalidConfig { message: String },

    /// A retry policy failed validation
    #[error("Invalid retry policy '{name}': {source}")]
    InvalidPolicy {
        name: String,
        #[source]
        source: PolicyError,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid policy error
    pub fn invalid_policy(name: impl Into<String>, source: PolicyError) -> Self {
        Self::InvalidPolicy {
            name: name.into(),
            source,
        }
    }
}
