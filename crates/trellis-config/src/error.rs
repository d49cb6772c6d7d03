//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid TOML syntax.
    #[error("invalid TOML in {path}: {source}")]
    InvalidToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Configuration could not be serialized.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// A registry with the same name is already configured.
    #[error("registry already configured: {0}")]
    DuplicateRegistry(String),

    /// No registry with the given name is configured.
    #[error("registry not configured: {0}")]
    UnknownRegistry(String),

    /// Removing the registry would leave none configured.
    #[error("cannot remove {0}: it is the only configured registry")]
    LastRegistry(String),

    /// The user configuration directory could not be determined.
    #[error("could not determine the user configuration directory")]
    NoConfigDir,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
