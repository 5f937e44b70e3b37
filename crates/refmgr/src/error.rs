//! Error types

use thiserror::Error;

/// Result type for reference management operations
pub type Result<T> = std::result::Result<T, RefError>;

/// Reference management errors
#[derive(Error, Debug)]
pub enum RefError {
    /// The communication runtime could not be created
    #[error("runtime initialization failed: {0}")]
    RuntimeInitFailed(String),

    /// The runtime has already been shut down
    #[error("runtime is shut down")]
    RuntimeShutDown,

    /// Naming directory error
    #[error("naming directory error: {0}")]
    Naming(#[from] naming::NamingError),

    /// The directory could not be reached
    #[error("naming directory at {location} unavailable: {reason}")]
    DirectoryUnavailable { location: String, reason: String },

    /// Logical name cannot be split into context and leaf
    #[error("invalid logical name: '{0}'")]
    InvalidName(String),

    /// Endpoint descriptor cannot be turned into a handle
    #[error("invalid endpoint descriptor: {0}")]
    InvalidDescriptor(String),

    /// Handle release failed
    #[error("release failed: {0}")]
    Release(String),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Configuration authoring errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Malformed directive or block
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// Malformed directive value
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Configuration file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }
}
