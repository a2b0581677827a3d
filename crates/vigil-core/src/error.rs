//! Error types for Vigil

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using VigilError
pub type Result<T> = std::result::Result<T, VigilError>;

/// Main error type for Vigil operations
#[derive(Debug, Error)]
pub enum VigilError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Variant manifest errors
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reading a variant manifest
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Manifest file not found
    #[error("Variant manifest not found at {0}")]
    NotFound(PathBuf),

    /// Unsupported manifest extension
    #[error("Unsupported manifest format for {0} (expected .json, .yaml, .yml or .toml)")]
    UnsupportedFormat(PathBuf),

    /// Failed to parse the manifest
    #[error("Failed to parse variant manifest {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    /// IO error
    #[error("IO error reading manifest: {0}")]
    Io(#[from] std::io::Error),
}

impl VigilError {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }
}
