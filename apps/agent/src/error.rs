//! Error handling for the agent

use std::path::PathBuf;

use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Vault not found: {0}")]
    VaultNotFound(PathBuf),

    #[error("Settings file error at {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Invalid settings in {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
