//! Error types for the CLI application.

use reclaim_lifecycle::ConfigError;
use reclaim_notify::NotifyError;
use reclaim_store::{CacheError, StoreError};
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The candidate database could not be opened
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Candidate store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Notification error
    #[error("Notify error: {0}")]
    Notify(#[from] NotifyError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
