//! Error types for lifecycle operations

use reclaim_store::StoreError;
use thiserror::Error;

/// Failures reported by a resource adapter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider is rate limiting us; retry on the next scheduled run
    #[error("Throttled: {0}")]
    Throttled(String),

    /// The resource no longer exists
    #[error("Not found: {0}")]
    NotFound(String),

    /// A transient failure scoped to one resource
    #[error("Transient provider error: {0}")]
    Transient(String),

    /// Any other provider failure
    #[error("Provider error: {0}")]
    Other(String),
}

impl ProviderError {
    /// Whether this is a rate-limit signal
    pub fn is_throttled(&self) -> bool {
        matches!(self, ProviderError::Throttled(_))
    }
}

/// Errors loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for this schema
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range or inconsistent
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Errors that abort a Mark or Sweep pass for one kind
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// The candidate store failed
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// The provider failed while listing
    #[error("Provider error for kind {kind}: {source}")]
    Provider {
        /// Kind being processed
        kind: String,
        /// Underlying failure
        #[source]
        source: ProviderError,
    },

    /// A configured kind has no registered handler
    #[error("No handler registered for kind {0:?}")]
    UnknownKind(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl LifecycleError {
    pub(crate) fn provider(kind: &str, source: ProviderError) -> Self {
        LifecycleError::Provider {
            kind: kind.to_string(),
            source,
        }
    }
}
