//! Error types for the candidate store

use crate::cache::CacheError;
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The cache could not be reached or failed
    #[error("Store unavailable: {0}")]
    Unavailable(#[from] CacheError),

    /// The owner has no records at all
    ///
    /// Benign: callers retracting an id that was never recorded see this.
    #[error("No candidates for owner {0:?}")]
    NoCandidates(String),

    /// A cached record could not be decoded
    #[error("Malformed record: {0}")]
    Malformed(String),

    /// A record could not be encoded
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether this is the benign empty-owner signal
    pub fn is_no_candidates(&self) -> bool {
        matches!(self, StoreError::NoCandidates(_))
    }
}
