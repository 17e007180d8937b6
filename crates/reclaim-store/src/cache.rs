//! The cache contract consumed by the candidate store

use std::time::SystemTime;
use thiserror::Error;

/// Errors reported by a cache backend
#[derive(Error, Debug)]
pub enum CacheError {
    /// SQLite backend failure
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A lock guarding in-process state was poisoned by a panicking writer
    #[error("Cache lock poisoned")]
    Poisoned,

    /// Any other backend failure (connection refused, timeout, ...)
    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// Minimal set and expiring-key operations
///
/// Every method is atomic with respect to the key it touches. Implementations
/// must be shareable across controllers, hence `Send + Sync` and `&self`.
pub trait CandidateCache: Send + Sync {
    /// Add `value` to the set at `key`
    fn add(&self, key: &str, value: &str) -> Result<(), CacheError>;

    /// Every member of the set at `key`; an absent set reads as empty
    fn read_set(&self, key: &str) -> Result<Vec<String>, CacheError>;

    /// Whether `value` is a member of the set at `key`
    fn is_member(&self, key: &str, value: &str) -> Result<bool, CacheError>;

    /// Remove `value` from the set at `key`
    fn remove(&self, key: &str, value: &str) -> Result<(), CacheError>;

    /// Create `key` expiring at `expires_at` unless a live key already exists
    ///
    /// Returns whether the key was created. An existing key is never touched.
    fn create_with_expiry(
        &self,
        key: &str,
        value: &str,
        expires_at: SystemTime,
    ) -> Result<bool, CacheError>;

    /// Whether a live (unexpired) key exists
    fn exists(&self, key: &str) -> Result<bool, CacheError>;
}
