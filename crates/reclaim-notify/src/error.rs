//! Error types for notification

use reclaim_store::StoreError;
use thiserror::Error;

/// Errors that can occur while notifying owners
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Reading owners or candidates failed
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// The identity directory could not be queried
    #[error("Resolver error: {0}")]
    Resolve(String),

    /// The configured default owner does not resolve to anyone
    #[error("Default owner {0:?} cannot be resolved")]
    NoDefaultRecipient(String),

    /// A message could not be delivered
    #[error("Delivery failed: {0}")]
    Delivery(String),
}
