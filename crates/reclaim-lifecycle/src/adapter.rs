//! The per-kind resource adapter contract

use crate::error::ProviderError;
use async_trait::async_trait;
use reclaim_domain::Identity;

/// One page of a provider listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Continuation token; `None` on the last page
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    /// A final page
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }

    /// A page followed by more
    pub fn more(items: Vec<T>, next_token: impl Into<String>) -> Self {
        Self {
            items,
            next_token: Some(next_token.into()),
        }
    }
}

/// Lists, normalizes and deletes resources of one kind
///
/// Ids are opaque to the lifecycle; only the adapter interprets them.
#[async_trait]
pub trait ResourceAdapter: Send + Sync {
    /// Raw provider object
    type Item: Send + Sync;

    /// Pass-scoped data for typed filters, computed once per Mark pass
    type Context: Send + Sync;

    /// Kind tag this adapter handles (e.g. "ebs")
    fn kind(&self) -> &str;

    /// Compute the context for one Mark pass
    async fn pass_context(&self) -> Result<Self::Context, ProviderError>;

    /// Fetch one page; `None` requests the first page
    async fn list(&self, token: Option<String>) -> Result<Page<Self::Item>, ProviderError>;

    /// Normalize a raw object
    fn extract_identity(&self, item: &Self::Item) -> Identity;

    /// Delete a resource by id
    async fn delete(&self, id: &str) -> Result<(), ProviderError>;
}
