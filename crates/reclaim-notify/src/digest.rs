//! Digest rendering and chunking

use crate::error::NotifyError;
use async_trait::async_trait;
use reclaim_domain::MarkedCandidate;

/// One labelled value in a digest item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestField {
    /// Field label
    pub title: String,
    /// Field value
    pub value: String,
}

impl DigestField {
    fn new(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
        }
    }
}

/// One resource in a digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestItem {
    /// Resource id, the item's headline
    pub id: String,
    /// Accent color of the provider family
    pub color: &'static str,
    /// Every tag followed by purpose, owner, type and account
    pub fields: Vec<DigestField>,
}

impl From<&MarkedCandidate> for DigestItem {
    fn from(candidate: &MarkedCandidate) -> Self {
        let mut fields: Vec<DigestField> = candidate
            .tags
            .iter()
            .map(|(k, v)| DigestField::new(k.as_str(), v.as_str()))
            .collect();
        fields.push(DigestField::new("purpose", candidate.purpose.as_str()));
        fields.push(DigestField::new("owner", candidate.owner.as_str()));
        fields.push(DigestField::new("type", candidate.candidate_type.as_str()));
        fields.push(DigestField::new("account", candidate.account.as_str()));

        Self {
            id: candidate.id.clone(),
            color: candidate.marker_type.color(),
            fields,
        }
    }
}

/// One message of a digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    /// Headline text
    pub headline: String,
    /// Items in this message
    pub items: Vec<DigestItem>,
}

/// Split items into messages of at most `max_items` each
///
/// A `max_items` of zero is treated as one.
pub fn chunk_digest(headline: &str, items: Vec<DigestItem>, max_items: usize) -> Vec<Digest> {
    let size = max_items.max(1);
    items
        .chunks(size)
        .map(|chunk| Digest {
            headline: headline.to_string(),
            items: chunk.to_vec(),
        })
        .collect()
}

/// Delivers digest messages to a destination
#[async_trait]
pub trait DigestSink: Send + Sync {
    /// Deliver one message to `destination` (a recipient id or channel)
    async fn deliver(&self, destination: &str, digest: &Digest) -> Result<(), NotifyError>;
}

/// A sink that only writes digests to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl DigestSink for LogSink {
    async fn deliver(&self, destination: &str, digest: &Digest) -> Result<(), NotifyError> {
        for item in &digest.items {
            tracing::info!(destination = %destination, id = %item.id, "{}", digest.headline);
        }
        Ok(())
    }
}
