//! Identity module - normalized view of one provider resource

use std::collections::HashMap;

/// A normalized snapshot of a resource taken at list time
///
/// Adapters produce one `Identity` per listed item. It is only valid for the
/// pass that produced it and is never persisted directly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Identity {
    /// Provider-specific opaque identifier
    pub id: String,

    /// Resource kind (e.g. "ec2", "ebs", "namespace")
    pub kind: String,

    /// Tags or annotations, unordered
    pub tags: HashMap<String, String>,

    /// Creation time in seconds since Unix epoch, when the provider reports one
    pub created_at: Option<u64>,
}

impl Identity {
    /// Create an untagged identity with no creation time
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            tags: HashMap::new(),
            created_at: None,
        }
    }

    /// Add a single tag
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Add every tag from an iterator of pairs
    pub fn with_tags<K, V, I>(mut self, tags: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.tags
            .extend(tags.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set the creation timestamp
    pub fn created_at(mut self, timestamp: u64) -> Self {
        self.created_at = Some(timestamp);
        self
    }

    /// Look up a tag value
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Look up a tag value, treating a missing tag as the empty string
    pub fn tag_or_empty(&self, key: &str) -> &str {
        self.tag(key).unwrap_or_default()
    }

    /// Whether the resource carries any tags at all
    pub fn has_tags(&self) -> bool {
        !self.tags.is_empty()
    }

    /// Owner of this resource under the given tag naming, "" when unset
    pub fn owner(&self, keys: &TagKeys) -> &str {
        self.tag_or_empty(&keys.owner)
    }
}

/// Names of the tags that carry lifecycle metadata
///
/// Cloud resources usually use plain `ttl`/`owner`/`purpose` tags while
/// cluster objects use namespaced annotations; each account configures its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagKeys {
    /// Tag holding the time-to-live span
    pub ttl: String,
    /// Tag naming the accountable owner
    pub owner: String,
    /// Tag describing why the resource exists
    pub purpose: String,
}

impl Default for TagKeys {
    fn default() -> Self {
        Self {
            ttl: "ttl".to_string(),
            owner: "owner".to_string(),
            purpose: "purpose".to_string(),
        }
    }
}
