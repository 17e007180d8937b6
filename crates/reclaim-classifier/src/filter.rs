//! Filter values
//!
//! Filters are pure predicates. A match means "ignore" inside an ignore phase
//! and "non-compliant" inside a compliance phase; the filter itself does not
//! know which phase it sits in.

use crate::rule::{IdPatterns, TagRule};
use reclaim_domain::{parse_span, Identity, UNLIMITED_TTL};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Whether a ttl tag value has run out for a resource created at `created_at`
///
/// Fails open: the `"0"` sentinel, an unparseable value, and an unknown
/// creation time all read as not expired.
///
/// # Examples
///
/// ```
/// use reclaim_classifier::ttl_expired;
///
/// let day = 86_400;
/// assert!(ttl_expired("1d", Some(0), day));
/// assert!(!ttl_expired("2d", Some(0), day));
/// assert!(!ttl_expired("0", Some(0), 100 * 365 * day));
/// assert!(!ttl_expired("soon", Some(0), day));
/// ```
pub fn ttl_expired(ttl: &str, created_at: Option<u64>, now: u64) -> bool {
    if ttl.trim() == UNLIMITED_TTL {
        return false;
    }
    let Ok(span) = parse_span(ttl) else {
        return false;
    };
    let Some(created_at) = created_at else {
        return false;
    };
    let elapsed = (now as i128 - created_at as i128).clamp(i64::MIN as i128, i64::MAX as i128);
    span.has_elapsed(elapsed as i64)
}

/// A filter over the normalized [`Identity`], portable across kinds
#[derive(Debug, Clone)]
pub enum IdentityFilter {
    /// The resource carries no tags at all
    NoTags,

    /// The named tag is absent
    MissingTag(String),

    /// The named ttl tag is present and has elapsed since creation
    TagTtlExpired(String),

    /// Any tag matches any of the rules
    IgnoreTagRules(Vec<TagRule>),

    /// A tag with exactly this key exists
    IgnoreTagKey(String),

    /// A tag key's first `/` segment equals this prefix
    IgnoreTagKeyPrefix(String),

    /// The id is one of these
    IgnoreIds(HashSet<String>),

    /// The id matches one of these patterns
    IgnoreIdPatterns(IdPatterns),
}

impl IdentityFilter {
    /// Build an id filter from string literals
    pub fn ignore_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::IgnoreIds(ids.into_iter().map(Into::into).collect())
    }

    /// Stable name used in logs and verdicts
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoTags => "no_tags",
            Self::MissingTag(_) => "missing_tag",
            Self::TagTtlExpired(_) => "ttl_expired",
            Self::IgnoreTagRules(_) => "ignore_tag_rules",
            Self::IgnoreTagKey(_) => "ignore_tag_key",
            Self::IgnoreTagKeyPrefix(_) => "ignore_tag_key_prefix",
            Self::IgnoreIds(_) => "ignore_ids",
            Self::IgnoreIdPatterns(_) => "ignore_id_patterns",
        }
    }

    /// Evaluate the filter at time `now` (seconds since Unix epoch)
    pub fn matches(&self, identity: &Identity, now: u64) -> bool {
        match self {
            Self::NoTags => !identity.has_tags(),
            Self::MissingTag(key) => identity.tag(key).is_none(),
            Self::TagTtlExpired(key) => identity
                .tag(key)
                .is_some_and(|ttl| ttl_expired(ttl, identity.created_at, now)),
            Self::IgnoreTagRules(rules) => identity
                .tags
                .iter()
                .any(|(k, v)| rules.iter().any(|rule| rule.matches(k, v))),
            Self::IgnoreTagKey(key) => identity.tags.contains_key(key),
            Self::IgnoreTagKeyPrefix(prefix) => identity
                .tags
                .keys()
                .any(|k| k.split('/').next() == Some(prefix.as_str())),
            Self::IgnoreIds(ids) => ids.contains(&identity.id),
            Self::IgnoreIdPatterns(patterns) => patterns.find(&identity.id).is_some(),
        }
    }
}

type Predicate<R, C> = dyn Fn(&R, &C) -> bool + Send + Sync;

/// A filter over the raw provider object and the pass-scoped context
///
/// For checks the normalized identity cannot express, such as "this volume is
/// attached" or "this group wants zero instances".
pub struct TypedFilter<R, C> {
    name: &'static str,
    predicate: Arc<Predicate<R, C>>,
}

impl<R, C> TypedFilter<R, C> {
    /// Wrap a predicate under a name
    pub fn new<F>(name: &'static str, predicate: F) -> Self
    where
        F: Fn(&R, &C) -> bool + Send + Sync + 'static,
    {
        Self {
            name,
            predicate: Arc::new(predicate),
        }
    }

    /// Name used in logs and verdicts
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Evaluate the predicate
    pub fn matches(&self, raw: &R, context: &C) -> bool {
        (self.predicate)(raw, context)
    }
}

impl<R, C> Clone for TypedFilter<R, C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<R, C> fmt::Debug for TypedFilter<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedFilter").field("name", &self.name).finish()
    }
}
