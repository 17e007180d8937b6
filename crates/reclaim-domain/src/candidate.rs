//! Candidate module - the persisted record of a non-compliant resource

use crate::identity::{Identity, TagKeys};
use std::collections::BTreeMap;

/// Provider family that produced a candidate
///
/// Persisted as its integer discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerType {
    /// Amazon Web Services
    Aws = 0,
    /// Google Cloud Platform
    Gcp = 1,
    /// Kubernetes clusters
    K8s = 2,
}

impl MarkerType {
    /// Name as written in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerType::Aws => "aws",
            MarkerType::Gcp => "gcp",
            MarkerType::K8s => "k8s",
        }
    }

    /// Integer code used on the wire
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Parse the wire code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(MarkerType::Aws),
            1 => Some(MarkerType::Gcp),
            2 => Some(MarkerType::K8s),
            _ => None,
        }
    }

    /// Accent color for digest entries
    pub fn color(&self) -> &'static str {
        match self {
            MarkerType::Aws => "#F4D03F",
            MarkerType::Gcp => "#FF0000",
            MarkerType::K8s => "#0000FF",
        }
    }

    /// Parse a name such as "aws" or "k8s" (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "aws" => Some(MarkerType::Aws),
            "gcp" => Some(MarkerType::Gcp),
            "k8s" | "kubernetes" => Some(MarkerType::K8s),
            _ => None,
        }
    }
}

impl std::fmt::Display for MarkerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MarkerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid marker type: {}", s))
    }
}

/// A resource recorded for eventual deletion
///
/// Immutable once written: its serialized form is the dedup key inside the
/// owner's candidate set, so tags are kept in a `BTreeMap` to give every
/// record one canonical ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedCandidate {
    /// Provider family
    pub marker_type: MarkerType,

    /// Resource kind this record belongs to
    pub candidate_type: String,

    /// Provider-specific resource id
    pub id: String,

    /// Owner tag value, "" when unknown
    pub owner: String,

    /// Raw ttl tag value, "" when absent
    pub ttl: String,

    /// Purpose tag value, "" when absent
    pub purpose: String,

    /// Account or cluster the resource lives in
    pub account: String,

    /// Every tag on the resource plus adapter-supplied context
    pub tags: BTreeMap<String, String>,
}

impl MarkedCandidate {
    /// Build a candidate from a classified identity
    ///
    /// `context_tags` (region, cluster, ...) are merged over the resource's own
    /// tags.
    ///
    /// # Examples
    ///
    /// ```
    /// use reclaim_domain::{Identity, MarkedCandidate, MarkerType, TagKeys};
    /// use std::collections::BTreeMap;
    ///
    /// let identity = Identity::new("i-42", "ec2").with_tag("owner", "alice");
    /// let mut context = BTreeMap::new();
    /// context.insert("region".to_string(), "us-west-2".to_string());
    ///
    /// let candidate = MarkedCandidate::from_identity(
    ///     &identity, "ec2", MarkerType::Aws, "sandbox", &TagKeys::default(), &context,
    /// );
    /// assert_eq!(candidate.owner, "alice");
    /// assert_eq!(candidate.tags.get("region").map(String::as_str), Some("us-west-2"));
    /// ```
    pub fn from_identity(
        identity: &Identity,
        kind: &str,
        marker_type: MarkerType,
        account: &str,
        keys: &TagKeys,
        context_tags: &BTreeMap<String, String>,
    ) -> Self {
        let mut tags: BTreeMap<String, String> = identity
            .tags
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        tags.extend(context_tags.iter().map(|(k, v)| (k.clone(), v.clone())));

        Self {
            marker_type,
            candidate_type: kind.to_string(),
            id: identity.id.clone(),
            owner: identity.tag_or_empty(&keys.owner).to_string(),
            ttl: identity.tag_or_empty(&keys.ttl).to_string(),
            purpose: identity.tag_or_empty(&keys.purpose).to_string(),
            account: account.to_string(),
            tags,
        }
    }

    /// Whether this record belongs to the given account and kind
    pub fn belongs_to(&self, account: &str, kind: &str) -> bool {
        self.account == account && self.candidate_type == kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_codes() {
        for marker in [MarkerType::Aws, MarkerType::Gcp, MarkerType::K8s] {
            assert_eq!(MarkerType::from_code(marker.code()), Some(marker));
        }
        assert_eq!(MarkerType::from_code(9), None);
        assert_eq!(MarkerType::Aws.code(), 0);
        assert_eq!(MarkerType::K8s.code(), 2);
    }

    #[test]
    fn test_marker_parse() {
        assert_eq!("AWS".parse::<MarkerType>(), Ok(MarkerType::Aws));
        for marker in [MarkerType::Aws, MarkerType::Gcp, MarkerType::K8s] {
            assert_eq!(MarkerType::parse(&marker.to_string()), Some(marker));
            assert_eq!(marker.as_str(), marker.as_str().to_lowercase());
        }
        assert_eq!("kubernetes".parse::<MarkerType>(), Ok(MarkerType::K8s));
        assert!("azure".parse::<MarkerType>().is_err());
    }

    #[test]
    fn test_from_identity_untagged() {
        let identity = Identity::new("vol-9", "ebs");
        let candidate = MarkedCandidate::from_identity(
            &identity,
            "ebs",
            MarkerType::Aws,
            "dev",
            &TagKeys::default(),
            &BTreeMap::new(),
        );

        assert_eq!(candidate.owner, "");
        assert_eq!(candidate.ttl, "");
        assert_eq!(candidate.purpose, "");
        assert!(candidate.tags.is_empty());
        assert!(candidate.belongs_to("dev", "ebs"));
        assert!(!candidate.belongs_to("prod", "ebs"));
        assert!(!candidate.belongs_to("dev", "ec2"));
    }

    #[test]
    fn test_context_tags_override() {
        let identity = Identity::new("i-1", "ec2")
            .with_tag("region", "stale")
            .with_tag("ttl", "2d");
        let mut context = BTreeMap::new();
        context.insert("region".to_string(), "eu-west-1".to_string());

        let candidate = MarkedCandidate::from_identity(
            &identity,
            "ec2",
            MarkerType::Aws,
            "dev",
            &TagKeys::default(),
            &context,
        );

        assert_eq!(candidate.ttl, "2d");
        assert_eq!(candidate.tags["region"], "eu-west-1");
        assert_eq!(candidate.tags.len(), 2);
    }
}
