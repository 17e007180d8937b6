//! Configured ignore rules for tags and ids

use crate::error::ClassifierError;
use regex::Regex;
use serde::{Deserialize, Serialize};

fn compile(pattern: &str) -> Result<Regex, ClassifierError> {
    Regex::new(pattern).map_err(|source| ClassifierError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// A tag ignore rule as written in configuration
///
/// ```toml
/// [[ignore_tags]]
/// key = "team"
/// value = "platform"
///
/// [[ignore_tags]]
/// key_regex = "^keep-.*"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRuleConfig {
    /// Exact tag key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Exact tag value, only checked together with `key`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Pattern matched against every tag key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_regex: Option<String>,

    /// Pattern matched against every tag value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_regex: Option<String>,
}

impl TagRuleConfig {
    /// Compile the rule's patterns
    pub fn compile(&self) -> Result<TagRule, ClassifierError> {
        if self.key.is_none() && self.key_regex.is_none() && self.value_regex.is_none() {
            return Err(ClassifierError::EmptyRule);
        }
        Ok(TagRule {
            key: self.key.clone(),
            value: self.value.clone(),
            key_regex: self.key_regex.as_deref().map(compile).transpose()?,
            value_regex: self.value_regex.as_deref().map(compile).transpose()?,
        })
    }
}

/// A compiled tag ignore rule
///
/// Matches a tag when any of these hold:
/// - `key` equals the tag key, and `value` (if set) equals the tag value
/// - `key_regex` matches the tag key
/// - `value_regex` matches the tag value
#[derive(Debug, Clone)]
pub struct TagRule {
    key: Option<String>,
    value: Option<String>,
    key_regex: Option<Regex>,
    value_regex: Option<Regex>,
}

impl TagRule {
    /// Rule matching an exact key/value pair
    pub fn pair(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: Some(value.into()),
            key_regex: None,
            value_regex: None,
        }
    }

    /// Whether the rule matches one tag
    pub fn matches(&self, key: &str, value: &str) -> bool {
        if let Some(rule_key) = &self.key {
            if rule_key == key && self.value.as_deref().is_none_or(|v| v == value) {
                return true;
            }
        }
        if self.key_regex.as_ref().is_some_and(|re| re.is_match(key)) {
            return true;
        }
        self.value_regex.as_ref().is_some_and(|re| re.is_match(value))
    }

    /// Short description for log lines
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(key) = &self.key {
            match &self.value {
                Some(value) => parts.push(format!("{}:{}", key, value)),
                None => parts.push(key.clone()),
            }
        }
        if let Some(re) = &self.key_regex {
            parts.push(format!("key~{}", re.as_str()));
        }
        if let Some(re) = &self.value_regex {
            parts.push(format!("value~{}", re.as_str()));
        }
        parts.join(" ")
    }
}

/// Compiled id patterns (e.g. namespaces never to touch)
#[derive(Debug, Clone, Default)]
pub struct IdPatterns {
    patterns: Vec<Regex>,
}

impl IdPatterns {
    /// Compile a list of patterns; empty strings are skipped
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ClassifierError> {
        let patterns = patterns
            .iter()
            .map(AsRef::as_ref)
            .filter(|p| !p.is_empty())
            .map(compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// First pattern matching the id
    pub fn find(&self, id: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|re| re.is_match(id))
            .map(Regex::as_str)
    }

    /// Number of compiled patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether no patterns were configured
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_rule() {
        let rule = TagRule::pair("foo", "bar");
        assert!(rule.matches("foo", "bar"));
        assert!(!rule.matches("baz", "bar"));
        assert!(!rule.matches("foo", "baz"));
    }

    #[test]
    fn test_key_only_rule() {
        let rule = TagRuleConfig {
            key: Some("keep".to_string()),
            ..Default::default()
        }
        .compile()
        .unwrap();
        assert!(rule.matches("keep", "anything"));
        assert!(!rule.matches("other", "keep"));
    }

    #[test]
    fn test_regex_rules() {
        let rule = TagRuleConfig {
            key_regex: Some("^foo.*".to_string()),
            value_regex: Some("^bar.*".to_string()),
            ..Default::default()
        }
        .compile()
        .unwrap();

        assert!(rule.matches("foofoo", "baz"));
        assert!(rule.matches("blah", "barbar"));
        assert!(!rule.matches("blah", "test??"));
    }

    #[test]
    fn test_invalid_regex() {
        let result = TagRuleConfig {
            key_regex: Some("(unclosed".to_string()),
            ..Default::default()
        }
        .compile();
        assert!(matches!(result, Err(ClassifierError::InvalidPattern { .. })));
    }

    #[test]
    fn test_empty_rule_rejected() {
        let result = TagRuleConfig {
            value: Some("orphan".to_string()),
            ..Default::default()
        }
        .compile();
        assert!(matches!(result, Err(ClassifierError::EmptyRule)));
    }

    #[test]
    fn test_id_patterns() {
        let patterns = IdPatterns::compile(&["^ci-", "", "-keep$"]).unwrap();
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns.find("ci-build-7"), Some("^ci-"));
        assert_eq!(patterns.find("demo-keep"), Some("-keep$"));
        assert_eq!(patterns.find("scratch"), None);
    }

    #[test]
    fn test_rule_from_toml() {
        let rule: TagRuleConfig = toml::from_str(
            r#"
            key = "team"
            value = "platform"
            "#,
        )
        .unwrap();
        assert_eq!(rule.key.as_deref(), Some("team"));
        assert!(rule.key_regex.is_none());
        assert!(rule.compile().unwrap().matches("team", "platform"));
    }
}
