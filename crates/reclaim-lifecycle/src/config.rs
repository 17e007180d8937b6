//! Configuration for lifecycle controllers
//!
//! One [`LifecycleConfig`] per account or cluster; a [`ReclaimConfig`] file
//! bundles several of them with the database path and notifier settings.

use crate::error::ConfigError;
use reclaim_classifier::{IdPatterns, IdentityFilter, TagRuleConfig};
use reclaim_domain::{parse_span, MarkerType, TagKeys};
use reclaim_notify::{NotifyConfig, Recipient};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Namespaces a cluster controller never touches
pub const PROTECTED_NAMESPACES: [&str; 3] = ["default", "kube-system", "kube-public"];

/// Longest accepted mark, sweep or notify interval (one year)
pub const MAX_INTERVAL_MINUTES: u64 = 365 * 24 * 60;

/// Tag names carrying lifecycle metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagKeyConfig {
    /// Ttl tag name
    pub ttl: String,
    /// Owner tag name
    pub owner: String,
    /// Purpose tag name
    pub purpose: String,
}

impl Default for TagKeyConfig {
    fn default() -> Self {
        let keys = TagKeys::default();
        Self {
            ttl: keys.ttl,
            owner: keys.owner,
            purpose: keys.purpose,
        }
    }
}

impl From<&TagKeyConfig> for TagKeys {
    fn from(config: &TagKeyConfig) -> Self {
        TagKeys {
            ttl: config.ttl.clone(),
            owner: config.owner.clone(),
            purpose: config.purpose.clone(),
        }
    }
}

/// Configuration for one account or cluster
///
/// # Examples
///
/// ```
/// use reclaim_lifecycle::LifecycleConfig;
///
/// let config = LifecycleConfig::from_toml(r#"
///     account = "sandbox"
///     kinds = ["ec2", "ebs"]
///     grace_period = "2d"
/// "#).unwrap();
///
/// assert!(!config.delete_enabled);
/// assert_eq!(config.grace_period().unwrap().as_secs(), 2 * 86_400);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Account or cluster name, recorded in every candidate
    pub account: String,

    /// Provider family: "aws", "gcp" or "k8s"
    /// Default: "aws"
    #[serde(default = "default_marker_type")]
    pub marker_type: String,

    /// Kinds to process, in order
    #[serde(default)]
    pub kinds: Vec<String>,

    /// Time between first detection and deletion eligibility
    /// Default: "24h"
    #[serde(default = "default_grace_period")]
    pub grace_period: String,

    /// Actually delete; when false, sweeps only log what they would delete
    /// Default: false
    #[serde(default)]
    pub delete_enabled: bool,

    /// How often to mark (in minutes)
    /// Default: 60
    #[serde(default = "default_mark_interval")]
    pub mark_interval_minutes: u64,

    /// How often to sweep (in minutes)
    /// Default: 1440 (daily)
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_minutes: u64,

    /// How often to notify owners (in minutes)
    /// Default: 720
    #[serde(default = "default_notify_interval")]
    pub notify_interval_minutes: u64,

    /// Tag names for ttl, owner and purpose
    #[serde(default)]
    pub tag_keys: TagKeyConfig,

    /// Tags that exempt a resource
    #[serde(default)]
    pub ignore_tags: Vec<TagRuleConfig>,

    /// Ids that are never touched
    #[serde(default)]
    pub ignore_ids: Vec<String>,

    /// Id patterns that are never touched
    #[serde(default)]
    pub ignore_id_patterns: Vec<String>,

    /// Extra tags written into every candidate (e.g. region)
    #[serde(default)]
    pub context_tags: BTreeMap<String, String>,
}

fn default_marker_type() -> String {
    "aws".to_string()
}

fn default_grace_period() -> String {
    "24h".to_string()
}

fn default_mark_interval() -> u64 {
    60
}

fn default_sweep_interval() -> u64 {
    1440
}

fn default_notify_interval() -> u64 {
    720
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            account: String::new(),
            marker_type: default_marker_type(),
            kinds: Vec::new(),
            grace_period: default_grace_period(),
            delete_enabled: false,
            mark_interval_minutes: default_mark_interval(),
            sweep_interval_minutes: default_sweep_interval(),
            notify_interval_minutes: default_notify_interval(),
            tag_keys: TagKeyConfig::default(),
            ignore_tags: Vec::new(),
            ignore_ids: Vec::new(),
            ignore_id_patterns: Vec::new(),
            context_tags: BTreeMap::new(),
        }
    }
}

impl LifecycleConfig {
    /// Defaults for a Kubernetes cluster
    ///
    /// Marks namespaces and protects the system namespaces.
    pub fn kubernetes(cluster: impl Into<String>) -> Self {
        Self {
            account: cluster.into(),
            marker_type: "k8s".to_string(),
            kinds: vec!["namespace".to_string()],
            ignore_ids: PROTECTED_NAMESPACES.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Parse from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parsed grace period; must be positive
    pub fn grace_period(&self) -> Result<Duration, ConfigError> {
        let span = parse_span(&self.grace_period).map_err(|e| {
            ConfigError::Invalid(format!("grace_period {:?}: {}", self.grace_period, e))
        })?;
        match span.to_std() {
            Some(duration) if !duration.is_zero() => Ok(duration),
            _ => Err(ConfigError::Invalid(format!(
                "grace_period must be positive, got {:?}",
                self.grace_period
            ))),
        }
    }

    /// Parsed provider family
    pub fn marker_type(&self) -> Result<MarkerType, ConfigError> {
        MarkerType::parse(&self.marker_type).ok_or_else(|| {
            ConfigError::Invalid(format!("unknown marker_type {:?}", self.marker_type))
        })
    }

    /// Tag names as domain keys
    pub fn tag_keys(&self) -> TagKeys {
        TagKeys::from(&self.tag_keys)
    }

    /// Compile the configured ignore rules into filters
    pub fn ignore_filters(&self) -> Result<Vec<IdentityFilter>, ConfigError> {
        let mut filters = Vec::new();

        if !self.ignore_ids.is_empty() {
            filters.push(IdentityFilter::ignore_ids(self.ignore_ids.iter().cloned()));
        }
        if !self.ignore_id_patterns.is_empty() {
            let patterns = IdPatterns::compile(&self.ignore_id_patterns)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            filters.push(IdentityFilter::IgnoreIdPatterns(patterns));
        }
        if !self.ignore_tags.is_empty() {
            let rules = self
                .ignore_tags
                .iter()
                .map(TagRuleConfig::compile)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            filters.push(IdentityFilter::IgnoreTagRules(rules));
        }

        Ok(filters)
    }

    /// Mark interval as Duration
    pub fn mark_interval(&self) -> Duration {
        Duration::from_secs(self.mark_interval_minutes.saturating_mul(60))
    }

    /// Sweep interval as Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_minutes.saturating_mul(60))
    }

    /// Notify interval as Duration
    pub fn notify_interval(&self) -> Duration {
        Duration::from_secs(self.notify_interval_minutes.saturating_mul(60))
    }

    /// Check the configuration for values a controller cannot work with
    pub fn validate(&self) -> Result<(), String> {
        if self.account.trim().is_empty() {
            return Err("account must be set".to_string());
        }
        if self.kinds.is_empty() {
            return Err(format!("{}: kinds must not be empty", self.account));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.kinds.iter().find(|k| !seen.insert(k.as_str())) {
            return Err(format!("{}: kind {:?} listed twice", self.account, dup));
        }
        let intervals = [
            self.mark_interval_minutes,
            self.sweep_interval_minutes,
            self.notify_interval_minutes,
        ];
        if intervals.iter().any(|m| *m == 0 || *m > MAX_INTERVAL_MINUTES) {
            return Err(format!(
                "{}: intervals must be between 1 and {} minutes",
                self.account, MAX_INTERVAL_MINUTES
            ));
        }
        if self.tag_keys.ttl.is_empty() || self.tag_keys.owner.is_empty() {
            return Err(format!("{}: tag_keys.ttl and tag_keys.owner must be set", self.account));
        }
        self.grace_period()
            .map_err(|e| format!("{}: {}", self.account, e))?;
        self.marker_type()
            .map_err(|e| format!("{}: {}", self.account, e))?;
        self.ignore_filters()
            .map_err(|e| format!("{}: {}", self.account, e))?;
        Ok(())
    }
}

/// A complete deployment file
///
/// ```toml
/// database = "/var/lib/reclaim/cache.db"
///
/// [[accounts]]
/// account = "sandbox"
/// kinds = ["ec2", "ebs"]
///
/// [notify]
/// default_owner = "ops"
///
/// [[recipients]]
/// id = "U123"
/// name = "alice"
/// email = "alice@example.com"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReclaimConfig {
    /// SQLite cache location
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// One entry per account or cluster
    #[serde(default)]
    pub accounts: Vec<LifecycleConfig>,

    /// Notifier settings; notification is off when absent
    #[serde(default)]
    pub notify: Option<NotifyConfig>,

    /// Static recipient directory
    #[serde(default)]
    pub recipients: Vec<Recipient>,
}

fn default_database() -> PathBuf {
    PathBuf::from("reclaim.db")
}

impl Default for ReclaimConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            accounts: Vec::new(),
            notify: None,
            recipients: Vec::new(),
        }
    }
}

impl ReclaimConfig {
    /// Parse from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), String> {
        if self.accounts.is_empty() {
            return Err("at least one [[accounts]] entry is required".to_string());
        }
        let mut seen = HashSet::new();
        for account in &self.accounts {
            account.validate()?;
            if !seen.insert((account.account.as_str(), account.marker_type.as_str())) {
                return Err(format!("account {:?} configured twice", account.account));
            }
        }
        if let Some(notify) = &self.notify {
            notify.validate()?;
        }
        Ok(())
    }
}
