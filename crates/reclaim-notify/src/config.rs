//! Configuration for owner digests

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the notifier
///
/// # Examples
///
/// ```
/// use reclaim_notify::NotifyConfig;
///
/// let config = NotifyConfig::default();
/// assert_eq!(config.max_items_per_message, 20);
/// assert!(config.channel.is_none());
/// assert!(config.validate().is_err()); // default_owner is required
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Recipient for unowned resources and owners that cannot be resolved
    #[serde(default)]
    pub default_owner: String,

    /// Channel that receives the default owner's digests instead of a
    /// direct message
    #[serde(default)]
    pub channel: Option<String>,

    /// Items per message; delivery channels stop rendering long messages
    /// Default: 20
    #[serde(default = "default_max_items")]
    pub max_items_per_message: usize,

    /// Pause between chunks of one digest (in milliseconds)
    /// Default: 2000
    #[serde(default = "default_chunk_pause_ms")]
    pub chunk_pause_ms: u64,

    /// Headline of every message
    #[serde(default = "default_message")]
    pub message: String,
}

fn default_max_items() -> usize {
    20
}

fn default_chunk_pause_ms() -> u64 {
    2000
}

fn default_message() -> String {
    "Resources with expiring ttl".to_string()
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            default_owner: String::new(),
            channel: None,
            max_items_per_message: default_max_items(),
            chunk_pause_ms: default_chunk_pause_ms(),
            message: default_message(),
        }
    }
}

impl NotifyConfig {
    /// Pause between chunks as Duration
    pub fn chunk_pause(&self) -> Duration {
        Duration::from_millis(self.chunk_pause_ms)
    }

    /// Check the configuration for values the notifier cannot work with
    pub fn validate(&self) -> Result<(), String> {
        if self.default_owner.trim().is_empty() {
            return Err("default_owner must be set".to_string());
        }
        if self.max_items_per_message == 0 {
            return Err("max_items_per_message must be greater than zero".to_string());
        }
        if self.channel.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err("channel must not be blank when set".to_string());
        }
        Ok(())
    }
}
