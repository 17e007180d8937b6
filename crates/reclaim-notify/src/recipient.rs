//! Owner resolution

use crate::error::NotifyError;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static EMAIL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .ok()
});

/// Whether an owner tag looks like an email address
pub fn looks_like_email(owner: &str) -> bool {
    EMAIL.as_ref().is_some_and(|re| re.is_match(owner))
}

/// Someone a digest can be delivered to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Delivery address understood by the sink (user id, address, ...)
    pub id: String,

    /// Short user name
    pub name: String,

    /// Email, when known
    #[serde(default)]
    pub email: Option<String>,
}

impl Recipient {
    /// Create a recipient without an email
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
        }
    }

    /// Attach an email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Maps an owner tag value to a recipient
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolve an owner; `Ok(None)` means nobody by that name or email
    async fn resolve(&self, owner: &str) -> Result<Option<Recipient>, NotifyError>;
}

/// A fixed recipient table, typically loaded from configuration
///
/// Owners shaped like an email are looked up by email first; every owner is
/// then looked up by user name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticDirectory {
    #[serde(default)]
    recipients: Vec<Recipient>,
}

impl StaticDirectory {
    /// Create a directory from a list of recipients
    pub fn new(recipients: Vec<Recipient>) -> Self {
        Self { recipients }
    }

    /// Number of known recipients
    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    /// Whether the directory is empty
    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    fn find(&self, owner: &str) -> Option<&Recipient> {
        let by_email = looks_like_email(owner)
            .then(|| {
                self.recipients
                    .iter()
                    .find(|r| r.email.as_deref() == Some(owner))
            })
            .flatten();
        by_email.or_else(|| self.recipients.iter().find(|r| r.name == owner))
    }
}

#[async_trait]
impl IdentityResolver for StaticDirectory {
    async fn resolve(&self, owner: &str) -> Result<Option<Recipient>, NotifyError> {
        Ok(self.find(owner).cloned())
    }
}
