//! Owner digests

use crate::config::NotifyConfig;
use crate::digest::{chunk_digest, DigestItem, DigestSink};
use crate::error::NotifyError;
use crate::recipient::{IdentityResolver, Recipient};
use reclaim_store::CandidateStore;
use std::sync::Arc;

/// What one notify pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyReport {
    /// Owners that received at least one message
    pub owners_notified: usize,
    /// Owners skipped because they have no candidates
    pub owners_skipped: usize,
    /// Owners routed to the default recipient
    pub owners_defaulted: usize,
    /// Messages delivered
    pub messages_sent: usize,
    /// Items across all delivered messages
    pub items_sent: usize,
    /// Owner reads and deliveries that failed
    pub failures: usize,
}

/// Summarizes current candidates for each owner
pub struct Notifier {
    store: CandidateStore,
    resolver: Arc<dyn IdentityResolver>,
    sink: Arc<dyn DigestSink>,
    config: NotifyConfig,
}

impl Notifier {
    /// Create a notifier
    pub fn new(
        store: CandidateStore,
        resolver: Arc<dyn IdentityResolver>,
        sink: Arc<dyn DigestSink>,
        config: NotifyConfig,
    ) -> Self {
        Self {
            store,
            resolver,
            sink,
            config,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &NotifyConfig {
        &self.config
    }

    /// Resolve the configured default owner
    pub async fn default_recipient(&self) -> Result<Recipient, NotifyError> {
        self.resolver
            .resolve(&self.config.default_owner)
            .await?
            .ok_or_else(|| NotifyError::NoDefaultRecipient(self.config.default_owner.clone()))
    }

    async fn recipient_for(&self, owner: &str, fallback: &Recipient) -> (Recipient, bool) {
        if owner.is_empty() {
            return (fallback.clone(), true);
        }
        match self.resolver.resolve(owner).await {
            Ok(Some(recipient)) => (recipient, false),
            Ok(None) => {
                tracing::debug!(owner = %owner, "Owner not found, using default recipient");
                (fallback.clone(), true)
            }
            Err(e) => {
                tracing::warn!(owner = %owner, error = %e, "Owner lookup failed, using default recipient");
                (fallback.clone(), true)
            }
        }
    }

    /// Send one digest per owner with candidates
    ///
    /// Fails only when the owner list cannot be read or the default owner
    /// does not resolve. Per-owner failures are logged and counted.
    pub async fn notify(&self) -> Result<NotifyReport, NotifyError> {
        let fallback = self.default_recipient().await?;
        let owners = self.store.list_owners()?;
        let mut report = NotifyReport::default();

        tracing::info!("Notifying {} owners", owners.len());

        for owner in owners {
            let candidates = match self.store.list_candidates(&owner) {
                Ok(candidates) => candidates,
                Err(e) => {
                    tracing::error!(owner = %owner, error = %e, "Failed to read candidates");
                    report.failures += 1;
                    continue;
                }
            };
            if candidates.is_empty() {
                report.owners_skipped += 1;
                continue;
            }

            let (recipient, defaulted) = self.recipient_for(&owner, &fallback).await;
            if defaulted {
                report.owners_defaulted += 1;
            }

            let destination = match &self.config.channel {
                Some(channel) if recipient == fallback => channel.clone(),
                _ => recipient.id.clone(),
            };

            let items: Vec<DigestItem> = candidates.iter().map(DigestItem::from).collect();
            let messages = chunk_digest(
                &self.config.message,
                items,
                self.config.max_items_per_message,
            );

            let mut delivered_any = false;
            for (index, message) in messages.iter().enumerate() {
                if index > 0 {
                    tokio::time::sleep(self.config.chunk_pause()).await;
                }
                match self.sink.deliver(&destination, message).await {
                    Ok(()) => {
                        delivered_any = true;
                        report.messages_sent += 1;
                        report.items_sent += message.items.len();
                    }
                    Err(e) => {
                        tracing::error!(
                            owner = %owner,
                            destination = %destination,
                            error = %e,
                            "Failed to deliver digest"
                        );
                        report.failures += 1;
                    }
                }
            }
            if delivered_any {
                report.owners_notified += 1;
            }
        }

        tracing::info!(
            "Notify complete: {} owners notified, {} messages, {} failures",
            report.owners_notified,
            report.messages_sent,
            report.failures
        );
        Ok(report)
    }
}
