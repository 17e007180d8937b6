//! Mark and Sweep for a single kind
//!
//! [`AdapterHandler`] pairs a [`ResourceAdapter`] with its [`FilterChain`]
//! and implements both halves of the lifecycle against a [`PassScope`].

use crate::adapter::ResourceAdapter;
use crate::cancel::CancellationToken;
use crate::config::LifecycleConfig;
use crate::error::{ConfigError, LifecycleError, ProviderError};
use crate::report::{PassReport, Phase};
use async_trait::async_trait;
use reclaim_classifier::{FilterChain, Subject};
use reclaim_domain::{unix_now, Disposition, MarkedCandidate, MarkerType, PassId, TagKeys};
use reclaim_store::{CandidateStore, RecordOutcome, StoreError};
use std::collections::{BTreeMap, HashMap};

/// Everything a handler needs for one pass
#[derive(Debug, Clone)]
pub struct PassScope {
    /// Identifier attached to every log line of the pass
    pub pass_id: PassId,
    /// Account or cluster being processed
    pub account: String,
    /// Provider family written into new records
    pub marker_type: MarkerType,
    /// Tag names for ttl, owner and purpose
    pub tag_keys: TagKeys,
    /// Candidate store
    pub store: CandidateStore,
    /// Whether Sweep may delete
    pub delete_enabled: bool,
    /// Checked between pages and between candidates
    pub cancel: CancellationToken,
    /// Extra tags written into new records
    pub context_tags: BTreeMap<String, String>,
}

/// The Mark/Sweep pair registered for one kind
#[async_trait]
pub trait KindHandler: Send + Sync {
    /// Kind tag handled
    fn kind(&self) -> &str;

    /// List, classify and record
    async fn mark(&self, scope: &PassScope) -> Result<PassReport, LifecycleError>;

    /// Delete candidates whose lease has expired
    async fn sweep(&self, scope: &PassScope) -> Result<PassReport, LifecycleError>;
}

/// A [`KindHandler`] driven by a resource adapter and a filter chain
pub struct AdapterHandler<A: ResourceAdapter> {
    adapter: A,
    chain: FilterChain<A::Item, A::Context>,
}

impl<A: ResourceAdapter> AdapterHandler<A> {
    /// Pair an adapter with an explicit chain
    pub fn new(adapter: A, chain: FilterChain<A::Item, A::Context>) -> Self {
        Self { adapter, chain }
    }

    /// Standard compliance checks plus the account's configured ignore rules
    pub fn from_config(adapter: A, config: &LifecycleConfig) -> Result<Self, ConfigError> {
        let chain = FilterChain::standard(&config.tag_keys()).with_ignores(config.ignore_filters()?);
        Ok(Self::new(adapter, chain))
    }

    /// Extend the chain, typically with typed filters
    pub fn map_chain<F>(mut self, f: F) -> Self
    where
        F: FnOnce(FilterChain<A::Item, A::Context>) -> FilterChain<A::Item, A::Context>,
    {
        self.chain = f(self.chain);
        self
    }

    /// Get the adapter
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    fn mark_item(
        &self,
        scope: &PassScope,
        context: &A::Context,
        item: &A::Item,
        now: u64,
        report: &mut PassReport,
    ) -> Result<(), LifecycleError> {
        let kind = self.adapter.kind();
        let identity = self.adapter.extract_identity(item);
        let owner = identity.owner(&scope.tag_keys);
        let verdict = self
            .chain
            .evaluate(&Subject::new(&identity, item, context, now));

        match verdict.disposition {
            Disposition::Ignore | Disposition::Compliant => {
                if verdict.disposition == Disposition::Ignore {
                    tracing::debug!(
                        pass_id = %scope.pass_id,
                        account = %scope.account,
                        kind = %kind,
                        id = %identity.id,
                        filter = verdict.matched.unwrap_or_default(),
                        "Ignoring resource"
                    );
                }
                match scope.store.clear_candidates(owner, &[identity.id.as_str()]) {
                    Ok(removed) => report.cleared += removed,
                    Err(e) if e.is_no_candidates() => {}
                    Err(e) => {
                        tracing::error!(
                            pass_id = %scope.pass_id,
                            account = %scope.account,
                            kind = %kind,
                            owner = %owner,
                            id = %identity.id,
                            error = %e,
                            "Failed to retract candidate"
                        );
                        report.failures += 1;
                    }
                }
            }
            Disposition::NonCompliant => {
                let candidate = MarkedCandidate::from_identity(
                    &identity,
                    kind,
                    scope.marker_type,
                    &scope.account,
                    &scope.tag_keys,
                    &scope.context_tags,
                );
                match scope.store.record_candidate(owner, &candidate) {
                    Ok(RecordOutcome::Duplicate) => report.duplicates += 1,
                    Ok(RecordOutcome::Recorded { lease_created }) => {
                        tracing::info!(
                            pass_id = %scope.pass_id,
                            account = %scope.account,
                            kind = %kind,
                            owner = %owner,
                            id = %identity.id,
                            lease_created,
                            "New candidate: {}",
                            verdict.matched.unwrap_or_default()
                        );
                        report.recorded += 1;
                    }
                    Err(StoreError::Unavailable(e)) => {
                        return Err(StoreError::Unavailable(e).into());
                    }
                    Err(e) => {
                        tracing::error!(
                            pass_id = %scope.pass_id,
                            account = %scope.account,
                            kind = %kind,
                            owner = %owner,
                            id = %identity.id,
                            error = %e,
                            "Failed to record candidate"
                        );
                        report.failures += 1;
                    }
                }
            }
        }
        Ok(())
    }

    fn retract(&self, scope: &PassScope, owner: &str, id: &str, report: &mut PassReport) {
        match scope.store.clear_candidates(owner, &[id]) {
            Ok(_) => {}
            Err(e) if e.is_no_candidates() => {}
            Err(e) => {
                tracing::error!(
                    pass_id = %scope.pass_id,
                    account = %scope.account,
                    kind = %self.adapter.kind(),
                    owner = %owner,
                    id = %id,
                    error = %e,
                    "Failed to retract deleted candidate"
                );
                report.failures += 1;
            }
        }
    }
}

#[async_trait]
impl<A> KindHandler for AdapterHandler<A>
where
    A: ResourceAdapter,
{
    fn kind(&self) -> &str {
        self.adapter.kind()
    }

    async fn mark(&self, scope: &PassScope) -> Result<PassReport, LifecycleError> {
        let kind = self.adapter.kind();
        let mut report = PassReport::new(kind, Phase::Mark);

        let context = match self.adapter.pass_context().await {
            Ok(context) => context,
            Err(ProviderError::Throttled(msg)) => {
                tracing::warn!(pass_id = %scope.pass_id, account = %scope.account, kind = %kind, "Throttled: {}", msg);
                report.throttled += 1;
                return Ok(report);
            }
            Err(e) => return Err(LifecycleError::provider(kind, e)),
        };

        let mut token: Option<String> = None;
        loop {
            if scope.cancel.is_cancelled() {
                tracing::info!(pass_id = %scope.pass_id, account = %scope.account, kind = %kind, "Mark cancelled");
                report.cancelled = true;
                break;
            }

            let page = match self.adapter.list(token.take()).await {
                Ok(page) => page,
                Err(ProviderError::Throttled(msg)) => {
                    tracing::warn!(pass_id = %scope.pass_id, account = %scope.account, kind = %kind, "Throttled: {}", msg);
                    report.throttled += 1;
                    break;
                }
                Err(e) => return Err(LifecycleError::provider(kind, e)),
            };
            report.pages += 1;

            let now = unix_now();
            for item in &page.items {
                self.mark_item(scope, &context, item, now, &mut report)?;
            }

            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        Ok(report)
    }

    async fn sweep(&self, scope: &PassScope) -> Result<PassReport, LifecycleError> {
        let kind = self.adapter.kind();
        let mut report = PassReport::new(kind, Phase::Sweep);
        // id -> whether the resource is gone
        let mut handled: HashMap<String, bool> = HashMap::new();

        'owners: for owner in scope.store.list_owners()? {
            if scope.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let candidates = scope.store.list_candidates(&owner)?;
            for candidate in candidates
                .iter()
                .filter(|c| c.belongs_to(&scope.account, kind))
            {
                if scope.cancel.is_cancelled() {
                    report.cancelled = true;
                    break 'owners;
                }

                let id = candidate.id.as_str();
                if let Some(&gone) = handled.get(id) {
                    if gone {
                        self.retract(scope, &owner, id, &mut report);
                    }
                    continue;
                }

                if scope.store.lease_alive(id)? {
                    report.leased += 1;
                    handled.insert(id.to_string(), false);
                    continue;
                }

                if !scope.delete_enabled {
                    tracing::warn!(
                        pass_id = %scope.pass_id,
                        account = %scope.account,
                        kind = %kind,
                        owner = %owner,
                        id = %id,
                        "Would have deleted {} but deletion is disabled",
                        id
                    );
                    report.dry_run += 1;
                    handled.insert(id.to_string(), false);
                    continue;
                }

                let gone = match self.adapter.delete(id).await {
                    Ok(()) => {
                        tracing::info!(pass_id = %scope.pass_id, account = %scope.account, kind = %kind, owner = %owner, id = %id, "Deleted");
                        report.deleted += 1;
                        true
                    }
                    Err(ProviderError::NotFound(_)) => {
                        tracing::info!(pass_id = %scope.pass_id, account = %scope.account, kind = %kind, owner = %owner, id = %id, "Already gone");
                        report.vanished += 1;
                        true
                    }
                    Err(ProviderError::Throttled(msg)) => {
                        tracing::warn!(pass_id = %scope.pass_id, account = %scope.account, kind = %kind, id = %id, "Throttled: {}", msg);
                        report.throttled += 1;
                        false
                    }
                    Err(e) => {
                        tracing::error!(pass_id = %scope.pass_id, account = %scope.account, kind = %kind, id = %id, error = %e, "Delete failed");
                        report.failures += 1;
                        false
                    }
                };

                if gone {
                    self.retract(scope, &owner, id, &mut report);
                }
                handled.insert(id.to_string(), gone);
            }
        }

        if report.cancelled {
            tracing::info!(pass_id = %scope.pass_id, account = %scope.account, kind = %kind, "Sweep cancelled");
        }
        Ok(report)
    }
}
