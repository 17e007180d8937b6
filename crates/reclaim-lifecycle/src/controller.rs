//! The per-account lifecycle controller

use crate::cancel::CancellationToken;
use crate::config::LifecycleConfig;
use crate::error::{ConfigError, LifecycleError};
use crate::handler::{KindHandler, PassScope};
use crate::metrics::LifecycleMetrics;
use crate::registry::KindRegistry;
use crate::report::{CycleReport, PassReport, Phase};
use reclaim_domain::{MarkerType, PassId, TagKeys};
use reclaim_store::CandidateStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Runs Mark and Sweep for one account or cluster
///
/// Mark and Sweep on the same controller never overlap; separate controllers
/// (other accounts) run independently and may share one store.
///
/// # Examples
///
/// ```no_run
/// use reclaim_lifecycle::{KindRegistry, LifecycleConfig, LifecycleController};
/// use reclaim_store::{CandidateStore, SqliteCache};
/// use std::sync::Arc;
///
/// # async fn run(registry: KindRegistry) -> Result<(), Box<dyn std::error::Error>> {
/// let config = LifecycleConfig::from_file("sandbox.toml")?;
/// let store = CandidateStore::new(Arc::new(SqliteCache::open("reclaim.db")?));
/// let controller = LifecycleController::new(&config, store, registry)?;
///
/// let marked = controller.mark().await;
/// let swept = controller.sweep().await;
/// println!("{} kinds marked, {} swept", marked.passes.len(), swept.passes.len());
/// # Ok(())
/// # }
/// ```
pub struct LifecycleController {
    account: String,
    marker_type: MarkerType,
    kinds: Vec<String>,
    tag_keys: TagKeys,
    delete_enabled: bool,
    context_tags: BTreeMap<String, String>,
    store: CandidateStore,
    registry: KindRegistry,
    cancel: CancellationToken,
    lock: Mutex<()>,
    metrics: Mutex<LifecycleMetrics>,
}

impl LifecycleController {
    /// Build a controller for one account
    ///
    /// The store's grace period is set from the configuration. Every
    /// configured kind must have a registered handler.
    pub fn new(
        config: &LifecycleConfig,
        store: CandidateStore,
        registry: KindRegistry,
    ) -> Result<Self, LifecycleError> {
        config.validate().map_err(ConfigError::Invalid)?;
        let grace_period = config.grace_period()?;

        if let Some(missing) = config.kinds.iter().find(|k| !registry.contains(k)) {
            return Err(LifecycleError::UnknownKind(missing.clone()));
        }

        Ok(Self {
            account: config.account.clone(),
            marker_type: config.marker_type()?,
            kinds: config.kinds.clone(),
            tag_keys: config.tag_keys(),
            delete_enabled: config.delete_enabled,
            context_tags: config.context_tags.clone(),
            store: store.with_grace_period(grace_period),
            registry,
            cancel: CancellationToken::new(),
            lock: Mutex::new(()),
            metrics: Mutex::new(LifecycleMetrics::new()),
        })
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that aborts in-flight passes between pages
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Account or cluster name
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Configured kinds, in processing order
    pub fn kinds(&self) -> &[String] {
        &self.kinds
    }

    /// Candidate store shared with this controller
    pub fn store(&self) -> &CandidateStore {
        &self.store
    }

    /// Snapshot of the accumulated metrics
    pub async fn metrics(&self) -> LifecycleMetrics {
        self.metrics.lock().await.clone()
    }

    /// Reset metrics counters
    pub async fn reset_metrics(&self) {
        self.metrics.lock().await.reset();
    }

    fn scope(&self, pass_id: PassId) -> PassScope {
        PassScope {
            pass_id,
            account: self.account.clone(),
            marker_type: self.marker_type,
            tag_keys: self.tag_keys.clone(),
            store: self.store.clone(),
            delete_enabled: self.delete_enabled,
            cancel: self.cancel.clone(),
            context_tags: self.context_tags.clone(),
        }
    }

    fn handler(&self, kind: &str) -> Result<Arc<dyn KindHandler>, LifecycleError> {
        self.registry
            .get(kind)
            .cloned()
            .ok_or_else(|| LifecycleError::UnknownKind(kind.to_string()))
    }

    async fn run_kind(
        &self,
        phase: Phase,
        kind: &str,
        scope: &PassScope,
    ) -> Result<PassReport, LifecycleError> {
        let handler = self.handler(kind)?;
        let result = match phase {
            Phase::Mark => handler.mark(scope).await,
            Phase::Sweep => handler.sweep(scope).await,
        };

        let mut metrics = self.metrics.lock().await;
        match &result {
            Ok(report) => {
                tracing::info!(
                    pass_id = %scope.pass_id,
                    account = %self.account,
                    kind = %kind,
                    "{} complete: {} recorded, {} cleared, {} deleted, {} dry-run, {} failures",
                    phase,
                    report.recorded,
                    report.cleared,
                    report.deleted + report.vanished,
                    report.dry_run,
                    report.failures
                );
                metrics.record_pass(report);
            }
            Err(e) => {
                tracing::error!(
                    pass_id = %scope.pass_id,
                    account = %self.account,
                    kind = %kind,
                    error = %e,
                    "{} aborted",
                    phase
                );
                metrics.record_abort(kind);
            }
        }
        result
    }

    async fn run_phase(&self, phase: Phase) -> CycleReport {
        let _guard = self.lock.lock().await;
        let start = Instant::now();
        let pass_id = PassId::new();
        let scope = self.scope(pass_id);
        let mut cycle = CycleReport::new(pass_id, phase);

        tracing::debug!(pass_id = %pass_id, account = %self.account, "Starting {} run", phase);

        for kind in &self.kinds {
            match self.run_kind(phase, kind, &scope).await {
                Ok(report) => cycle.passes.push(report),
                Err(e) => cycle.failed.push((kind.clone(), e.to_string())),
            }
        }

        let mut metrics = self.metrics.lock().await;
        metrics.record_cycle(phase);
        metrics.total_runtime_secs += start.elapsed().as_secs();
        cycle
    }

    /// Mark every configured kind
    ///
    /// A kind whose pass aborts is reported in [`CycleReport::failed`]; the
    /// remaining kinds still run.
    pub async fn mark(&self) -> CycleReport {
        self.run_phase(Phase::Mark).await
    }

    /// Sweep every configured kind
    pub async fn sweep(&self) -> CycleReport {
        self.run_phase(Phase::Sweep).await
    }

    /// Mark a single kind
    pub async fn mark_kind(&self, kind: &str) -> Result<PassReport, LifecycleError> {
        let _guard = self.lock.lock().await;
        let scope = self.scope(PassId::new());
        self.run_kind(Phase::Mark, kind, &scope).await
    }

    /// Sweep a single kind
    pub async fn sweep_kind(&self, kind: &str) -> Result<PassReport, LifecycleError> {
        let _guard = self.lock.lock().await;
        let scope = self.scope(PassId::new());
        self.run_kind(Phase::Sweep, kind, &scope).await
    }
}
