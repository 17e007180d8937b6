//! Mark/Sweep behavior against an in-memory provider and cache

use async_trait::async_trait;
use reclaim_classifier::TypedFilter;
use reclaim_domain::{unix_now, Identity};
use reclaim_lifecycle::{
    AdapterHandler, CancellationToken, KindRegistry, LifecycleConfig, LifecycleController, LifecycleError, Page,
    ProviderError, ResourceAdapter,
};
use reclaim_store::{candidates_key, lease_key, CandidateCache, CandidateStore, MemoryCache, SqliteCache};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

const DAY: u64 = 86_400;

#[derive(Default)]
struct State {
    items: Vec<Identity>,
    page_size: usize,
    referenced: HashSet<String>,
    list_error: Option<ProviderError>,
    delete_errors: HashMap<String, ProviderError>,
    tokens_seen: Vec<Option<String>>,
    delete_calls: Vec<String>,
    // Cancelled once a page has been served
    cancel_on_list: Option<CancellationToken>,
    // Cancelled once a delete has been issued
    cancel_on_delete: Option<CancellationToken>,
}

/// Fake provider serving identities as raw items
#[derive(Clone)]
struct MockAdapter {
    kind: &'static str,
    state: Arc<Mutex<State>>,
}

impl MockAdapter {
    fn new(kind: &'static str, items: Vec<Identity>) -> Self {
        let state = State {
            items,
            page_size: 100,
            ..Default::default()
        };
        Self {
            kind,
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn with(&self, f: impl FnOnce(&mut State)) {
        f(&mut self.state.lock().unwrap());
    }

    fn delete_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().delete_calls.clone()
    }
}

#[async_trait]
impl ResourceAdapter for MockAdapter {
    type Item = Identity;
    type Context = HashSet<String>;

    fn kind(&self) -> &str {
        self.kind
    }

    async fn pass_context(&self) -> Result<HashSet<String>, ProviderError> {
        Ok(self.state.lock().unwrap().referenced.clone())
    }

    async fn list(&self, token: Option<String>) -> Result<Page<Identity>, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.tokens_seen.push(token.clone());
        if let Some(err) = state.list_error.clone() {
            return Err(err);
        }

        let start: usize = token.map(|t| t.parse().unwrap()).unwrap_or(0);
        let end = (start + state.page_size).min(state.items.len());
        let items = state.items[start..end].to_vec();
        if let Some(cancel) = &state.cancel_on_list {
            cancel.cancel();
        }
        if end < state.items.len() {
            Ok(Page::more(items, end.to_string()))
        } else {
            Ok(Page::last(items))
        }
    }

    fn extract_identity(&self, item: &Identity) -> Identity {
        item.clone()
    }

    async fn delete(&self, id: &str) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.delete_calls.push(id.to_string());
        if let Some(cancel) = &state.cancel_on_delete {
            cancel.cancel();
        }
        if let Some(err) = state.delete_errors.get(id) {
            return Err(err.clone());
        }
        state.items.retain(|item| item.id != id);
        Ok(())
    }
}

fn config(delete_enabled: bool) -> LifecycleConfig {
    LifecycleConfig {
        account: "sandbox".to_string(),
        kinds: vec!["ebs".to_string()],
        delete_enabled,
        ..Default::default()
    }
}

fn controller_for(
    config: &LifecycleConfig,
    cache: Arc<MemoryCache>,
    adapters: Vec<MockAdapter>,
) -> LifecycleController {
    let mut registry = KindRegistry::new();
    for adapter in adapters {
        registry.register(AdapterHandler::from_config(adapter, config).unwrap());
    }
    LifecycleController::new(config, CandidateStore::new(cache), registry).unwrap()
}

struct Harness {
    cache: Arc<MemoryCache>,
    adapter: MockAdapter,
    controller: LifecycleController,
}

impl Harness {
    fn new(delete_enabled: bool, items: Vec<Identity>) -> Self {
        let cache = Arc::new(MemoryCache::new());
        let adapter = MockAdapter::new("ebs", items);
        let controller = controller_for(&config(delete_enabled), cache.clone(), vec![adapter.clone()]);
        Self {
            cache,
            adapter,
            controller,
        }
    }

    fn candidates(&self, owner: &str) -> Vec<String> {
        self.controller
            .store()
            .list_candidates(owner)
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect()
    }

    fn lease_expiry(&self, id: &str) -> Option<SystemTime> {
        self.cache.expiry_of(&lease_key(id)).unwrap()
    }

    fn expire_leases(&self) {
        self.cache.advance(Duration::from_secs(DAY + 60)).unwrap();
    }
}

/// Owned but missing a ttl tag
fn untagged_ttl(id: &str) -> Identity {
    Identity::new(id, "ebs")
        .with_tag("owner", "alice")
        .created_at(unix_now() - DAY)
}

#[tokio::test]
async fn test_mark_is_idempotent() {
    let h = Harness::new(false, vec![untagged_ttl("vol-1")]);

    let first = h.controller.mark().await;
    let second = h.controller.mark().await;

    assert_eq!(first.pass("ebs").unwrap().recorded, 1);
    assert_eq!(second.pass("ebs").unwrap().recorded, 0);
    assert_eq!(second.pass("ebs").unwrap().duplicates, 1);
    assert_eq!(h.candidates("alice"), vec!["vol-1"]);
    assert_eq!(h.cache.timer_creations().unwrap(), 1);
}

#[tokio::test]
async fn test_redetection_keeps_lease_expiry() {
    let h = Harness::new(false, vec![untagged_ttl("vol-1")]);
    h.controller.mark().await;
    let expiry = h.lease_expiry("vol-1");
    assert!(expiry.is_some());

    // A changed record is stored again, but the lease is not restarted
    h.adapter.with(|s| s.items[0] = untagged_ttl("vol-1").with_tag("purpose", "load test"));
    let report = h.controller.mark().await;

    assert_eq!(report.pass("ebs").unwrap().recorded, 1);
    assert_eq!(h.lease_expiry("vol-1"), expiry);
    assert_eq!(h.cache.timer_creations().unwrap(), 1);
}

#[tokio::test]
async fn test_sweep_only_deletes_after_lease_expires() {
    let h = Harness::new(true, vec![untagged_ttl("vol-1")]);
    h.controller.mark().await;

    let report = h.controller.sweep().await;
    let pass = report.pass("ebs").unwrap();
    assert_eq!(pass.leased, 1);
    assert_eq!(pass.deleted, 0);
    assert!(h.adapter.delete_calls().is_empty());

    h.expire_leases();
    let report = h.controller.sweep().await;
    assert_eq!(report.pass("ebs").unwrap().deleted, 1);
    assert_eq!(h.adapter.delete_calls(), vec!["vol-1"]);
    assert!(h.candidates("alice").is_empty());
}

#[tokio::test]
async fn test_compliant_resource_is_retracted_and_lease_kept() {
    let h = Harness::new(false, vec![untagged_ttl("vol-1")]);
    h.controller.mark().await;
    let expiry = h.lease_expiry("vol-1");

    h.adapter.with(|s| s.items[0] = untagged_ttl("vol-1").with_tag("ttl", "0"));
    let report = h.controller.mark().await;

    assert_eq!(report.pass("ebs").unwrap().cleared, 1);
    assert!(h.candidates("alice").is_empty());
    assert_eq!(h.lease_expiry("vol-1"), expiry);
}

#[tokio::test]
async fn test_ignored_resource_is_retracted() {
    let cache = Arc::new(MemoryCache::new());
    let adapter = MockAdapter::new("ebs", vec![untagged_ttl("vol-1")]);
    let controller = controller_for(&config(false), cache.clone(), vec![adapter.clone()]);
    controller.mark().await;
    assert_eq!(controller.store().list_candidates("alice").unwrap().len(), 1);

    let mut ignoring = config(false);
    ignoring.ignore_ids = vec!["vol-1".to_string()];
    let controller = controller_for(&ignoring, cache, vec![adapter]);
    let report = controller.mark().await;

    assert_eq!(report.pass("ebs").unwrap().cleared, 1);
    assert!(controller.store().list_candidates("alice").unwrap().is_empty());
}

#[tokio::test]
async fn test_unlimited_ttl_is_compliant() {
    let created = unix_now() - 10 * 365 * DAY;
    let item = Identity::new("vol-1", "ebs")
        .with_tag("ttl", "0")
        .created_at(created);
    let h = Harness::new(false, vec![item]);

    let report = h.controller.mark().await;

    assert_eq!(report.pass("ebs").unwrap().recorded, 0);
    assert!(h.controller.store().list_owners().unwrap().is_empty());
    assert_eq!(h.cache.timer_creations().unwrap(), 0);
}

#[tokio::test]
async fn test_untagged_resource_recorded_with_empty_owner() {
    let h = Harness::new(false, vec![Identity::new("vol-1", "ebs")]);

    let before = SystemTime::now();
    h.controller.mark().await;
    let after = SystemTime::now();

    let candidates = h.controller.store().list_candidates("").unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].owner, "");
    assert_eq!(candidates[0].account, "sandbox");
    assert_eq!(candidates[0].candidate_type, "ebs");
    assert!(h
        .cache
        .read_set(&candidates_key(""))
        .unwrap()
        .iter()
        .any(|r| r.contains("vol-1")));

    let grace = Duration::from_secs(DAY);
    let expiry = h.lease_expiry("vol-1").unwrap();
    assert!(expiry >= before + grace);
    assert!(expiry <= after + grace);
}

#[tokio::test]
async fn test_negative_ttl_is_expired() {
    let item = Identity::new("vol-1", "ebs")
        .with_tag("ttl", "-1w")
        .with_tag("owner", "alice")
        .created_at(unix_now() - 8 * DAY);
    let h = Harness::new(false, vec![item]);

    h.controller.mark().await;

    assert_eq!(h.candidates("alice"), vec!["vol-1"]);
}

#[tokio::test]
async fn test_deletion_disabled_never_deletes() {
    let h = Harness::new(false, vec![untagged_ttl("vol-1")]);
    h.controller.mark().await;
    h.expire_leases();

    let report = h.controller.sweep().await;

    assert_eq!(report.pass("ebs").unwrap().dry_run, 1);
    assert!(h.adapter.delete_calls().is_empty());
    assert_eq!(h.candidates("alice"), vec!["vol-1"]);
}

#[tokio::test]
async fn test_throttled_delete_is_retried_next_sweep() {
    let h = Harness::new(true, vec![untagged_ttl("vol-1")]);
    h.controller.mark().await;
    h.expire_leases();
    h.adapter.with(|s| {
        s.delete_errors
            .insert("vol-1".to_string(), ProviderError::Throttled("slow down".to_string()));
    });

    let report = h.controller.sweep().await;
    assert!(report.is_clean());
    assert_eq!(report.pass("ebs").unwrap().throttled, 1);
    assert_eq!(h.candidates("alice"), vec!["vol-1"]);
    assert!(!h.controller.store().lease_alive("vol-1").unwrap());

    h.adapter.with(|s| s.delete_errors.clear());
    let report = h.controller.sweep().await;
    assert_eq!(report.pass("ebs").unwrap().deleted, 1);
    assert_eq!(h.adapter.delete_calls(), vec!["vol-1", "vol-1"]);
    assert!(h.candidates("alice").is_empty());
}

#[tokio::test]
async fn test_vanished_resource_is_retracted() {
    let h = Harness::new(true, vec![untagged_ttl("vol-1")]);
    h.controller.mark().await;
    h.expire_leases();
    h.adapter.with(|s| {
        s.delete_errors
            .insert("vol-1".to_string(), ProviderError::NotFound("vol-1".to_string()));
    });

    let report = h.controller.sweep().await;

    assert_eq!(report.pass("ebs").unwrap().vanished, 1);
    assert!(h.candidates("alice").is_empty());
}

#[tokio::test]
async fn test_failed_delete_keeps_record() {
    let h = Harness::new(true, vec![untagged_ttl("vol-1"), untagged_ttl("vol-2")]);
    h.controller.mark().await;
    h.expire_leases();
    h.adapter.with(|s| {
        s.delete_errors
            .insert("vol-1".to_string(), ProviderError::Other("in use".to_string()));
    });

    let report = h.controller.sweep().await;
    let pass = report.pass("ebs").unwrap();

    assert_eq!(pass.failures, 1);
    assert_eq!(pass.deleted, 1);
    assert_eq!(h.candidates("alice"), vec!["vol-1"]);
}

#[tokio::test]
async fn test_mark_follows_pagination() {
    let items = (1..=5).map(|i| untagged_ttl(&format!("vol-{}", i))).collect();
    let h = Harness::new(false, items);
    h.adapter.with(|s| s.page_size = 2);

    let report = h.controller.mark().await;
    let pass = report.pass("ebs").unwrap();

    assert_eq!(pass.pages, 3);
    assert_eq!(pass.recorded, 5);
    assert_eq!(
        h.adapter.state.lock().unwrap().tokens_seen,
        vec![None, Some("2".to_string()), Some("4".to_string())]
    );
}

#[tokio::test]
async fn test_throttled_listing_ends_pass_cleanly() {
    let h = Harness::new(false, vec![untagged_ttl("vol-1")]);
    h.adapter
        .with(|s| s.list_error = Some(ProviderError::Throttled("rate exceeded".to_string())));

    let report = h.controller.mark().await;

    assert!(report.is_clean());
    let pass = report.pass("ebs").unwrap();
    assert_eq!(pass.throttled, 1);
    assert_eq!(pass.pages, 0);
    assert!(h.candidates("alice").is_empty());
}

#[tokio::test]
async fn test_listing_failure_aborts_only_that_kind() {
    let cache = Arc::new(MemoryCache::new());
    let ebs = MockAdapter::new("ebs", vec![untagged_ttl("vol-1")]);
    let ec2 = MockAdapter::new("ec2", vec![untagged_ttl("i-1")]);
    ebs.with(|s| s.list_error = Some(ProviderError::Other("access denied".to_string())));

    let mut config = config(false);
    config.kinds = vec!["ebs".to_string(), "ec2".to_string()];
    let controller = controller_for(&config, cache, vec![ebs, ec2]);

    let report = controller.mark().await;

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "ebs");
    assert_eq!(report.pass("ec2").unwrap().recorded, 1);

    let metrics = controller.metrics().await;
    assert_eq!(metrics.failures.get("ebs"), Some(&1));
    assert_eq!(metrics.recorded.get("ec2"), Some(&1));
    assert_eq!(metrics.mark_count, 1);
}

#[tokio::test]
async fn test_single_kind_pass_reports_provider_error() {
    let h = Harness::new(false, vec![untagged_ttl("vol-1")]);
    h.adapter
        .with(|s| s.list_error = Some(ProviderError::Transient("timeout".to_string())));

    let err = h.controller.mark_kind("ebs").await.unwrap_err();

    assert!(matches!(err, LifecycleError::Provider { ref kind, .. } if kind == "ebs"));
    assert!(matches!(
        h.controller.sweep_kind("sg").await,
        Err(LifecycleError::UnknownKind(_))
    ));
}

#[tokio::test]
async fn test_cancelled_mark_stops_before_listing() {
    let h = Harness::new(false, vec![untagged_ttl("vol-1")]);
    h.controller.cancellation_token().cancel();

    let report = h.controller.mark().await;
    let pass = report.pass("ebs").unwrap();

    assert!(pass.cancelled);
    assert_eq!(pass.pages, 0);
    assert!(h.adapter.state.lock().unwrap().tokens_seen.is_empty());
}

#[tokio::test]
async fn test_mark_cancelled_between_pages() {
    let items = (1..=5).map(|i| untagged_ttl(&format!("vol-{}", i))).collect();
    let h = Harness::new(false, items);
    let cancel = h.controller.cancellation_token().clone();
    h.adapter.with(|s| {
        s.page_size = 2;
        s.cancel_on_list = Some(cancel);
    });

    let report = h.controller.mark().await;
    let pass = report.pass("ebs").unwrap();

    assert!(pass.cancelled);
    assert_eq!(pass.pages, 1);
    assert_eq!(pass.recorded, 2);
    assert_eq!(h.adapter.state.lock().unwrap().tokens_seen, vec![None]);
    assert_eq!(h.candidates("alice"), vec!["vol-1", "vol-2"]);
}

#[tokio::test]
async fn test_sweep_cancelled_between_candidates() {
    let h = Harness::new(
        true,
        vec![
            untagged_ttl("vol-1"),
            untagged_ttl("vol-2"),
            untagged_ttl("vol-3").with_tag("owner", "bob"),
        ],
    );
    h.controller.mark().await;
    h.expire_leases();

    let cancel = h.controller.cancellation_token().clone();
    h.adapter.with(|s| s.cancel_on_delete = Some(cancel));
    let report = h.controller.sweep().await;
    let pass = report.pass("ebs").unwrap();

    // Deletes already issued stay applied; nothing after them is touched
    assert!(pass.cancelled);
    assert_eq!(pass.deleted, 1);
    assert_eq!(h.adapter.delete_calls().len(), 1);
    assert_eq!(h.candidates("alice").len(), 1);
    assert_eq!(h.candidates("bob"), vec!["vol-3"]);
}

#[tokio::test]
async fn test_typed_filter_uses_pass_context() {
    let cache = Arc::new(MemoryCache::new());
    let adapter = MockAdapter::new("ebs", vec![untagged_ttl("vol-1"), untagged_ttl("vol-2")]);
    adapter.with(|s| {
        s.referenced.insert("vol-1".to_string());
    });

    let config = config(false);
    let handler = AdapterHandler::from_config(adapter, &config)
        .unwrap()
        .map_chain(|chain| {
            chain.with_typed_ignore(TypedFilter::new(
                "attached",
                |item: &Identity, referenced: &HashSet<String>| referenced.contains(&item.id),
            ))
        });
    let mut registry = KindRegistry::new();
    registry.register(handler);
    let controller = LifecycleController::new(&config, CandidateStore::new(cache), registry).unwrap();

    controller.mark().await;

    let ids: Vec<String> = controller
        .store()
        .list_candidates("alice")
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, vec!["vol-2"]);
}

#[tokio::test]
async fn test_sweep_leaves_other_accounts_alone() {
    let cache = Arc::new(MemoryCache::new());
    let sandbox = MockAdapter::new("ebs", vec![untagged_ttl("vol-1")]);
    let staging = MockAdapter::new("ebs", vec![untagged_ttl("vol-2")]);

    let sandbox_config = config(true);
    let mut staging_config = config(true);
    staging_config.account = "staging".to_string();

    let sandbox_ctl = controller_for(&sandbox_config, cache.clone(), vec![sandbox.clone()]);
    let staging_ctl = controller_for(&staging_config, cache.clone(), vec![staging.clone()]);

    sandbox_ctl.mark().await;
    staging_ctl.mark().await;
    cache.advance(Duration::from_secs(2 * DAY)).unwrap();

    sandbox_ctl.sweep().await;

    assert_eq!(sandbox.delete_calls(), vec!["vol-1"]);
    assert!(staging.delete_calls().is_empty());
    let remaining: Vec<String> = sandbox_ctl
        .store()
        .list_candidates("alice")
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(remaining, vec!["vol-2"]);
}

#[tokio::test]
async fn test_candidate_listed_under_two_owners_deleted_once() {
    let h = Harness::new(true, vec![untagged_ttl("vol-1")]);
    h.controller.mark().await;

    // Owner tag changed between passes: the old record is not retracted
    h.adapter.with(|s| s.items[0] = untagged_ttl("vol-1").with_tag("owner", "bob"));
    h.controller.mark().await;
    assert_eq!(h.candidates("alice"), vec!["vol-1"]);
    assert_eq!(h.candidates("bob"), vec!["vol-1"]);

    h.expire_leases();
    let report = h.controller.sweep().await;

    assert_eq!(report.pass("ebs").unwrap().deleted, 1);
    assert_eq!(h.adapter.delete_calls(), vec!["vol-1"]);
    assert!(h.candidates("alice").is_empty());
    assert!(h.candidates("bob").is_empty());
}

#[test]
fn test_unknown_kind_is_rejected() {
    let mut config = config(false);
    config.kinds = vec!["ebs".to_string(), "sg".to_string()];
    let mut registry = KindRegistry::new();
    registry.register(AdapterHandler::from_config(MockAdapter::new("ebs", vec![]), &config).unwrap());

    let result = LifecycleController::new(&config, CandidateStore::new(Arc::new(MemoryCache::new())), registry);

    assert!(matches!(result, Err(LifecycleError::UnknownKind(kind)) if kind == "sg"));
}

#[test]
fn test_invalid_grace_period_is_rejected() {
    let mut config = config(false);
    config.grace_period = "0".to_string();
    let mut registry = KindRegistry::new();
    registry.register(AdapterHandler::from_config(MockAdapter::new("ebs", vec![]), &config).unwrap());

    let result = LifecycleController::new(&config, CandidateStore::new(Arc::new(MemoryCache::new())), registry);

    assert!(matches!(result, Err(LifecycleError::Config(_))));
}

#[tokio::test]
async fn test_sqlite_backed_mark_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reclaim.db");
    let config = config(false);

    {
        let cache = Arc::new(SqliteCache::open(&path).unwrap());
        let mut registry = KindRegistry::new();
        registry.register(
            AdapterHandler::from_config(MockAdapter::new("ebs", vec![untagged_ttl("vol-1")]), &config)
                .unwrap(),
        );
        let controller = LifecycleController::new(&config, CandidateStore::new(cache), registry).unwrap();
        controller.mark().await;
    }

    let store = CandidateStore::new(Arc::new(SqliteCache::open(&path).unwrap()));
    assert_eq!(store.list_owners().unwrap(), vec!["alice"]);
    assert!(store.lease_alive("vol-1").unwrap());
}
