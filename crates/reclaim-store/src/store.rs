//! Candidate records and the lease protocol

use crate::cache::CandidateCache;
use crate::error::StoreError;
use crate::record;
use reclaim_domain::MarkedCandidate;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Set of every owner ever observed
pub const OWNERS_KEY: &str = "reclaim:owners";

/// Grace period applied when none is configured
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Key of an owner's candidate set
pub fn candidates_key(owner: &str) -> String {
    format!("reclaim:candidates:{}", owner)
}

/// Key of a resource's lease timer
pub fn lease_key(id: &str) -> String {
    format!("reclaim:timers:{}", id)
}

/// Outcome of [`CandidateStore::record_candidate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// An identical record already existed; nothing changed
    Duplicate,
    /// The record was added
    Recorded {
        /// Whether a new lease timer was started; `false` means an earlier
        /// live lease for the same id was kept as-is
        lease_created: bool,
    },
}

/// Candidate records and leases over a shared cache
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct CandidateStore {
    cache: Arc<dyn CandidateCache>,
    grace_period: Duration,
}

impl std::fmt::Debug for CandidateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateStore")
            .field("grace_period", &self.grace_period)
            .finish_non_exhaustive()
    }
}

impl CandidateStore {
    /// Create a store with the default 24h grace period
    pub fn new(cache: Arc<dyn CandidateCache>) -> Self {
        Self {
            cache,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    /// Use a different grace period for new leases
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Grace period applied to new leases
    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Record a non-compliant resource under its owner
    ///
    /// A byte-identical record is a no-op. Otherwise the owner is indexed, the
    /// record added, and a lease started unless one is already live. Leases
    /// are never extended, so the grace period runs from first detection.
    pub fn record_candidate(
        &self,
        owner: &str,
        candidate: &MarkedCandidate,
    ) -> Result<RecordOutcome, StoreError> {
        let encoded = record::encode(candidate)?;
        let set_key = candidates_key(owner);

        if self.cache.is_member(&set_key, &encoded)? {
            tracing::debug!(owner = %owner, id = %candidate.id, "Candidate already recorded");
            return Ok(RecordOutcome::Duplicate);
        }

        self.cache.add(OWNERS_KEY, owner)?;
        self.cache.add(&set_key, &encoded)?;

        let expires_at = SystemTime::now() + self.grace_period;
        let lease_created =
            self.cache
                .create_with_expiry(&lease_key(&candidate.id), &candidate.id, expires_at)?;

        tracing::debug!(
            owner = %owner,
            id = %candidate.id,
            lease_created,
            "Candidate recorded"
        );
        Ok(RecordOutcome::Recorded { lease_created })
    }

    /// Remove every record under `owner` whose id is in `ids`
    ///
    /// Returns how many records were removed. Lease timers are left alone.
    /// Fails with [`StoreError::NoCandidates`] when the owner has no records.
    pub fn clear_candidates<S: AsRef<str>>(
        &self,
        owner: &str,
        ids: &[S],
    ) -> Result<usize, StoreError> {
        let set_key = candidates_key(owner);
        let members = self.cache.read_set(&set_key)?;
        if members.is_empty() {
            return Err(StoreError::NoCandidates(owner.to_string()));
        }

        let mut removed = 0;
        for member in members {
            let Ok(candidate) = record::decode(&member) else {
                continue;
            };
            if ids.iter().any(|id| id.as_ref() == candidate.id) {
                self.cache.remove(&set_key, &member)?;
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::debug!(owner = %owner, removed, "Candidates cleared");
        }
        Ok(removed)
    }

    /// Every decodable record under `owner`
    ///
    /// Malformed entries are skipped.
    pub fn list_candidates(&self, owner: &str) -> Result<Vec<MarkedCandidate>, StoreError> {
        let members = self.cache.read_set(&candidates_key(owner))?;
        let candidates = members
            .iter()
            .filter_map(|raw| match record::decode(raw) {
                Ok(candidate) => Some(candidate),
                Err(e) => {
                    tracing::debug!(owner = %owner, error = %e, "Skipping malformed record");
                    None
                }
            })
            .collect();
        Ok(candidates)
    }

    /// Whether the lease for `id` is still running
    pub fn lease_alive(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.cache.exists(&lease_key(id))?)
    }

    /// Every owner ever observed, sorted
    pub fn list_owners(&self) -> Result<Vec<String>, StoreError> {
        let mut owners = self.cache.read_set(OWNERS_KEY)?;
        owners.sort();
        Ok(owners)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCache;
    use crate::CandidateCache;
    use reclaim_domain::MarkerType;
    use std::collections::BTreeMap;

    fn candidate(id: &str, owner: &str) -> MarkedCandidate {
        MarkedCandidate {
            marker_type: MarkerType::Aws,
            candidate_type: "ebs".to_string(),
            id: id.to_string(),
            owner: owner.to_string(),
            ttl: String::new(),
            purpose: String::new(),
            account: "dev".to_string(),
            tags: BTreeMap::new(),
        }
    }

    fn store() -> (Arc<MemoryCache>, CandidateStore) {
        let cache = Arc::new(MemoryCache::new());
        let store = CandidateStore::new(cache.clone());
        (cache, store)
    }

    #[test]
    fn test_record_is_idempotent() {
        let (cache, store) = store();
        let c = candidate("vol-1", "alice");

        assert_eq!(
            store.record_candidate("alice", &c).unwrap(),
            RecordOutcome::Recorded {
                lease_created: true
            }
        );
        assert_eq!(
            store.record_candidate("alice", &c).unwrap(),
            RecordOutcome::Duplicate
        );

        assert_eq!(store.list_candidates("alice").unwrap(), vec![c]);
        assert_eq!(cache.timer_creations().unwrap(), 1);
        assert_eq!(store.list_owners().unwrap(), vec!["alice"]);
    }

    #[test]
    fn test_changed_record_keeps_existing_lease() {
        let (cache, store) = store();
        let original = candidate("vol-1", "alice");
        store.record_candidate("alice", &original).unwrap();
        let expiry = cache.expiry_of(&lease_key("vol-1")).unwrap();

        let mut retagged = original.clone();
        retagged.purpose = "renamed".to_string();
        assert_eq!(
            store.record_candidate("alice", &retagged).unwrap(),
            RecordOutcome::Recorded {
                lease_created: false
            }
        );
        assert_eq!(cache.expiry_of(&lease_key("vol-1")).unwrap(), expiry);
        assert_eq!(store.list_candidates("alice").unwrap().len(), 2);
    }

    #[test]
    fn test_lease_uses_grace_period() {
        let cache = Arc::new(MemoryCache::new());
        let store = CandidateStore::new(cache.clone()).with_grace_period(Duration::from_secs(60));
        let before = SystemTime::now();
        store.record_candidate("", &candidate("vol-1", "")).unwrap();

        let expiry = cache.expiry_of(&lease_key("vol-1")).unwrap().unwrap();
        assert!(expiry >= before + Duration::from_secs(60));
        assert!(expiry <= SystemTime::now() + Duration::from_secs(60));
    }

    #[test]
    fn test_clear_candidates() {
        let (_cache, store) = store();
        store.record_candidate("bob", &candidate("a", "bob")).unwrap();
        store.record_candidate("bob", &candidate("b", "bob")).unwrap();

        assert_eq!(store.clear_candidates("bob", &["a", "zzz"]).unwrap(), 1);
        let left: Vec<String> = store
            .list_candidates("bob")
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(left, vec!["b"]);
        assert!(store.lease_alive("a").unwrap());
    }

    #[test]
    fn test_clear_empty_owner() {
        let (_cache, store) = store();
        let err = store.clear_candidates("nobody", &["x"]).unwrap_err();
        assert!(err.is_no_candidates());
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let (cache, store) = store();
        store.record_candidate("carol", &candidate("good", "carol")).unwrap();
        cache.add(&candidates_key("carol"), "{broken").unwrap();

        let listed = store.list_candidates("carol").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "good");
        assert_eq!(store.clear_candidates("carol", &["good"]).unwrap(), 1);
    }

    #[test]
    fn test_empty_owner_set_lists_empty() {
        let (_cache, store) = store();
        assert!(store.list_candidates("ghost").unwrap().is_empty());
        assert!(store.list_owners().unwrap().is_empty());
        assert!(!store.lease_alive("nothing").unwrap());
    }
}
