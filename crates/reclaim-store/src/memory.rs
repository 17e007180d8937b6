//! In-process cache, for tests and single-binary deployments

use crate::cache::{CacheError, CandidateCache};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

#[derive(Default)]
struct Inner {
    sets: HashMap<String, BTreeSet<String>>,
    timers: HashMap<String, (String, SystemTime)>,
    skew: Duration,
    timer_creations: usize,
}

impl Inner {
    fn now(&self) -> SystemTime {
        SystemTime::now() + self.skew
    }

    fn live_timer(&self, key: &str) -> Option<&(String, SystemTime)> {
        let now = self.now();
        self.timers.get(key).filter(|(_, expires_at)| *expires_at > now)
    }
}

/// A [`CandidateCache`] held in memory
///
/// Expired timers behave as absent the moment their deadline passes. The
/// cache's clock can be moved forward with [`MemoryCache::advance`] so tests
/// can expire leases without sleeping.
#[derive(Default)]
pub struct MemoryCache {
    inner: Mutex<Inner>,
}

impl MemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, CacheError> {
        self.inner.lock().map_err(|_| CacheError::Poisoned)
    }

    /// Move this cache's clock forward
    pub fn advance(&self, by: Duration) -> Result<(), CacheError> {
        let mut inner = self.lock()?;
        inner.skew += by;
        Ok(())
    }

    /// Expiry of a live timer
    pub fn expiry_of(&self, key: &str) -> Result<Option<SystemTime>, CacheError> {
        let inner = self.lock()?;
        Ok(inner.live_timer(key).map(|(_, expires_at)| *expires_at))
    }

    /// How many timers have been created since startup
    pub fn timer_creations(&self) -> Result<usize, CacheError> {
        Ok(self.lock()?.timer_creations)
    }
}

impl CandidateCache for MemoryCache {
    fn add(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut inner = self.lock()?;
        inner
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(value.to_string());
        Ok(())
    }

    fn read_set(&self, key: &str) -> Result<Vec<String>, CacheError> {
        let inner = self.lock()?;
        Ok(inner
            .sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn is_member(&self, key: &str, value: &str) -> Result<bool, CacheError> {
        let inner = self.lock()?;
        Ok(inner.sets.get(key).is_some_and(|set| set.contains(value)))
    }

    fn remove(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut inner = self.lock()?;
        if let Some(set) = inner.sets.get_mut(key) {
            set.remove(value);
            if set.is_empty() {
                inner.sets.remove(key);
            }
        }
        Ok(())
    }

    fn create_with_expiry(
        &self,
        key: &str,
        value: &str,
        expires_at: SystemTime,
    ) -> Result<bool, CacheError> {
        let mut inner = self.lock()?;
        if inner.live_timer(key).is_some() {
            return Ok(false);
        }
        inner
            .timers
            .insert(key.to_string(), (value.to_string(), expires_at));
        inner.timer_creations += 1;
        Ok(true)
    }

    fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let inner = self.lock()?;
        Ok(inner.live_timer(key).is_some())
    }
}
