//! Reclaim Candidate Store
//!
//! Persists deletion candidates and their lease timers on top of a minimal
//! cache contract ([`CandidateCache`]).
//!
//! # Layout
//!
//! | Key | Shape | Contents |
//! |-----|-------|----------|
//! | `reclaim:owners` | set | every owner ever observed |
//! | `reclaim:candidates:{owner}` | set | serialized [`MarkedCandidate`] records |
//! | `reclaim:timers:{id}` | expiring key | lease for one resource id |
//!
//! A record's serialized bytes are its identity inside the owner's set, so
//! the wire codec in [`record`] must be deterministic.
//!
//! # Examples
//!
//! ```
//! use reclaim_domain::{Identity, MarkedCandidate, MarkerType, TagKeys};
//! use reclaim_store::{CandidateStore, MemoryCache, RecordOutcome};
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! let store = CandidateStore::new(Arc::new(MemoryCache::new()));
//! let identity = Identity::new("vol-1", "ebs");
//! let candidate = MarkedCandidate::from_identity(
//!     &identity, "ebs", MarkerType::Aws, "dev", &TagKeys::default(), &BTreeMap::new(),
//! );
//!
//! let first = store.record_candidate("", &candidate).unwrap();
//! assert_eq!(first, RecordOutcome::Recorded { lease_created: true });
//! assert_eq!(store.record_candidate("", &candidate).unwrap(), RecordOutcome::Duplicate);
//! assert!(store.lease_alive("vol-1").unwrap());
//! ```

#![warn(missing_docs)]

mod cache;
mod error;
mod memory;
pub mod record;
mod sqlite;
mod store;

pub use cache::{CacheError, CandidateCache};
pub use error::StoreError;
pub use memory::MemoryCache;
pub use sqlite::SqliteCache;
pub use store::{
    candidates_key, lease_key, CandidateStore, RecordOutcome, DEFAULT_GRACE_PERIOD, OWNERS_KEY,
};

pub use reclaim_domain::MarkedCandidate;
