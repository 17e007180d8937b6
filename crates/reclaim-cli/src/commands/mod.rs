//! Command implementations.

pub mod candidates;
pub mod check;
pub mod notify;
pub mod owners;
pub mod release;

pub use self::candidates::execute_candidates;
pub use self::check::execute_check;
pub use self::notify::execute_notify;
pub use self::owners::execute_owners;
pub use self::release::execute_release;

use crate::error::Result;
use reclaim_store::{CandidateStore, SqliteCache};
use std::path::Path;
use std::sync::Arc;

/// Open the candidate store backed by a SQLite file.
pub fn open_store(path: &Path) -> Result<CandidateStore> {
    tracing::debug!("Opening candidate database {}", path.display());
    Ok(CandidateStore::new(Arc::new(SqliteCache::open(path)?)))
}
