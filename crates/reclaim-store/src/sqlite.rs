//! SQLite implementation of the cache contract

use crate::cache::{CacheError, CandidateCache};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

fn epoch_millis(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// A [`CandidateCache`] persisted in a SQLite database
///
/// Expired timer rows are purged lazily whenever a timer is created; until
/// then they are ignored by every read.
///
/// # Examples
///
/// ```
/// use reclaim_store::{CandidateCache, SqliteCache};
///
/// let cache = SqliteCache::open(":memory:").unwrap();
/// cache.add("reclaim:owners", "alice").unwrap();
/// assert!(cache.is_member("reclaim:owners", "alice").unwrap());
/// ```
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Open (or create) the database at `path`
    ///
    /// Use `:memory:` for a private in-memory database.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn.lock().map_err(|_| CacheError::Poisoned)
    }

    /// Expiry of a live timer
    pub fn expiry_of(&self, key: &str) -> Result<Option<SystemTime>, CacheError> {
        let conn = self.conn()?;
        let millis: Option<i64> = conn
            .query_row(
                "SELECT expires_at FROM timers WHERE key = ?1 AND expires_at > ?2",
                params![key, epoch_millis(SystemTime::now())],
                |row| row.get(0),
            )
            .optional()?;
        Ok(millis.map(|m| UNIX_EPOCH + std::time::Duration::from_millis(m.max(0) as u64)))
    }
}

impl CandidateCache for SqliteCache {
    fn add(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.conn()?.execute(
            "INSERT OR IGNORE INTO set_members (set_key, member) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn read_set(&self, key: &str) -> Result<Vec<String>, CacheError> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT member FROM set_members WHERE set_key = ?1 ORDER BY member")?;
        let members = stmt
            .query_map(params![key], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(members)
    }

    fn is_member(&self, key: &str, value: &str) -> Result<bool, CacheError> {
        let found = self
            .conn()?
            .query_row(
                "SELECT 1 FROM set_members WHERE set_key = ?1 AND member = ?2",
                params![key, value],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(found)
    }

    fn remove(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.conn()?.execute(
            "DELETE FROM set_members WHERE set_key = ?1 AND member = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    fn create_with_expiry(
        &self,
        key: &str,
        value: &str,
        expires_at: SystemTime,
    ) -> Result<bool, CacheError> {
        let now = epoch_millis(SystemTime::now());
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM timers WHERE expires_at <= ?1", params![now])?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO timers (key, value, expires_at) VALUES (?1, ?2, ?3)",
            params![key, value, epoch_millis(expires_at)],
        )?;
        tx.commit()?;
        Ok(inserted == 1)
    }

    fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let found = self
            .conn()?
            .query_row(
                "SELECT 1 FROM timers WHERE key = ?1 AND expires_at > ?2",
                params![key, epoch_millis(SystemTime::now())],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(found)
    }
}
