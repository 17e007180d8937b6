//! Pass module - identifiers for individual Mark/Sweep/Notify runs

use std::fmt;

/// Unique identifier for one pass, based on UUIDv7
///
/// Attached to every log line a pass emits so interleaved runs from different
/// accounts can be told apart. UUIDv7 sorts chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PassId(u128);

impl PassId {
    /// Generate a new UUIDv7-based PassId
    ///
    /// # Examples
    ///
    /// ```
    /// use reclaim_domain::PassId;
    ///
    /// let id = PassId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a PassId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Milliseconds since Unix epoch at which the pass started
    pub fn started_at_millis(&self) -> u64 {
        // UUIDv7: top 48 bits are Unix millisecond timestamp
        (self.0 >> 80) as u64
    }
}

impl Default for PassId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}
