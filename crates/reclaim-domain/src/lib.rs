//! Reclaim Domain Layer
//!
//! Core vocabulary shared by every crate in the workspace. It depends only on
//! `uuid` and `thiserror` and defines the value objects that flow between
//! resource adapters, the classifier, the candidate store and the lifecycle
//! controller.
//!
//! ## Key Concepts
//!
//! - **Identity**: a normalized, per-pass snapshot of one provider resource
//! - **MarkedCandidate**: the persisted record of a non-compliant resource
//! - **Disposition**: the classifier's verdict (ignore, compliant, non-compliant)
//! - **Span**: signed durations in the `1w2d3h` grammar used by ttl tags and grace periods
//! - **Owner**: taken from a tag; the empty string is the unknown/default owner

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod candidate;
pub mod disposition;
pub mod identity;
pub mod pass;
pub mod span;

// Re-exports for convenience
pub use candidate::{MarkedCandidate, MarkerType};
pub use disposition::Disposition;
pub use identity::{Identity, TagKeys};
pub use pass::PassId;
pub use span::{parse_span, Span, SpanError, UNLIMITED_TTL};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current timestamp in seconds since Unix epoch
///
/// A clock set before the epoch reads as zero.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
