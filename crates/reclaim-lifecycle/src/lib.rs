//! Reclaim Lifecycle
//!
//! Mark/Sweep state machine for idle and untagged resources.
//!
//! ## Lifecycle
//!
//! - **Mark** lists every resource of a kind, classifies it with the kind's
//!   filter chain and records non-compliant ones in the candidate store. The
//!   first record for an id starts a lease that expires after the grace
//!   period. Compliant and ignored resources have their records retracted.
//! - **Sweep** walks every owner's candidates and deletes the ones whose
//!   lease has expired, unless deletion is disabled.
//!
//! Handlers are looked up by kind in a [`KindRegistry`]. Most kinds are
//! served by an [`AdapterHandler`] wrapping a [`ResourceAdapter`]; a kind
//! with special needs can implement [`KindHandler`] directly.
//!
//! Provider rate limits end the affected pass early without error. Any
//! other listing failure aborts only that kind; sibling kinds still run.
//! Per-item failures are logged and skipped.

#![warn(missing_docs)]

mod adapter;
mod cancel;
mod config;
mod controller;
mod error;
mod handler;
mod metrics;
mod registry;
mod report;
mod worker;

pub use adapter::{Page, ResourceAdapter};
pub use cancel::CancellationToken;
pub use config::{
    LifecycleConfig, ReclaimConfig, TagKeyConfig, MAX_INTERVAL_MINUTES, PROTECTED_NAMESPACES,
};
pub use controller::LifecycleController;
pub use error::{ConfigError, LifecycleError, ProviderError};
pub use handler::{AdapterHandler, KindHandler, PassScope};
pub use metrics::LifecycleMetrics;
pub use registry::KindRegistry;
pub use report::{CycleReport, PassReport, Phase};
pub use worker::{LifecycleWorker, Schedule};
