//! Reclaim Classifier
//!
//! Decides whether a listed resource is ignored, compliant, or a deletion
//! candidate.
//!
//! A [`FilterChain`] holds four ordered phases:
//!
//! | Phase | Filter type | Match means |
//! |-------|-------------|-------------|
//! | ignore | [`IdentityFilter`] | [`Disposition::Ignore`] |
//! | typed ignore | [`TypedFilter`] | [`Disposition::Ignore`] |
//! | compliance | [`IdentityFilter`] | [`Disposition::NonCompliant`] |
//! | typed compliance | [`TypedFilter`] | [`Disposition::NonCompliant`] |
//!
//! The first phase with a match decides; nothing matching means
//! [`Disposition::Compliant`]. Identity filters only see the normalized
//! [`Identity`] and are portable across kinds. Typed filters see the raw
//! provider object plus a pass-scoped context value (for example the set of
//! ids currently referenced by other resources) computed once per pass.
//!
//! # Examples
//!
//! ```
//! use reclaim_classifier::{FilterChain, IdentityFilter, Subject};
//! use reclaim_domain::{Disposition, Identity, TagKeys};
//!
//! let chain: FilterChain<(), ()> = FilterChain::standard(&TagKeys::default())
//!     .with_ignore(IdentityFilter::IgnoreTagKeyPrefix("kubernetes.io".to_string()));
//!
//! let now = 1_700_000_000;
//! let untagged = Identity::new("vol-1", "ebs").created_at(now - 60);
//! assert_eq!(
//!     chain.classify(&Subject::new(&untagged, &(), &(), now)),
//!     Disposition::NonCompliant,
//! );
//!
//! let forever = Identity::new("vol-2", "ebs").with_tag("ttl", "0").created_at(0);
//! assert_eq!(
//!     chain.classify(&Subject::new(&forever, &(), &(), now)),
//!     Disposition::Compliant,
//! );
//! ```

#![warn(missing_docs)]

mod chain;
mod error;
mod filter;
mod rule;

pub use chain::{classify, evaluate, FilterChain, Subject, Verdict};
pub use error::ClassifierError;
pub use filter::{ttl_expired, IdentityFilter, TypedFilter};
pub use rule::{IdPatterns, TagRule, TagRuleConfig};

pub use reclaim_domain::{Disposition, Identity};
