//! Filter chains and the classification algorithm

use crate::filter::{IdentityFilter, TypedFilter};
use reclaim_domain::{Disposition, Identity, TagKeys};

/// Everything one classification looks at
///
/// `context` is computed once per pass by the caller and handed in
/// explicitly; filters never hold pass state of their own.
#[derive(Debug)]
pub struct Subject<'a, R, C> {
    /// Normalized identity
    pub identity: &'a Identity,
    /// Raw provider object
    pub raw: &'a R,
    /// Pass-scoped context for typed filters
    pub context: &'a C,
    /// Evaluation time, seconds since Unix epoch
    pub now: u64,
}

impl<'a, R, C> Subject<'a, R, C> {
    /// Bundle the inputs of one classification
    pub fn new(identity: &'a Identity, raw: &'a R, context: &'a C, now: u64) -> Self {
        Self {
            identity,
            raw,
            context,
            now,
        }
    }
}

/// Classification outcome together with the filter that decided it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    /// The disposition
    pub disposition: Disposition,
    /// Name of the deciding filter, `None` for [`Disposition::Compliant`]
    pub matched: Option<&'static str>,
}

impl Verdict {
    fn decided(disposition: Disposition, filter: &'static str) -> Self {
        Self {
            disposition,
            matched: Some(filter),
        }
    }

    fn compliant() -> Self {
        Self {
            disposition: Disposition::Compliant,
            matched: None,
        }
    }
}

fn first_identity_match<R, C>(
    filters: &[IdentityFilter],
    subject: &Subject<'_, R, C>,
) -> Option<&'static str> {
    filters
        .iter()
        .find(|f| f.matches(subject.identity, subject.now))
        .map(IdentityFilter::name)
}

fn first_typed_match<R, C>(
    filters: &[TypedFilter<R, C>],
    subject: &Subject<'_, R, C>,
) -> Option<&'static str> {
    filters
        .iter()
        .find(|f| f.matches(subject.raw, subject.context))
        .map(TypedFilter::name)
}

/// Run the four phases in order and report which filter decided
pub fn evaluate<R, C>(
    subject: &Subject<'_, R, C>,
    ignore: &[IdentityFilter],
    typed_ignore: &[TypedFilter<R, C>],
    compliance: &[IdentityFilter],
    typed_compliance: &[TypedFilter<R, C>],
) -> Verdict {
    if let Some(name) = first_identity_match(ignore, subject) {
        return Verdict::decided(Disposition::Ignore, name);
    }
    if let Some(name) = first_typed_match(typed_ignore, subject) {
        return Verdict::decided(Disposition::Ignore, name);
    }
    if let Some(name) = first_identity_match(compliance, subject) {
        return Verdict::decided(Disposition::NonCompliant, name);
    }
    if let Some(name) = first_typed_match(typed_compliance, subject) {
        return Verdict::decided(Disposition::NonCompliant, name);
    }
    Verdict::compliant()
}

/// Classify a subject against explicit filter lists
pub fn classify<R, C>(
    subject: &Subject<'_, R, C>,
    ignore: &[IdentityFilter],
    typed_ignore: &[TypedFilter<R, C>],
    compliance: &[IdentityFilter],
    typed_compliance: &[TypedFilter<R, C>],
) -> Disposition {
    evaluate(subject, ignore, typed_ignore, compliance, typed_compliance).disposition
}

/// Ordered filter lists for one resource kind
///
/// `R` is the raw provider object, `C` the pass-scoped context.
pub struct FilterChain<R, C> {
    ignore: Vec<IdentityFilter>,
    typed_ignore: Vec<TypedFilter<R, C>>,
    compliance: Vec<IdentityFilter>,
    typed_compliance: Vec<TypedFilter<R, C>>,
}

impl<R, C> Clone for FilterChain<R, C> {
    fn clone(&self) -> Self {
        Self {
            ignore: self.ignore.clone(),
            typed_ignore: self.typed_ignore.clone(),
            compliance: self.compliance.clone(),
            typed_compliance: self.typed_compliance.clone(),
        }
    }
}

impl<R, C> std::fmt::Debug for FilterChain<R, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("ignore", &self.ignore)
            .field("typed_ignore", &self.typed_ignore)
            .field("compliance", &self.compliance)
            .field("typed_compliance", &self.typed_compliance)
            .finish()
    }
}

impl<R, C> Default for FilterChain<R, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, C> FilterChain<R, C> {
    /// A chain with no filters; everything classifies as compliant
    pub fn new() -> Self {
        Self {
            ignore: Vec::new(),
            typed_ignore: Vec::new(),
            compliance: Vec::new(),
            typed_compliance: Vec::new(),
        }
    }

    /// The usual compliance checks: no tags, missing ttl tag, expired ttl
    pub fn standard(keys: &TagKeys) -> Self {
        Self::new()
            .with_compliance(IdentityFilter::NoTags)
            .with_compliance(IdentityFilter::MissingTag(keys.ttl.clone()))
            .with_compliance(IdentityFilter::TagTtlExpired(keys.ttl.clone()))
    }

    /// Append an ignore filter
    pub fn with_ignore(mut self, filter: IdentityFilter) -> Self {
        self.ignore.push(filter);
        self
    }

    /// Append several ignore filters
    pub fn with_ignores(mut self, filters: impl IntoIterator<Item = IdentityFilter>) -> Self {
        self.ignore.extend(filters);
        self
    }

    /// Append a typed ignore filter
    pub fn with_typed_ignore(mut self, filter: TypedFilter<R, C>) -> Self {
        self.typed_ignore.push(filter);
        self
    }

    /// Append a compliance filter
    pub fn with_compliance(mut self, filter: IdentityFilter) -> Self {
        self.compliance.push(filter);
        self
    }

    /// Append a typed compliance filter
    pub fn with_typed_compliance(mut self, filter: TypedFilter<R, C>) -> Self {
        self.typed_compliance.push(filter);
        self
    }

    /// Total number of filters across all phases
    pub fn len(&self) -> usize {
        self.ignore.len() + self.typed_ignore.len() + self.compliance.len() + self.typed_compliance.len()
    }

    /// Whether the chain holds no filters
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evaluate the chain, keeping the deciding filter's name
    pub fn evaluate(&self, subject: &Subject<'_, R, C>) -> Verdict {
        evaluate(
            subject,
            &self.ignore,
            &self.typed_ignore,
            &self.compliance,
            &self.typed_compliance,
        )
    }

    /// Classify a subject
    pub fn classify(&self, subject: &Subject<'_, R, C>) -> Disposition {
        self.evaluate(subject).disposition
    }
}
