//! Disposition module - classifier verdicts

/// Outcome of classifying one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// Out of scope for lifecycle management; any existing record is retracted
    Ignore,

    /// Violates policy; recorded as a candidate and leased for deletion
    NonCompliant,

    /// Meets policy; any existing record is retracted
    Compliant,
}

impl Disposition {
    /// Get the disposition name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Ignore => "ignore",
            Disposition::NonCompliant => "non_compliant",
            Disposition::Compliant => "compliant",
        }
    }

    /// Whether the resource should be recorded as a candidate
    pub fn is_candidate(&self) -> bool {
        matches!(self, Disposition::NonCompliant)
    }
}

impl std::fmt::Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
