//! Error types for the classifier

use thiserror::Error;

/// Errors raised while building filters
///
/// Classification itself never fails; only compiling configured rules can.
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// A configured pattern is not a valid regular expression
    #[error("Invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The offending pattern text
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },

    /// A rule that can never match anything
    #[error("Empty ignore rule: set key, value, key_regex or value_regex")]
    EmptyRule,
}
