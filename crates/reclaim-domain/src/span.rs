//! Span module - signed durations written as `1w2d3h`
//!
//! Grammar: an optional leading `-`, followed by one or more `<digits><unit>`
//! components with units in strictly descending order:
//!
//! | Unit | Meaning |
//! |------|---------|
//! | `y`  | 365 days |
//! | `w`  | 7 days |
//! | `d`  | 24 hours |
//! | `h`  | hour |
//! | `m`  | minute |
//! | `s`  | second |
//! | `ms` | millisecond |
//!
//! The bare literal `"0"` is also accepted. As a ttl tag value it is the
//! "never expire" sentinel; that interpretation belongs to the caller.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Ttl tag value that disables expiry
pub const UNLIMITED_TTL: &str = "0";

const MILLIS_PER_SECOND: i64 = 1_000;
const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// A signed duration with millisecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Span {
    millis: i64,
}

impl Span {
    /// The zero-length span
    pub const ZERO: Span = Span { millis: 0 };

    /// Create a span from signed milliseconds
    pub fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    /// Create a span from signed hours
    pub fn from_hours(hours: i64) -> Self {
        Self {
            millis: hours.saturating_mul(MILLIS_PER_HOUR),
        }
    }

    /// Signed milliseconds
    pub fn as_millis(&self) -> i64 {
        self.millis
    }

    /// Signed whole seconds, truncated toward zero
    pub fn as_secs(&self) -> i64 {
        self.millis / MILLIS_PER_SECOND
    }

    /// Whether the span points backwards in time
    pub fn is_negative(&self) -> bool {
        self.millis < 0
    }

    /// Convert to a `std::time::Duration`, `None` for negative spans
    pub fn to_std(&self) -> Option<Duration> {
        u64::try_from(self.millis).ok().map(Duration::from_millis)
    }

    /// Whether `elapsed_secs` seconds have reached this span
    ///
    /// A negative span has always elapsed.
    pub fn has_elapsed(&self, elapsed_secs: i64) -> bool {
        elapsed_secs.saturating_mul(MILLIS_PER_SECOND) >= self.millis
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.millis == 0 {
            return write!(f, "0s");
        }
        if self.millis < 0 {
            write!(f, "-")?;
        }
        let mut rest = self.millis.unsigned_abs();
        for (suffix, size) in UNITS {
            let size = size.unsigned_abs();
            if rest >= size {
                write!(f, "{}{}", rest / size, suffix)?;
                rest %= size;
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for Span {
    type Err = SpanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_span(s)
    }
}

/// Errors produced while parsing a span
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpanError {
    /// Empty input
    #[error("empty duration")]
    Empty,
    /// A component is missing its digits or its unit
    #[error("malformed duration: {0:?}")]
    Malformed(String),
    /// A unit suffix outside the grammar
    #[error("unknown duration unit: {0:?}")]
    UnknownUnit(String),
    /// Units repeated or not in descending order
    #[error("duration units out of order: {0:?}")]
    OutOfOrder(String),
    /// The value does not fit in 64-bit milliseconds
    #[error("duration out of range: {0:?}")]
    Overflow(String),
}

// Ordered largest to smallest; the index is the unit's rank.
const UNITS: [(&str, i64); 7] = [
    ("y", 365 * MILLIS_PER_DAY),
    ("w", 7 * MILLIS_PER_DAY),
    ("d", MILLIS_PER_DAY),
    ("h", MILLIS_PER_HOUR),
    ("m", MILLIS_PER_MINUTE),
    ("s", MILLIS_PER_SECOND),
    ("ms", 1),
];

fn unit_rank(suffix: &str) -> Option<(usize, i64)> {
    UNITS
        .iter()
        .position(|(name, _)| *name == suffix)
        .map(|rank| (rank, UNITS[rank].1))
}

/// Parse a span such as `"24h"`, `"1w2d"`, `"-1w"` or `"0"`
///
/// # Examples
///
/// ```
/// use reclaim_domain::parse_span;
///
/// assert_eq!(parse_span("1d").unwrap().as_secs(), 86_400);
/// assert!(parse_span("-1w").unwrap().is_negative());
/// assert!(parse_span("soon").is_err());
/// ```
pub fn parse_span(input: &str) -> Result<Span, SpanError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SpanError::Empty);
    }
    if trimmed == UNLIMITED_TTL {
        return Ok(Span::ZERO);
    }

    let (negative, mut rest) = match trimmed.strip_prefix('-') {
        Some(stripped) => (true, stripped),
        None => (false, trimmed),
    };
    if rest.is_empty() {
        return Err(SpanError::Malformed(input.to_string()));
    }

    let mut total: i64 = 0;
    let mut last_rank: Option<usize> = None;

    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits_end == 0 {
            return Err(SpanError::Malformed(input.to_string()));
        }
        let value: i64 = rest[..digits_end]
            .parse()
            .map_err(|_| SpanError::Overflow(input.to_string()))?;
        rest = &rest[digits_end..];

        let unit_end = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let suffix = &rest[..unit_end];
        rest = &rest[unit_end..];
        if suffix.is_empty() {
            return Err(SpanError::Malformed(input.to_string()));
        }

        let (rank, size) =
            unit_rank(suffix).ok_or_else(|| SpanError::UnknownUnit(suffix.to_string()))?;
        if matches!(last_rank, Some(previous) if rank <= previous) {
            return Err(SpanError::OutOfOrder(input.to_string()));
        }
        last_rank = Some(rank);

        total = value
            .checked_mul(size)
            .and_then(|component| total.checked_add(component))
            .ok_or_else(|| SpanError::Overflow(input.to_string()))?;
    }

    Ok(Span::from_millis(if negative { -total } else { total }))
}
