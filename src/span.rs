//! Character spans and span-keyed record identifiers.
//!
//! Every annotation layer reports half-open `[start, end)` character ranges
//! over the document text. Spans from different layers are comparable only by
//! numeric offset — never by token index, unless first passed through
//! [`crate::align`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// A half-open character range `[start, end)` over the document text.
///
/// Orders by `(start, end)`, which makes span-keyed maps iterate in document
/// order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Span {
    /// Character offset (start, inclusive).
    pub start: usize,
    /// Character offset (end, exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Character range.
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Character length.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if this span is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Check if this span overlaps with another.
    #[must_use]
    pub const fn overlaps(&self, other: &Span) -> bool {
        !(self.end <= other.start || other.end <= self.start)
    }

    /// Record key in `"start_end"` form.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}_{}", self.start, self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.start, self.end)
    }
}

impl FromStr for Span {
    type Err = crate::Error;

    /// Parse a `"start_end"` record key back into a span.
    fn from_str(s: &str) -> crate::Result<Self> {
        let (start, end) = s
            .split_once('_')
            .ok_or_else(|| crate::Error::invalid_input(format!("bad span key: {s:?}")))?;
        let start = start
            .parse()
            .map_err(|_| crate::Error::invalid_input(format!("bad span key: {s:?}")))?;
        let end = end
            .parse()
            .map_err(|_| crate::Error::invalid_input(format!("bad span key: {s:?}")))?;
        Ok(Self { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_roundtrip() {
        let span = Span::new(12, 40);
        assert_eq!(span.key(), "12_40");
        assert_eq!("12_40".parse::<Span>().unwrap(), span);
    }

    #[test]
    fn bad_keys_rejected() {
        assert!("1240".parse::<Span>().is_err());
        assert!("a_b".parse::<Span>().is_err());
    }

    #[test]
    fn overlap() {
        let a = Span::new(0, 4);
        let b = Span::new(4, 8);
        let c = Span::new(0, 8);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn document_order() {
        let mut spans = vec![Span::new(10, 12), Span::new(0, 4), Span::new(0, 2)];
        spans.sort();
        assert_eq!(spans[0], Span::new(0, 2));
        assert_eq!(spans[2], Span::new(10, 12));
    }
}
