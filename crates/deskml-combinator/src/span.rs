use serde::{Deserialize, Serialize};

/// A half-open range of byte offsets into the source text.
///
/// Offsets always fall on `char` boundaries and satisfy
/// `start <= end <= source.len()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub start: usize,
    pub end: usize,
}

impl SourceLocation {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "inverted location {start}..{end}");
        Self { start, end }
    }

    /// A zero-width location at `offset`.
    pub fn point(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    /// Zero for an inverted location.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest location covering both `self` and `other`.
    pub fn cover(self, other: SourceLocation) -> Self {
        Self::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// The text this location spans, if it is a valid range of `source`.
    pub fn slice<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.start..self.end)
    }
}

/// A value paired with the location it was parsed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Located<T> {
    pub value: T,
    pub loc: SourceLocation,
}

impl<T> Located<T> {
    pub fn new(value: T, loc: SourceLocation) -> Self {
        Self { value, loc }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Located<U> {
        Located {
            value: f(self.value),
            loc: self.loc,
        }
    }

    pub fn as_ref(&self) -> Located<&T> {
        Located {
            value: &self.value,
            loc: self.loc,
        }
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cover_spans_both() {
        let a = SourceLocation::new(4, 7);
        let b = SourceLocation::new(1, 5);
        assert_eq!(a.cover(b), SourceLocation::new(1, 7));
    }

    #[test]
    fn test_len_of_inverted_location_is_zero() {
        let inverted = SourceLocation { start: 5, end: 2 };
        assert_eq!(inverted.len(), 0);
        assert_eq!(SourceLocation::new(2, 5).len(), 3);
    }

    #[test]
    fn test_slice_rejects_out_of_range() {
        let loc = SourceLocation::new(2, 10);
        assert_eq!(loc.slice("abc"), None);
        assert_eq!(SourceLocation::new(1, 3).slice("abc"), Some("bc"));
    }

    #[test]
    fn test_located_map_keeps_location() {
        let located = Located::new("42", SourceLocation::new(3, 5));
        let mapped = located.map(|s| s.len());
        assert_eq!(mapped.value, 2);
        assert_eq!(mapped.loc, SourceLocation::new(3, 5));
    }
}
