//! Source spans and locations.
//!
//! Every node carries a `Location` so diagnostics and the scripting backend's
//! position-tagged writes can point back into the source.

use std::fmt;

/// A position in source text, measured as a byte offset from the start.
pub type TextPos = u32;

/// A span in source text, defined by a start position and a length.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct TextSpan {
    /// The byte offset where this span starts.
    pub start: TextPos,
    /// The length of this span in bytes.
    pub length: TextPos,
}

impl TextSpan {
    /// Create a span from start and end positions.
    #[inline]
    pub fn from_bounds(start: TextPos, end: TextPos) -> Self {
        debug_assert!(end >= start);
        Self {
            start,
            length: end - start,
        }
    }

    /// The end position of this span (exclusive).
    #[inline]
    pub fn end(&self) -> TextPos {
        self.start + self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl fmt::Debug for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end())
    }
}

impl fmt::Display for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end())
    }
}

/// Identifies a source file within one compilation.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug, Default)]
pub struct FileId(pub u32);

/// Where a node came from: a file and a span inside it.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Location {
    pub file: FileId,
    pub span: TextSpan,
}

impl Location {
    /// A location with a span in the default file. Handy for synthesized nodes and tests.
    #[inline]
    pub fn at(start: TextPos, end: TextPos) -> Self {
        Self {
            file: FileId::default(),
            span: TextSpan::from_bounds(start, end),
        }
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{:?}", self.file.0, self.span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_span() {
        let span = TextSpan::from_bounds(5, 15);
        assert_eq!(span.length, 10);
        assert_eq!(span.end(), 15);
        assert!(!span.is_empty());
        assert!(TextSpan::from_bounds(3, 3).is_empty());
        assert_eq!(format!("{span:?}"), "5..15");
    }

    #[test]
    fn test_location_at() {
        let loc = Location::at(2, 4);
        assert_eq!(loc.file, FileId(0));
        assert_eq!(loc.span.start, 2);
        assert_eq!(loc.span.end(), 4);
        assert_eq!(format!("{loc:?}"), "#0@2..4");
    }
}
