//! Source file spans attached to statements and terminators.
//!
//! The analysis itself only reasons about program points; spans ride along so
//! that diagnostics can point back at the frontend's source text.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A unique identifier for a source file
#[derive(Copy, Clone, Debug, Display, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[display("file#{_0}")]
pub struct FileId(pub u32);

impl FileId {
    /// Creates a file id from its raw index.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

/// A half-open byte range in a source file
#[derive(Copy, Clone, Debug, Display, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[display("{start}..{end}")]
pub struct Span {
    /// First byte covered by the span
    pub start: u32,
    /// One past the last byte covered by the span
    pub end: u32,
}

impl Span {
    /// Creates a span, swapping the bounds if they are reversed.
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Byte range usable for slicing the source text.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    /// Number of bytes covered.
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Returns `true` for zero-width spans.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`.
    #[must_use]
    pub fn to(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A span with associated file
#[derive(Copy, Clone, Debug, Display, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[display("{file}@{span}")]
pub struct FileSpan {
    /// File the span belongs to
    pub file: FileId,
    /// Byte range inside the file
    pub span: Span,
}

impl FileSpan {
    /// Creates a file span.
    #[must_use]
    pub const fn new(file: FileId, span: Span) -> Self {
        Self { file, span }
    }

    /// Byte range inside the file.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.span.range()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_normalizes_reversed_bounds() {
        let span = Span::new(9, 4);
        assert_eq!(span.start, 4);
        assert_eq!(span.end, 9);
        assert_eq!(span.len(), 5);
    }

    #[test]
    fn test_span_to_covers_both() {
        let merged = Span::new(2, 4).to(Span::new(7, 12));
        assert_eq!(merged, Span::new(2, 12));
        assert_eq!(merged.range(), 2..12);
    }

    #[test]
    fn test_file_span_display() {
        let span = FileSpan::new(FileId::new(3), Span::new(1, 5));
        assert_eq!(span.to_string(), "file#3@1..5");
    }
}
