//! Source location tracking for error reporting.
//!
//! A [`Span`] records where a syntax node starts (line and column) and how many
//! bytes it covers. The concrete syntax tree hands out byte offsets; spans are
//! derived from them with [`Span::from_offsets`].

use std::fmt;

/// A span of source code, represented by its starting position and length.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, byte-based).
    pub col: u32,
    /// Length in bytes.
    pub len: u32,
}

impl Span {
    /// Create a new span from a line, column, and length.
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }

    /// Build a span from a `[from, to)` byte range of `source`.
    ///
    /// Offsets past the end of the source are clamped.
    pub fn from_offsets(source: &str, from: usize, to: usize) -> Self {
        let from = from.min(source.len());
        let to = to.clamp(from, source.len());

        let mut line = 1u32;
        let mut line_start = 0usize;
        for (idx, byte) in source.as_bytes()[..from].iter().enumerate() {
            if *byte == b'\n' {
                line += 1;
                line_start = idx + 1;
            }
        }

        Self {
            line,
            col: (from - line_start) as u32 + 1,
            len: (to - from) as u32,
        }
    }

    /// Whether this span is empty (zero length).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The length of this span in bytes.
    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_display() {
        let span = Span::new(3, 15, 5);
        assert_eq!(format!("{}", span), "3:15");
    }

    #[test]
    fn offsets_on_first_line() {
        let span = Span::from_offsets("x: int = 5", 9, 10);
        assert_eq!(span, Span::new(1, 10, 1));
    }

    #[test]
    fn offsets_after_newlines() {
        let source = "x: int = 5\nx = x + 3\nprint(x)";
        let start = source.find("print").unwrap();
        let span = Span::from_offsets(source, start, source.len());
        assert_eq!(span.line, 3);
        assert_eq!(span.col, 1);
        assert_eq!(span.len(), 8);
    }

    #[test]
    fn offsets_are_clamped() {
        let span = Span::from_offsets("abc", 2, 40);
        assert_eq!(span, Span::new(1, 3, 1));
        assert!(Span::from_offsets("abc", 9, 1).is_empty());
    }
}
