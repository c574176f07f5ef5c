use serde::{Deserialize, Serialize};

/// Source location of a syntax node.
///
/// `start`/`end` are byte offsets into the originating file (start inclusive,
/// end exclusive). `line`/`column` are the 1-based position of `start` as
/// reported by the parser; `0` means the parser did not provide one and it
/// must be recovered through a [`LineIndex`] when the source text is at hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

impl Span {
    /// Create a span from byte offsets with no line information.
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "span start ({start}) must be <= end ({end})");
        Self {
            start,
            end,
            line: 0,
            column: 0,
        }
    }

    /// Create a span that also records the 1-based line/column of its start.
    pub fn with_position(start: u32, end: u32, line: u32, column: u32) -> Self {
        Self {
            line,
            column,
            ..Self::new(start, end)
        }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Whether the span is empty (zero-length).
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether the parser supplied a line/column for this span.
    pub fn has_position(&self) -> bool {
        self.line > 0
    }

    /// Merge two spans into one that covers both. The position of the
    /// earlier span is kept.
    pub fn merge(self, other: Span) -> Span {
        let first = if other.start < self.start { other } else { self };
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line: first.line,
            column: first.column,
        }
    }
}

/// Pre-computed index of line start positions for on-demand line/column lookup.
///
/// Used when a span arrives without a parser-provided position but the
/// source text is available to the driver.
#[derive(Debug)]
pub struct LineIndex {
    /// Byte offset of the start of each line. The first entry is always 0.
    line_starts: Vec<u32>,
}

impl LineIndex {
    /// Build a line index by scanning the source text for newline characters.
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        Self { line_starts }
    }

    /// Convert a byte offset to a 1-based (line, column) pair.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line_idx = self.line_starts.partition_point(|&start| start <= offset);
        let line_idx = line_idx.saturating_sub(1);
        let line = (line_idx as u32) + 1;
        let col = offset - self.line_starts[line_idx] + 1;
        (line, col)
    }

    /// Position of a span: the parser-provided one when present, otherwise
    /// computed from the byte offset.
    pub fn position_of(&self, span: Span) -> (u32, u32) {
        if span.has_position() {
            (span.line, span.column)
        } else {
            self.line_col(span.start)
        }
    }

    /// Return the number of lines in the source.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_new_and_len() {
        let span = Span::new(5, 10);
        assert_eq!(span.len(), 5);
        assert!(!span.is_empty());
        assert!(!span.has_position());
    }

    #[test]
    fn span_merge_keeps_earliest_position() {
        let a = Span::with_position(8, 15, 2, 3);
        let b = Span::with_position(5, 10, 1, 6);
        let merged = a.merge(b);
        assert_eq!((merged.start, merged.end), (5, 15));
        assert_eq!((merged.line, merged.column), (1, 6));
    }

    #[test]
    fn line_index_multiple_lines() {
        let idx = LineIndex::new("ab\ncd\nef");
        assert_eq!(idx.line_col(0), (1, 1));
        assert_eq!(idx.line_col(3), (2, 1));
        assert_eq!(idx.line_col(7), (3, 2));
        assert_eq!(idx.line_count(), 3);
    }

    #[test]
    fn position_prefers_parser_position() {
        let idx = LineIndex::new("ab\ncd");
        assert_eq!(idx.position_of(Span::with_position(3, 4, 9, 9)), (9, 9));
        assert_eq!(idx.position_of(Span::new(3, 4)), (2, 1));
    }

    #[test]
    fn empty_span_at_offset() {
        let span = Span::new(7, 7);
        assert!(span.is_empty());
        assert_eq!(span.len(), 0);
    }
}
