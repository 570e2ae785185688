//! Byte spans into source text and their line/column positions.

use std::{fmt, ops::Range};

/// Tab stop interval used when resolving columns.
const TAB_WIDTH: usize = 8;

/// A half-open byte range `start..end` into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    pub fn new(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end.max(range.start),
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Create a union of two spans (encompassing both)
    pub fn union(&self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Resolves the start of this span to a 1-based line and column in `source`.
    ///
    /// Columns count characters, not bytes, and a tab advances to the next
    /// multiple of 8. An offset past the end of `source` resolves
    /// to the position just after the last character.
    pub fn position(&self, source: &str) -> Position {
        let mut offset = self.start.min(source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let width = before[line_start..].chars().fold(0, |width, c| match c {
            '\t' => (width / TAB_WIDTH + 1) * TAB_WIDTH,
            _ => width + 1,
        });
        Position {
            line,
            column: width + 1,
        }
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range)
    }
}

/// A 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A value tagged with the source span it was parsed from.
///
/// Equality compares only the inner values, so two ASTs parsed from
/// differently formatted text can still compare equal.
#[derive(Debug, Clone, Default)]
pub struct Spanned<T> {
    value: T,
    span: Span,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Convert from one spanned type to another, keeping the span.
    pub fn map<F, U>(self, f: F) -> Spanned<U>
    where
        F: FnOnce(T) -> U,
    {
        Spanned {
            value: f(self.value),
            span: self.span,
        }
    }

    pub fn inner(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> std::ops::Deref for Spanned<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T: fmt::Display> fmt::Display for Spanned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl<T: PartialEq> PartialEq for Spanned<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value.eq(&other.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_basic_functionality() {
        let span = Span::new(5..10);
        assert_eq!(span.start(), 5);
        assert_eq!(span.end(), 10);
        assert_eq!(span.len(), 5);
        assert!(!span.is_empty());
    }

    #[test]
    fn test_span_union() {
        let span = Span::new(15..20).union(Span::new(5..10));
        assert_eq!(span, Span::new(5..20));
    }

    #[test]
    fn test_position_first_line() {
        let source = "abc\ndef";
        assert_eq!(
            Span::new(0..1).position(source),
            Position { line: 1, column: 1 }
        );
        assert_eq!(
            Span::new(2..3).position(source),
            Position { line: 1, column: 3 }
        );
    }

    #[test]
    fn test_position_later_lines() {
        let source = "abc\ndef\n  ghi";
        assert_eq!(
            Span::new(4..5).position(source),
            Position { line: 2, column: 1 }
        );
        assert_eq!(
            Span::new(10..11).position(source),
            Position { line: 3, column: 3 }
        );
    }

    #[test]
    fn test_position_counts_characters() {
        let source = "é = x";
        // 'é' is two bytes; '=' is the third character.
        assert_eq!(
            Span::new(3..4).position(source),
            Position { line: 1, column: 3 }
        );
    }

    #[test]
    fn test_position_expands_tabs() {
        let source = "\tx\nab\ty\n\t\tz";
        assert_eq!(
            Span::new(1..2).position(source),
            Position { line: 1, column: 9 }
        );
        assert_eq!(
            Span::new(6..7).position(source),
            Position { line: 2, column: 9 }
        );
        assert_eq!(
            Span::new(10..11).position(source),
            Position { line: 3, column: 17 }
        );
    }

    #[test]
    fn test_position_past_end() {
        assert_eq!(
            Span::new(99..99).position("ab\nc"),
            Position { line: 2, column: 2 }
        );
    }

    #[test]
    fn test_spanned_eq_ignores_span() {
        assert_eq!(Spanned::new(1, Span::new(0..1)), Spanned::new(1, Span::new(7..9)));
    }
}
