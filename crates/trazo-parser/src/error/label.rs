//! Source spans annotated with a short note.

use crate::span::Span;

/// What a [`Label`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelRole {
    /// The location of the problem itself, rendered with `^^^`.
    Primary,
    /// A related location, such as an earlier definition, rendered with `---`.
    Related,
}

/// A span of source text with the note printed underneath it.
///
/// ```text
/// error[E201]: resource `web` is defined multiple times
///  --> infra.py:7:1
///   |
/// 4 | web = EC2("web-1")
///   | --- first defined here
/// ...
/// 7 | web = EC2("web-2")
///   | ^^^ duplicate definition
/// ```
#[derive(Debug, Clone)]
pub struct Label {
    span: Span,
    message: String,
    role: LabelRole,
}

impl Label {
    pub fn new(role: LabelRole, span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            role,
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn role(&self) -> LabelRole {
        self.role
    }

    pub fn is_primary(&self) -> bool {
        self.role == LabelRole::Primary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_roles() {
        let duplicate = Label::new(LabelRole::Primary, Span::new(40..47), "duplicate definition");
        let first = Label::new(LabelRole::Related, Span::new(0..7), "first defined here");

        assert!(duplicate.is_primary());
        assert_eq!(duplicate.span(), Span::new(40..47));
        assert!(!first.is_primary());
        assert_eq!(first.role(), LabelRole::Related);
        assert_eq!(first.message(), "first defined here");
    }
}
