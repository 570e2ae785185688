//! Tokens of the entity-relationship notation.

use std::fmt;

use super::ast::Cardinality;
use crate::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    Identifier(&'src str),
    StringLiteral(String),
    /// Digits, as they appear in column types like `varchar(255)`.
    Number(&'src str),
    /// A relation operator such as `||--o{` or `1--*`.
    Relation {
        left: Cardinality,
        right: Cardinality,
        text: &'src str,
    },

    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    Colon,
    Comma,
    Dot,
    /// Primary-key marker.
    Star,
    /// Foreign-key marker.
    Plus,

    /// `#` or `--` comment, without the marker.
    Comment(&'src str),
    Whitespace,
    Newline,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(name) | Token::Number(name) => write!(f, "{name}"),
            Token::StringLiteral(s) => write!(f, "\"{s}\""),
            Token::Relation { text, .. } => write!(f, "{text}"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::Star => write!(f, "*"),
            Token::Plus => write!(f, "+"),
            Token::Comment(_) => write!(f, "comment"),
            Token::Whitespace => write!(f, "whitespace"),
            Token::Newline => write!(f, "newline"),
        }
    }
}

/// A token with position information for winnow integration
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span) -> Self {
        Self { token, span }
    }
}
