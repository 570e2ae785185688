//! Tokens of the infrastructure notation.

use std::fmt;

use crate::span::Span;

/// A lexical token of the infrastructure notation.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    // Keywords
    From,
    Import,
    As,
    With,
    True,
    False,
    None,

    Identifier(&'src str),
    StringLiteral(String),
    NumberLiteral(f64),

    // Chain operators
    /// `>>`
    Forward,
    /// `<<`
    Backward,
    /// `-`
    Minus,

    Equals,
    Colon,
    Comma,
    Dot,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,

    /// `#` comment, without the marker.
    Comment(&'src str),
    /// Spaces and tabs.
    Whitespace,
    Newline,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::From => write!(f, "from"),
            Token::Import => write!(f, "import"),
            Token::As => write!(f, "as"),
            Token::With => write!(f, "with"),
            Token::True => write!(f, "True"),
            Token::False => write!(f, "False"),
            Token::None => write!(f, "None"),
            Token::Identifier(name) => write!(f, "{name}"),
            Token::StringLiteral(s) => write!(f, "\"{s}\""),
            Token::NumberLiteral(n) => write!(f, "{n}"),
            Token::Forward => write!(f, ">>"),
            Token::Backward => write!(f, "<<"),
            Token::Minus => write!(f, "-"),
            Token::Equals => write!(f, "="),
            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
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
