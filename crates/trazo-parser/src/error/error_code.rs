//! Error codes for the Trazo diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Syntax errors
//! - `E2xx` - Semantic errors found while building the graph

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// Unterminated string literal.
    E001,

    /// Unexpected character.
    E002,

    /// Invalid escape sequence.
    E003,

    /// Invalid `\uXXXX` escape.
    ///
    /// The escape needs exactly four hex digits, and a high surrogate must be
    /// followed by a low surrogate escape.
    E004,

    /// Malformed number literal, such as a leading zero or a dangling exponent.
    E005,

    // =========================================================================
    // Syntax Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    E100,

    /// Unexpected end of input.
    E101,

    /// Unterminated block.
    ///
    /// An object or array was opened but the input ended before it was closed.
    E102,

    /// Unexpected indentation.
    ///
    /// A line is indented deeper than its block without an opening `with`, or
    /// dedents to a level that matches no enclosing block.
    E103,

    /// Nesting too deep.
    ///
    /// Brackets or `with` blocks are nested beyond the supported depth.
    E104,

    // =========================================================================
    // Semantic Errors (E2xx)
    // =========================================================================
    /// Reference to something that was never defined.
    E200,

    /// Duplicate definition.
    E201,

    /// Foreign key that references its own table.
    E202,

    /// Invalid attribute value.
    E203,

    /// Foreign-key column whose target table cannot be determined.
    E204,

    /// Column line that does not follow a table header.
    E205,
}

impl ErrorCode {
    /// Returns the error code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E205 => "E205",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E003 => "invalid escape sequence",
            ErrorCode::E004 => "invalid unicode escape",
            ErrorCode::E005 => "malformed number",
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "unexpected end of input",
            ErrorCode::E102 => "unterminated block",
            ErrorCode::E103 => "unexpected indentation",
            ErrorCode::E104 => "nesting too deep",
            ErrorCode::E200 => "undefined reference",
            ErrorCode::E201 => "duplicate definition",
            ErrorCode::E202 => "self-referential foreign key",
            ErrorCode::E203 => "invalid attribute value",
            ErrorCode::E204 => "unresolved foreign key",
            ErrorCode::E205 => "column outside table",
        }
    }

    /// Returns `true` for codes raised while reading text (`E0xx`, `E1xx`),
    /// `false` for codes raised while building the graph (`E2xx`).
    pub fn is_syntactic(&self) -> bool {
        !self.as_str().starts_with("E2")
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
