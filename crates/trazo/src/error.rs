//! Error types for Trazo operations.
//!
//! This module provides the main error type [`TrazoError`] which wraps
//! every failure of the compilation pipeline, and [`ErrorKind`], the coarse
//! classification reported at the request boundary.

use std::{fmt, io};

use thiserror::Error;

use trazo_parser::{ParseError, Position};

use crate::{layout::LayoutError, render::RenderError};

/// The main error type for Trazo operations.
///
/// # Diagnostic Variants
///
/// The `Syntax` and `Semantic` variants keep the source text next to the
/// [`ParseError`] so that callers can render labelled snippets or convert
/// spans into line and column positions.
#[derive(Debug, Error)]
pub enum TrazoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Syntax { err: ParseError, src: String },

    #[error("{err}")]
    Semantic { err: ParseError, src: String },

    #[error("diagram has {nodes} nodes, more than the limit of {limit}")]
    TooLarge { nodes: usize, limit: usize },

    #[error("diagram is empty")]
    Empty,

    #[error("Layout error: {0}")]
    Layout(String),

    #[error("Export error: {0}")]
    Export(Box<dyn std::error::Error + Send + Sync>),

    #[error("compilation was cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<LayoutError> for TrazoError {
    fn from(error: LayoutError) -> Self {
        match error {
            LayoutError::Cancelled => Self::Cancelled,
            other => Self::Layout(other.to_string()),
        }
    }
}

impl From<RenderError> for TrazoError {
    fn from(error: RenderError) -> Self {
        Self::Export(Box::new(error))
    }
}

impl TrazoError {
    /// Create a new `Syntax` error with the associated source code.
    pub fn new_syntax_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Syntax {
            err,
            src: src.into(),
        }
    }

    /// Create a new `Semantic` error with the associated source code.
    pub fn new_semantic_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Semantic {
            err,
            src: src.into(),
        }
    }

    /// Classifies the error for the request boundary.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Syntax { .. } => ErrorKind::Syntax,
            Self::Semantic { .. } => ErrorKind::Semantic,
            Self::TooLarge { .. } => ErrorKind::TooLarge,
            Self::Empty => ErrorKind::Empty,
            Self::Io(_) | Self::Layout(_) | Self::Export(_) | Self::Cancelled | Self::Config(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Line and column of the first diagnostic, for source errors.
    pub fn position(&self) -> Option<Position> {
        match self {
            Self::Syntax { err, src } | Self::Semantic { err, src } => {
                err.primary_span().map(|span| span.position(src))
            }
            _ => None,
        }
    }
}

/// Coarse failure classification exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Lexical or grammatical error in the source text.
    Syntax,
    /// Well-formed source that describes an invalid diagram.
    Semantic,
    /// More nodes than the configured limit.
    TooLarge,
    /// Blank source, or a source that yields no nodes.
    Empty,
    /// Any failure the caller cannot fix by editing the source.
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::Semantic => "semantic",
            Self::TooLarge => "too_large",
            Self::Empty => "empty",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
