//! The core diagnostic type for the Trazo error system.
//!
//! A [`Diagnostic`] is a single error with an optional error code,
//! labeled source spans and help text.

use std::fmt;

use crate::{
    error::{
        error_code::ErrorCode,
        label::{Label, LabelRole},
    },
    span::Span,
};

/// A rich diagnostic message with source location information.
///
/// Every diagnostic is fatal for the phase that emitted it. The code groups
/// it as lexical, syntactic or semantic and the labels point into the source.
///
/// # Example
///
/// ```text
/// error[E201]: table `users` is defined multiple times
///   --> schema.er:9:1
///    |
///  9 | [users]
///    | ^^^^^^^ duplicate definition
///    |
///   --> schema.er:1:1
///    |
///  1 | [Users]
///    | ------- first defined here
///    |
///    = help: rename or remove one of the tables
/// ```
#[derive(Debug, Clone)]
pub struct Diagnostic {
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use trazo_parser::error::{Diagnostic, ErrorCode};
    /// # use trazo_parser::Span;
    ///
    /// let span = Span::new(0..10);
    /// let diag = Diagnostic::error("undefined resource `db`")
    ///     .with_code(ErrorCode::E200)
    ///     .with_label(span, "not defined")
    ///     .with_help("assign it first: `db = RDS(\"db\")`");
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Labels in the order they were attached.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Span of the first primary label, if any.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|label| label.is_primary())
            .map(Label::span)
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Point at the problem itself.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::new(LabelRole::Primary, span, message));
        self
    }

    /// Point at a related location, such as an earlier definition.
    pub fn with_related_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::new(LabelRole::Related, span, message));
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error")?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}
