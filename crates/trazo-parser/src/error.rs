//! Error and diagnostic system for the Trazo parsers.
//!
//! Every phase (lexing, parsing, lowering) reports problems as
//! [`Diagnostic`]s: an [`ErrorCode`], a message, labelled source
//! spans and optional help. Phases that can find several problems in one pass
//! accumulate them and return them together in a [`ParseError`].
//!
//! # Example
//!
//! ```
//! # use trazo_parser::error::{Diagnostic, ErrorCode};
//! # use trazo_parser::Span;
//! let diag = Diagnostic::error("table `users` is defined multiple times")
//!     .with_code(ErrorCode::E201)
//!     .with_label(Span::new(40..47), "duplicate definition")
//!     .with_related_label(Span::new(0..7), "first defined here")
//!     .with_help("rename or remove one of the tables");
//! assert_eq!(diag.primary_span(), Some(Span::new(40..47)));
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::{Label, LabelRole};
pub use parse_error::ParseError;
