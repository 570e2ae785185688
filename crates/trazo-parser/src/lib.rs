//! # Trazo Parser
//!
//! Front end of the Trazo diagram compiler. Each notation has its own
//! lexer, parser and lowering pass; all of them produce the same
//! [`trazo_core::graph::Graph`].
//!
//! | Notation | Module    | Source                                     |
//! |----------|-----------|--------------------------------------------|
//! | `infra`  | [`infra`] | `diagrams`-style resources and `>>` chains |
//! | `er`     | [`er`]    | `[table]` blocks and `||--o{` relations     |
//! | `data`   | [`data`]  | a JSON document                            |
//!
//! ## Usage
//!
//! ```
//! # use trazo_core::{Notation, SourceDocument};
//! # use trazo_parser::{ParseError, lower, parse};
//! fn main() -> Result<(), ParseError> {
//!     let source = SourceDocument::new(
//!         Notation::Infra,
//!         "a = EC2(\"a\")\nb = RDS(\"b\")\na >> b\n",
//!     );
//!
//!     let ast = parse(&source)?;
//!     let graph = lower(ast)?;
//!     assert_eq!(graph.node_count(), 2);
//!     assert_eq!(graph.edge_count(), 1);
//!     Ok(())
//! }
//! ```

pub mod data;
pub mod er;
pub mod error;
pub mod infra;
mod lexer;
mod span;

pub use error::{Diagnostic, ErrorCode, Label, LabelRole, ParseError};
pub use span::{Position, Span, Spanned};

use log::debug;

use trazo_core::{Notation, SourceDocument, graph::Graph};

/// Syntax tree of a source document, one variant per notation.
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Infra(infra::ast::Program),
    Er(er::ast::Schema),
    Data(data::ast::Document),
}

impl Ast {
    pub fn notation(&self) -> Notation {
        match self {
            Ast::Infra(_) => Notation::Infra,
            Ast::Er(_) => Notation::Er,
            Ast::Data(_) => Notation::Data,
        }
    }
}

/// Parses a source document with the grammar of its notation.
///
/// # Errors
///
/// Returns a [`ParseError`] holding lexical (`E0xx`) or syntax (`E1xx`)
/// diagnostics.
pub fn parse(document: &SourceDocument) -> Result<Ast, ParseError> {
    let text = document.text();
    let ast = match document.notation() {
        Notation::Infra => infra::parse(text).map(Ast::Infra),
        Notation::Er => er::parse(text).map(Ast::Er),
        Notation::Data => data::parse(text).map(Ast::Data),
    }?;
    debug!(notation = document.notation().as_str(), bytes = text.len(); "Parsed source document");
    Ok(ast)
}

/// Lowers a syntax tree into the unified graph model.
///
/// # Errors
///
/// Returns a [`ParseError`] holding every semantic (`E2xx`) diagnostic.
pub fn lower(ast: Ast) -> Result<Graph, ParseError> {
    match ast {
        Ast::Infra(program) => infra::lower(program),
        Ast::Er(schema) => er::lower(schema),
        Ast::Data(document) => data::lower(document),
    }
}
