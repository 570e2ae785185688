//! Structured-data notation: a JSON document drawn as a containment tree.

pub mod ast;
mod lexer;
mod lower;
mod parser;
mod tokens;

pub use lower::lower;
pub use parser::parse;
