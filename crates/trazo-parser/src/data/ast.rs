//! Syntax tree of the structured-data notation.

use std::fmt;

use crate::span::Spanned;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Spanned<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Members in source order, duplicates included.
    Object(Vec<Member>),
    Array(Vec<Spanned<Value>>),
    String(String),
    /// Kept as written so `1.50` is displayed as `1.50`.
    Number(String),
    Bool(bool),
    Null,
}

impl Value {
    /// JSON type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Object(_) => "object",
            Value::Array(_) => "array",
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Bool(_) => "boolean",
            Value::Null => "null",
        }
    }
}

/// Primitives print as JSON literals; containers print their type.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s:?}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => write!(f, "null"),
            Value::Object(_) | Value::Array(_) => write!(f, "{}", self.type_name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub key: Spanned<String>,
    pub value: Spanned<Value>,
}
