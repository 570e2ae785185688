//! Syntax tree of the entity-relationship notation.
//!
//! The tree is flat: a column belongs to the nearest table header above it,
//! which is resolved during lowering.

use std::fmt;

use crate::span::Spanned;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    pub items: Vec<Spanned<Item>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Table(TableHeader),
    Column(Column),
    Relation(Relation),
}

/// `[name] {attrs}`
#[derive(Debug, Clone, PartialEq)]
pub struct TableHeader {
    pub name: Spanned<String>,
    pub attributes: Vec<Attribute>,
}

/// `*+name: type {attrs}`
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: Spanned<String>,
    pub primary_key: bool,
    pub foreign_key: bool,
    pub data_type: Option<Spanned<String>>,
    pub attributes: Vec<Attribute>,
}

/// `left CARD--CARD right {attrs}`
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub left: Spanned<String>,
    pub right: Spanned<String>,
    pub left_cardinality: Cardinality,
    pub right_cardinality: Cardinality,
    /// The operator as written, e.g. `||--o{`.
    pub operator: Spanned<String>,
    pub attributes: Vec<Attribute>,
}

/// `key: "value"`
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub key: Spanned<String>,
    pub value: Spanned<String>,
}

/// Find an attribute by key, case-insensitively.
pub fn find_attribute<'a>(attributes: &'a [Attribute], key: &str) -> Option<&'a Attribute> {
    attributes
        .iter()
        .find(|a| a.key.eq_ignore_ascii_case(key))
}

/// How many rows one side of a relation may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// `||` or `1`
    ExactlyOne,
    /// `|o`, `o|` or `?`
    ZeroOrOne,
    /// `}o`, `o{` or `*`
    ZeroOrMany,
    /// `}|`, `|{` or `+`
    OneOrMany,
}

impl Cardinality {
    /// Parses one side of a relation operator.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "||" | "1" => Some(Cardinality::ExactlyOne),
            "|o" | "o|" | "?" => Some(Cardinality::ZeroOrOne),
            "}o" | "o{" | "*" => Some(Cardinality::ZeroOrMany),
            "}|" | "|{" | "+" => Some(Cardinality::OneOrMany),
            _ => None,
        }
    }

    pub fn is_many(self) -> bool {
        matches!(self, Cardinality::ZeroOrMany | Cardinality::OneOrMany)
    }

    /// Relation name from the `from` side to the `to` side, e.g. `one-to-many`.
    pub fn relation_name(from: Cardinality, to: Cardinality) -> String {
        format!("{from}-to-{to}")
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_many() { "many" } else { "one" })
    }
}
