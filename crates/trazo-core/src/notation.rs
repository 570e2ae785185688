//! Source notations and the immutable source document.

use std::{fmt, str::FromStr};

use serde::Deserialize;

/// One of the three supported input description languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Notation {
    /// Infrastructure pseudo-code (`lb >> web >> db`).
    Infra,
    /// Entity-relationship tables and relations.
    Er,
    /// Structured-data (JSON) literal.
    Data,
}

impl Notation {
    /// All notations, in declaration order.
    pub const ALL: [Notation; 3] = [Notation::Infra, Notation::Er, Notation::Data];

    /// Canonical lowercase tag. Part of the content digest, so it must never change.
    pub fn as_str(self) -> &'static str {
        match self {
            Notation::Infra => "infra",
            Notation::Er => "er",
            Notation::Data => "data",
        }
    }
}

impl fmt::Display for Notation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Notation {
    type Err = String;

    /// Accepts the canonical tags plus the labels the editor used (`AWS`, `ER`, `JSON`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "infra" | "aws" | "infrastructure" => Ok(Notation::Infra),
            "er" | "erd" => Ok(Notation::Er),
            "data" | "json" => Ok(Notation::Data),
            other => Err(format!(
                "unknown notation `{other}`, expected one of: infra, er, data"
            )),
        }
    }
}

/// Raw source text tagged with its notation.
///
/// Immutable once constructed: the compiler hashes it for caching and
/// every stage reads it by reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceDocument {
    notation: Notation,
    text: String,
}

impl SourceDocument {
    pub fn new(notation: Notation, text: impl Into<String>) -> Self {
        Self {
            notation,
            text: text.into(),
        }
    }

    pub fn notation(&self) -> Notation {
        self.notation
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns `true` if the text holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notation_from_str() {
        assert_eq!("AWS".parse::<Notation>(), Ok(Notation::Infra));
        assert_eq!("er".parse::<Notation>(), Ok(Notation::Er));
        assert_eq!("JSON".parse::<Notation>(), Ok(Notation::Data));
        assert!("uml".parse::<Notation>().is_err());
    }

    #[test]
    fn test_notation_roundtrip_tag() {
        for notation in Notation::ALL {
            assert_eq!(notation.as_str().parse::<Notation>(), Ok(notation));
        }
    }

    #[test]
    fn test_blank_document() {
        assert!(SourceDocument::new(Notation::Data, "  \n\t").is_blank());
        assert!(!SourceDocument::new(Notation::Data, "{}").is_blank());
    }
}
