//! Content digests identifying a source document.

use sha2::{Digest, Sha256};

use trazo_core::SourceDocument;

/// Lowercase hex SHA-256 of the notation tag, a newline, and the source text.
///
/// Two documents share a digest exactly when they have the same notation
/// and byte-identical text, so the digest doubles as the cache key.
///
/// # Examples
///
/// ```
/// # use trazo::content_digest;
/// # use trazo_core::{Notation, SourceDocument};
/// let a = content_digest(&SourceDocument::new(Notation::Data, "{}"));
/// let b = content_digest(&SourceDocument::new(Notation::Er, "{}"));
/// assert_eq!(a.len(), 64);
/// assert_ne!(a, b);
/// ```
pub fn content_digest(document: &SourceDocument) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document.notation().as_str().as_bytes());
    hasher.update(b"\n");
    hasher.update(document.text().as_bytes());
    hex::encode(hasher.finalize())
}
