//! Serialization of a whole store map to and from its backing bytes.
//!
//! Plain documents are pretty-printed JSON with keys in sorted order, so the
//! file diffs cleanly when a user edits it by hand.  Encrypted documents are
//! compact JSON sealed by [`EncryptionKey`].
//!
//! `null` entries are accepted on read and dropped: an explicit `null` means
//! the same thing as an absent key (use the default).

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::codec::{CodecError, EncryptionKey};
use crate::value::ConfigValue;

/// The in-memory form of a store: key → value.
pub type Document = HashMap<String, ConfigValue>;

/// How a document is encoded on its backing medium.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoding {
    /// Readable JSON text.
    Plain,
    /// JSON sealed with a symmetric key.
    Encrypted(EncryptionKey),
}

impl Encoding {
    /// Returns `true` for [`Encoding::Plain`].
    pub fn is_plain(&self) -> bool {
        matches!(self, Encoding::Plain)
    }

    /// File extension used for named stores in this encoding.
    pub fn extension(&self) -> &'static str {
        match self {
            Encoding::Plain => "json",
            Encoding::Encrypted(_) => "ejs",
        }
    }
}

/// Serializes `document` into its backing bytes.
///
/// # Errors
///
/// Returns [`CodecError::MalformedDocument`] if JSON serialization fails or
/// [`CodecError::Encryption`] if sealing fails.
///
/// # Examples
///
/// ```rust
/// use confkit_core::codec::{decode_document, encode_document, Document, Encoding};
/// use confkit_core::ConfigValue;
///
/// let mut doc = Document::new();
/// doc.insert("retries".to_string(), ConfigValue::Int(3));
///
/// let bytes = encode_document(&doc, &Encoding::Plain).unwrap();
/// assert_eq!(decode_document(&bytes, &Encoding::Plain).unwrap(), doc);
/// ```
pub fn encode_document(document: &Document, encoding: &Encoding) -> Result<Vec<u8>, CodecError> {
    let ordered: BTreeMap<&str, &ConfigValue> =
        document.iter().map(|(k, v)| (k.as_str(), v)).collect();

    match encoding {
        Encoding::Plain => serde_json::to_vec_pretty(&ordered)
            .map_err(|e| CodecError::MalformedDocument(e.to_string())),
        Encoding::Encrypted(key) => {
            let json = serde_json::to_vec(&ordered)
                .map_err(|e| CodecError::MalformedDocument(e.to_string()))?;
            key.seal(&json)
        }
    }
}

/// Parses backing bytes into a document.
///
/// Empty input (a zero-length file) decodes to an empty document.
///
/// # Errors
///
/// Returns [`CodecError::MalformedDocument`] for invalid JSON or a top level
/// that is not an object, and the cipher's errors for encrypted input.
pub fn decode_document(bytes: &[u8], encoding: &Encoding) -> Result<Document, CodecError> {
    if bytes.is_empty() {
        return Ok(Document::new());
    }

    let json = match encoding {
        Encoding::Plain => bytes.to_vec(),
        Encoding::Encrypted(key) => key.open(bytes)?,
    };

    let raw: HashMap<String, Option<ConfigValue>> = serde_json::from_slice(&json)
        .map_err(|e| CodecError::MalformedDocument(e.to_string()))?;

    let total = raw.len();
    let document: Document = raw
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect();
    if document.len() < total {
        debug!(dropped = total - document.len(), "ignored null entries");
    }
    Ok(document)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.insert("enabled".to_string(), ConfigValue::Bool(true));
        doc.insert("retries".to_string(), ConfigValue::Int(3));
        doc.insert("ratio".to_string(), ConfigValue::Float(0.25));
        doc.insert("name".to_string(), ConfigValue::from("primary"));
        doc.insert(
            "ports".to_string(),
            ConfigValue::Array(vec![ConfigValue::Int(80), ConfigValue::Int(443)]),
        );
        doc
    }

    #[test]
    fn test_plain_document_round_trips() {
        // Arrange
        let doc = sample();

        // Act
        let bytes = encode_document(&doc, &Encoding::Plain).expect("encode");
        let restored = decode_document(&bytes, &Encoding::Plain).expect("decode");

        // Assert
        assert_eq!(restored, doc);
    }

    #[test]
    fn test_encrypted_document_round_trips_and_hides_text() {
        // Arrange
        let encoding = Encoding::Encrypted(EncryptionKey::from_passphrase("secret"));
        let doc = sample();

        // Act
        let bytes = encode_document(&doc, &encoding).expect("encode");
        let restored = decode_document(&bytes, &encoding).expect("decode");

        // Assert
        assert_eq!(restored, doc);
        let haystack = String::from_utf8_lossy(&bytes);
        assert!(!haystack.contains("primary"), "plaintext must not leak");
    }

    #[test]
    fn test_plain_document_keys_are_sorted() {
        let bytes = encode_document(&sample(), &Encoding::Plain).expect("encode");
        let text = String::from_utf8(bytes).expect("utf8");
        let enabled = text.find("\"enabled\"").expect("enabled present");
        let retries = text.find("\"retries\"").expect("retries present");
        assert!(enabled < retries);
    }

    #[test]
    fn test_decode_drops_null_entries() {
        // Arrange
        let json = br#"{"a": 1, "b": null}"#;

        // Act
        let doc = decode_document(json, &Encoding::Plain).expect("decode");

        // Assert
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.get("a"), Some(&ConfigValue::Int(1)));
    }

    #[test]
    fn test_decode_empty_input_is_empty_document() {
        let doc = decode_document(b"", &Encoding::Plain).expect("decode");
        assert!(doc.is_empty());
    }

    #[test]
    fn test_decode_rejects_non_object_top_level() {
        let result = decode_document(b"[1, 2]", &Encoding::Plain);
        assert!(matches!(result, Err(CodecError::MalformedDocument(_))));
    }

    #[test]
    fn test_decode_rejects_truncated_json() {
        let result = decode_document(br#"{"a": "#, &Encoding::Plain);
        assert!(matches!(result, Err(CodecError::MalformedDocument(_))));
    }

    #[test]
    fn test_encoding_extensions() {
        assert_eq!(Encoding::Plain.extension(), "json");
        assert_eq!(
            Encoding::Encrypted(EncryptionKey::from_bytes([0; 32])).extension(),
            "ejs"
        );
    }
}
