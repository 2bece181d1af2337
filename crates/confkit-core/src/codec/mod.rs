//! Codec module: document serialization and the encrypted envelope.
//!
//! A store's backing file is one JSON object mapping keys to values.  It is
//! written either as readable text ([`Encoding::Plain`]) or sealed with a
//! symmetric key ([`Encoding::Encrypted`]).

pub mod cipher;
pub mod document;

use thiserror::Error;

use crate::value::ValueKind;

pub use cipher::{EncryptionKey, NONCE_SIZE};
pub use document::{decode_document, encode_document, Document, Encoding};

/// Errors raised while converting values or documents.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    /// The stored value's shape is not accepted for the declared type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: ValueKind, found: ValueKind },

    /// A stored number does not fit the declared numeric type.
    #[error("value {value} is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },

    /// A stored string could not be parsed as the declared numeric type.
    #[error("{text:?} is not a valid {target}")]
    InvalidNumber { text: String, target: &'static str },

    /// A stored enum name is not declared by the enum type.
    #[error("no constant named {name:?} in {type_name}")]
    UnknownEnumName { type_name: &'static str, name: String },

    /// NaN and infinities have no document representation.
    #[error("non-finite floats cannot be persisted")]
    NonFiniteFloat,

    /// An array mixes element shapes.
    #[error("heterogeneous array: element {index} is {found}, expected {expected}")]
    HeterogeneousArray {
        expected: ValueKind,
        found: ValueKind,
        index: usize,
    },

    /// The document text could not be parsed or produced.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// The encrypted envelope is shorter than its fixed-size prefix.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// Sealing the document failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// The envelope could not be opened (wrong key or tampered bytes).
    #[error("decryption failed: {0}")]
    Decryption(String),
}
