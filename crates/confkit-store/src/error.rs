//! Error types for the store and handler layers.
//!
//! [`StoreError`] covers the storage engine (bad keys, closed stores, I/O,
//! encoding).  [`ConfigError`] is what typed handlers return: it wraps store
//! failures and adds validation and lookup failures, so a UI can tell "that
//! value is not allowed" apart from "the value could not be saved".

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use confkit_core::{CodecError, HandlerVariant, SchemaError, ValidationError};

use crate::infrastructure::storage::SettingsError;

/// Failures of [`ConfigStore`](crate::infrastructure::storage::ConfigStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Keys must be non-empty.
    #[error("configuration keys must not be empty")]
    InvalidKey,

    /// The store was closed and no longer accepts mutations or saves.
    #[error("store is closed")]
    Closed,

    /// Reading or writing the backing medium failed.
    #[error("I/O error accessing store at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A value or document could not be encoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The store location could not be resolved from the settings.
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl StoreError {
    /// Returns `true` when the failure came from the backing medium.
    pub fn is_io(&self) -> bool {
        matches!(self, StoreError::Io { .. })
    }
}

/// Failures surfaced by key handlers and the storage handler.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The value was rejected by the key's constraints; the store is untouched.
    #[error("invalid value for {key:?}: {source}")]
    Validation {
        key: String,
        #[source]
        source: ValidationError,
    },

    /// A key declaration is inconsistent (registration time).
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No handler is registered under this key.
    #[error("no handler registered for key {0:?}")]
    UnknownKey(String),

    /// The handler for this key has a different type.
    #[error("key {key:?} holds {actual} values, not {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        actual: HandlerVariant,
    },

    /// A raw value could not be converted to the handler's type.
    #[error("value for {key:?} cannot be converted: {source}")]
    Decode {
        key: String,
        #[source]
        source: CodecError,
    },
}

impl ConfigError {
    /// Returns `true` when the value itself was not acceptable.
    ///
    /// Decode failures of raw values count as invalid values too.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ConfigError::Validation { .. } | ConfigError::Decode { .. }
        )
    }

    /// Returns `true` when the failure came from the backing medium.
    pub fn is_io(&self) -> bool {
        matches!(self, ConfigError::Store(e) if e.is_io())
    }
}
