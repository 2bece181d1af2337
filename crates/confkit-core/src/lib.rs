//! # confkit-core
//!
//! Shared foundation for the confkit configuration engine: the generic value
//! representation, the document codec, and the declarative key descriptors.
//!
//! This crate has no file-system, locking, or threading policy of its own; the
//! store crate (`confkit-store`) builds the concurrent on-disk store and the
//! typed key handlers on top of it.
//!
//! # Architecture overview (for beginners)
//!
//! A configuration store maps string keys to values and persists them to a
//! file.  Callers never deal with raw values: each key is declared with a Rust
//! type, a default, and optional constraints, and reads/writes go through a
//! typed handler.  This crate defines the pieces those handlers are made of:
//!
//! - **`value`** – [`ConfigValue`], the sum type every entry is stored as, and
//!   [`ConfigType`], the conversion between it and Rust types (including the
//!   numeric/string coercion table and enum name round-tripping).
//!
//! - **`codec`** – How a whole map becomes bytes: pretty JSON for plain stores,
//!   AES-256-GCM sealed JSON for encrypted ones.
//!
//! - **`domain`** – [`KeyDescriptor`] and its constraints, the per-type
//!   validation policy ([`SettingType`]), and the [`DirtyMarks`] counters that
//!   decide when a save is needed.

pub mod codec;
pub mod domain;
pub mod value;

pub use codec::{
    decode_document, encode_document, CodecError, Document, EncryptionKey, Encoding,
};
pub use domain::{
    Constraint, ConstraintKind, DirtyMarks, FloatRange, HandlerVariant, IntRange, KeyDescriptor,
    SchemaError, SettingType, ValidationError,
};
pub use value::{CachedEnum, ConfigEnum, ConfigType, ConfigValue, ValueKind};
