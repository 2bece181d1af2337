//! # confkit-store
//!
//! The concurrent, file-backed configuration store and the typed key handlers
//! built on top of it.
//!
//! - [`infrastructure::storage::ConfigStore`] keeps key → value in memory,
//!   tracks whether anything changed, and writes the document to its backing
//!   medium on `save()`.
//! - [`application::StorageHandler`] registers declared keys and hands out
//!   [`application::KeyHandler`]s that validate, default, and notify.
//!
//! Integration tests in `tests/` use the same public module tree.

pub mod application;
pub mod error;
pub mod infrastructure;

pub use application::{
    AnyKeyHandler, ConfigEvent, ConfigEventSink, KeyHandler, StorageHandler,
};
pub use error::{ConfigError, StoreError};
pub use infrastructure::medium::{BackingMedium, FileMedium, MemoryMedium};
pub use infrastructure::storage::{ConfigStore, StoreLocation, StoreSettings};
