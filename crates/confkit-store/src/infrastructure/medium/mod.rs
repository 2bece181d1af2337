//! Backing media: where a store's encoded document lives.
//!
//! A [`ConfigStore`](crate::infrastructure::storage::ConfigStore) never touches
//! the file system directly.  It reads its document once at open time and
//! writes it on `save()` through a [`BackingMedium`].
//!
//! # Testability
//!
//! [`memory::MemoryMedium`] keeps the bytes in memory and counts writes, so
//! tests can assert exactly when a save performed I/O and can inject write
//! failures without a real disk.

use std::fmt;
use std::io;
use std::path::PathBuf;

pub mod file;
pub mod memory;

pub use file::FileMedium;
pub use memory::MemoryMedium;

/// Storage for one encoded document.
pub trait BackingMedium: fmt::Debug + Send + Sync {
    /// Reads the whole document.
    ///
    /// Returns `Ok(None)` when nothing has been written yet (first run).
    ///
    /// # Errors
    ///
    /// Returns any I/O error other than "not found".
    fn read(&self) -> io::Result<Option<Vec<u8>>>;

    /// Replaces the whole document with `bytes`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    fn write(&self, bytes: &[u8]) -> io::Result<()>;

    /// Path (or pseudo-path) identifying this medium in logs and errors.
    fn location(&self) -> PathBuf;
}
