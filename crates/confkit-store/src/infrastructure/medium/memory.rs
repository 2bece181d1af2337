//! In-memory medium for tests and ephemeral stores.

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::BackingMedium;

/// A medium that keeps the document in memory.
///
/// Clones share the same contents, so a test can hand one clone to a store
/// and inspect writes through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryMedium {
    inner: Arc<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    contents: Mutex<Option<Vec<u8>>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryMedium {
    /// Creates an empty medium (as if the file did not exist).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a medium that already holds `bytes`.
    pub fn with_contents(bytes: impl Into<Vec<u8>>) -> Self {
        let medium = Self::new();
        *medium.inner.contents.lock() = Some(bytes.into());
        medium
    }

    /// Returns a copy of the current contents.
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.inner.contents.lock().clone()
    }

    /// Returns how many writes have succeeded.
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Makes subsequent writes fail with an I/O error until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl BackingMedium for MemoryMedium {
    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.contents())
    }

    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "injected write failure"));
        }
        *self.inner.contents.lock() = Some(bytes.to_vec());
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> PathBuf {
        PathBuf::from("memory")
    }
}
