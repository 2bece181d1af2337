//! Dirty marks: the counters that decide whether a save is needed.
//!
//! # How the marks work (for beginners)
//!
//! A store keeps two monotonically increasing counters:
//!
//! - **set mark** – bumped by every mutation that changes what would be
//!   written to disk (a changed `put`, a `remove`, a `clear`).
//! - **write mark** – the set mark that the last save reflected.
//!
//! When both are equal the store is *clean* and saving would write the same
//! bytes again, so `save()` skips the I/O entirely.  This is what keeps UI
//! round-trips (read a value, write it back unchanged) from touching the disk.
//!
//! # Thread safety
//!
//! Both counters are `AtomicU64`.  The set mark is only bumped while the
//! store's writer lock is held, so a reader holding the read lock sees a set
//! mark that matches the map contents exactly.  The write mark only ever moves
//! forward through [`DirtyMarks::claim`] and [`DirtyMarks::publish`], except
//! for the compare-and-swap in [`DirtyMarks::rollback`] that undoes a publish
//! whose write failed.

use std::sync::atomic::{AtomicU64, Ordering};

/// The set/write mark pair owned by one store.
///
/// Invariant: `write_mark() <= set_mark()`.
#[derive(Debug, Default)]
pub struct DirtyMarks {
    set_mark: AtomicU64,
    write_mark: AtomicU64,
}

impl DirtyMarks {
    /// Creates a clean pair at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a committed mutation and returns the new set mark.
    pub fn mark_dirty(&self) -> u64 {
        self.set_mark.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn set_mark(&self) -> u64 {
        self.set_mark.load(Ordering::SeqCst)
    }

    pub fn write_mark(&self) -> u64 {
        self.write_mark.load(Ordering::SeqCst)
    }

    /// Returns `true` when there is nothing new to persist.
    pub fn is_clean(&self) -> bool {
        self.write_mark() >= self.set_mark()
    }

    /// Claims the right to save.
    ///
    /// Advances the write mark to the current set mark.  Returns the previous
    /// write mark when it was behind (the caller must save), or `None` when
    /// the store was already clean or another saver got there first.
    pub fn claim(&self) -> Option<u64> {
        let current = self.set_mark();
        let previous = self.write_mark.fetch_max(current, Ordering::SeqCst);
        (previous < current).then_some(previous)
    }

    /// Publishes the mark a serialized snapshot reflects.
    ///
    /// The snapshot may include mutations made after [`DirtyMarks::claim`],
    /// so the write mark moves forward to cover them.
    pub fn publish(&self, snapshot_mark: u64) {
        self.write_mark.fetch_max(snapshot_mark, Ordering::SeqCst);
    }

    /// Undoes a publish whose write failed, so the next save retries.
    ///
    /// Only takes effect if no other save has moved the write mark since.
    pub fn rollback(&self, published: u64, previous: u64) {
        let _ = self.write_mark.compare_exchange(
            published,
            previous,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }
}
