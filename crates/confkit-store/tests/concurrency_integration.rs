//! Concurrency tests for `ConfigStore`.
//!
//! Many threads read, write, and save the same store.  The tests check the
//! properties that must hold regardless of interleaving:
//!
//! - Every committed write is visible and persisted by a later save.
//! - Concurrent first reads of an absent key populate it exactly once.
//! - The write mark never passes the set mark.

use std::sync::{Arc, Barrier};
use std::thread;

use confkit_core::{decode_document, ConfigValue, Encoding};
use confkit_store::{ConfigStore, MemoryMedium, StoreLocation};

fn memory_store(medium: &MemoryMedium) -> Arc<ConfigStore> {
    Arc::new(
        ConfigStore::builder(StoreLocation::Named("concurrent".to_string()))
            .medium(medium.clone())
            .open()
            .expect("open"),
    )
}

#[test]
fn test_concurrent_writers_and_savers_persist_final_state() {
    // Arrange
    let medium = MemoryMedium::new();
    let store = memory_store(&medium);
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    // Act – each thread owns one key and saves after every write
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..50_i64 {
                    store.put(&format!("key{t}"), i).expect("put");
                    store.save().expect("save");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread panicked");
    }
    store.save().expect("final save");

    // Assert
    assert_eq!(store.write_mark(), store.set_mark());
    let bytes = medium.contents().expect("written");
    let doc = decode_document(&bytes, &Encoding::Plain).expect("decode");
    for t in 0..threads {
        assert_eq!(doc.get(&format!("key{t}")), Some(&ConfigValue::Int(49)));
    }
}

#[test]
fn test_concurrent_first_reads_populate_once() {
    // Arrange
    let store = memory_store(&MemoryMedium::new());
    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));

    // Act
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store.get("shared", 7_i32)
            })
        })
        .collect();
    let results: Vec<i32> = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .collect();

    // Assert
    assert!(results.iter().all(|v| *v == 7));
    assert_eq!(store.set_mark(), 1, "the default is stored exactly once");
}

#[test]
fn test_readers_never_see_write_mark_ahead_of_set_mark() {
    // Arrange
    let store = memory_store(&MemoryMedium::new());
    let writer_store = Arc::clone(&store);

    // Act
    let writer = thread::spawn(move || {
        for i in 0..200_i32 {
            writer_store.put("counter", i).expect("put");
            if i % 10 == 0 {
                writer_store.save().expect("save");
            }
        }
    });
    for _ in 0..200 {
        let write = store.write_mark();
        let set = store.set_mark();
        assert!(write <= set, "write mark {write} ahead of set mark {set}");
        let _ = store.get("counter", 0_i32);
    }
    writer.join().expect("writer panicked");

    // Assert
    assert_eq!(store.get("counter", 0_i32), 199);
}
