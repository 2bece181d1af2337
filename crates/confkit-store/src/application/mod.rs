//! Application layer: typed key handlers over a configuration store.
//!
//! # What is the "application" layer? (for beginners)
//!
//! The infrastructure layer knows how to keep untyped values in a map and
//! write them to disk.  This layer turns that into something a program can
//! declare and use safely:
//!
//! - **`storage_handler`** – [`StorageHandler`], the registry that binds a set
//!   of declared keys to one store and hands out typed handlers.
//!
//! - **`key_handler`** – [`KeyHandler<T>`], the typed facade over one key:
//!   default resolution, constraint validation, change notification.
//!
//! - **`events`** – [`ConfigEvent`] and the [`ConfigEventSink`] trait that UI
//!   or logging collaborators implement to observe changes.
//!
//! Nothing here touches the file system directly; all persistence goes
//! through [`crate::infrastructure::storage::ConfigStore`].

pub mod events;
pub mod key_handler;
pub mod storage_handler;

pub use events::{ConfigEvent, ConfigEventSink, EventSender};
pub use key_handler::{AnyKeyHandler, KeyHandler};
pub use storage_handler::{StorageCore, StorageHandler};
