//! Domain types for confkit.
//!
//! This module contains pure configuration rules with no file-system access:
//!
//! - [`constraint`] – key descriptors, validation constraints, and the
//!   validation/schema error types.
//! - [`setting`] – per-type handler policy ([`SettingType`]).
//! - [`marks`] – the dirty-mark counters behind the save protocol.
//!
//! Code in the store crate depends on these types, never the other way round,
//! so everything here can be unit-tested without a store or a disk.

pub mod constraint;
pub mod marks;
pub mod setting;

pub use constraint::{
    Constraint, ConstraintKind, FloatRange, IntRange, KeyDescriptor, SchemaError, ValidationError,
};
pub use marks::DirtyMarks;
pub use setting::{HandlerVariant, SettingType};
