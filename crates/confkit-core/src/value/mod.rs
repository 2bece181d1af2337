//! Value module: the generic persisted representation and typed conversion.

pub mod config_value;
pub mod convert;

pub use config_value::{CachedEnum, ConfigValue, ValueKind};
pub use convert::{enum_from_value, enum_to_cached_value, enum_to_value, ConfigEnum, ConfigType};
