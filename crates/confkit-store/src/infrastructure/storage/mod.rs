//! Storage infrastructure: the configuration store and its settings.
//!
//! - `config_store` holds the concurrent in-memory map, the dirty-mark save
//!   protocol, and the open-time merge of seed and on-disk documents.
//! - `settings` reads the engine's own TOML settings and resolves where named
//!   stores live on each platform.

pub mod config_store;
pub mod settings;

pub use config_store::{ConfigStore, ConfigStoreBuilder, StoreLocation};
pub use settings::{named_store_path, platform_config_dir, SettingsError, StoreSettings};
