//! StorageHandler: the registry binding declared keys to one store.
//!
//! A configuration interface (say, "network settings") is declared as a set of
//! [`KeyDescriptor`]s.  Registering each one with a [`StorageHandler`] yields a
//! typed [`KeyHandler`] that reads and writes the shared [`ConfigStore`].
//!
//! ```rust
//! use std::sync::Arc;
//! use confkit_core::KeyDescriptor;
//! use confkit_store::application::StorageHandler;
//! use confkit_store::infrastructure::medium::MemoryMedium;
//! use confkit_store::infrastructure::storage::{ConfigStore, StoreLocation};
//!
//! let store = ConfigStore::builder(StoreLocation::Named("net".into()))
//!     .medium(MemoryMedium::new())
//!     .open()
//!     .unwrap();
//! let storage = StorageHandler::new("net", Arc::new(store));
//! let retries = storage
//!     .register(KeyDescriptor::<i32>::new("retries").default_value(3).int_range(0, 5))
//!     .unwrap();
//!
//! assert_eq!(retries.get_value(), 3);
//! assert!(retries.set_value(10).is_err());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use confkit_core::{ConfigType, ConfigValue, KeyDescriptor, SchemaError, SettingType};

use crate::application::events::{ConfigEventSink, EventSender};
use crate::application::key_handler::{AnyKeyHandler, KeyHandler};
use crate::error::{ConfigError, StoreError};
use crate::infrastructure::storage::ConfigStore;

/// State shared between a storage handler and its key handlers.
#[derive(Debug)]
pub struct StorageCore {
    name: String,
    store: Arc<ConfigStore>,
    events: EventSender,
}

impl StorageCore {
    pub(crate) fn new(name: impl Into<String>, store: Arc<ConfigStore>) -> Self {
        Self {
            name: name.into(),
            store,
            events: EventSender::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    pub(crate) fn events(&self) -> &EventSender {
        &self.events
    }

    /// Write path for handlers; values arrive here already validated.
    pub(crate) fn put_primitive<T: ConfigType>(&self, key: &str, value: T) -> Result<bool, StoreError> {
        self.store.put(key, value)
    }
}

/// Registry of key handlers over one store.
pub struct StorageHandler {
    core: Arc<StorageCore>,
    handlers: RwLock<HashMap<String, Arc<dyn AnyKeyHandler>>>,
}

impl StorageHandler {
    pub fn new(name: impl Into<String>, store: Arc<ConfigStore>) -> Self {
        Self {
            core: Arc::new(StorageCore::new(name, store)),
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Declares a key and returns its initialized handler.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateKey`] if the key is already registered,
    /// or any declaration error from [`KeyHandler::init_handler`].
    pub fn register<T: SettingType>(
        &self,
        descriptor: KeyDescriptor<T>,
    ) -> Result<Arc<KeyHandler<T>>, SchemaError> {
        let handler = Arc::new(KeyHandler::new(descriptor, Arc::clone(&self.core)));
        handler.check_declaration()?;

        {
            let mut handlers = self.handlers.write();
            if handlers.contains_key(handler.key()) {
                return Err(SchemaError::DuplicateKey(handler.key().to_owned()));
            }
            handlers.insert(
                handler.key().to_owned(),
                Arc::clone(&handler) as Arc<dyn AnyKeyHandler>,
            );
        }
        debug!(storage = %self.core.name(), key = %handler.key(), "registered key handler");

        // Outside the registry lock: listeners may call back into this handler.
        handler.init_handler()?;
        Ok(handler)
    }

    /// Returns the typed handler registered under `key`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownKey`] or [`ConfigError::TypeMismatch`].
    pub fn handler<T: SettingType>(&self, key: &str) -> Result<Arc<KeyHandler<T>>, ConfigError> {
        let handler = self
            .dyn_handler(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_owned()))?;
        let actual = handler.variant();
        handler
            .as_any()
            .downcast::<KeyHandler<T>>()
            .map_err(|_| ConfigError::TypeMismatch {
                key: key.to_owned(),
                expected: T::type_name(),
                actual,
            })
    }

    /// Returns the handler registered under `key`, whatever its type.
    pub fn dyn_handler(&self, key: &str) -> Option<Arc<dyn AnyKeyHandler>> {
        self.handlers.read().get(key).cloned()
    }

    /// Typed read through the registered handler.
    ///
    /// # Errors
    ///
    /// See [`StorageHandler::handler`].
    pub fn get<T: SettingType>(&self, key: &str) -> Result<T, ConfigError> {
        Ok(self.handler::<T>(key)?.get_value())
    }

    /// Typed write through the registered handler.
    ///
    /// # Errors
    ///
    /// See [`StorageHandler::handler`] and [`KeyHandler::set_value`].
    pub fn set<T: SettingType>(&self, key: &str, value: T) -> Result<(), ConfigError> {
        self.handler::<T>(key)?.set_value(value)
    }

    /// Current value of `key` in its persisted form.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownKey`].
    pub fn get_raw(&self, key: &str) -> Result<ConfigValue, ConfigError> {
        self.dyn_handler(key)
            .map(|h| h.get_raw())
            .ok_or_else(|| ConfigError::UnknownKey(key.to_owned()))
    }

    /// Converts, validates, and stores a raw value for `key`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownKey`], [`ConfigError::Decode`], or anything
    /// [`KeyHandler::set_value`] returns.
    pub fn set_raw(&self, key: &str, value: &ConfigValue) -> Result<(), ConfigError> {
        self.dyn_handler(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_owned()))?
            .set_raw(value)
    }

    /// # Errors
    ///
    /// [`ConfigError::UnknownKey`] or a store failure.
    pub fn reset_to_default(&self, key: &str) -> Result<(), ConfigError> {
        self.dyn_handler(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_owned()))?
            .reset_to_default()
    }

    /// Registered keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.handlers.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.handlers.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    /// Adds a listener that hears events from every key.
    pub fn add_listener(&self, listener: Arc<dyn ConfigEventSink>) {
        self.core.events().add_listener(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn ConfigEventSink>) -> bool {
        self.core.events().remove_listener(listener)
    }

    /// Saves the underlying store if it changed.
    ///
    /// # Errors
    ///
    /// See [`ConfigStore::save`].
    pub fn save(&self) -> Result<bool, ConfigError> {
        Ok(self.core.store().save()?)
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        self.core.store()
    }

    pub fn name(&self) -> &str {
        self.core.name()
    }
}

impl std::fmt::Debug for StorageHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageHandler")
            .field("name", &self.core.name())
            .field("keys", &self.keys())
            .finish()
    }
}
