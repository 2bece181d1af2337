//! The concurrent, file-backed key-value store.
//!
//! # How a store works (for beginners)
//!
//! A [`ConfigStore`] is an in-memory map from key to [`ConfigValue`] plus the
//! bookkeeping needed to write it back to disk only when something changed:
//!
//! 1. **Open** – the seed document (bundled defaults, optional) is loaded
//!    first, then the file on the backing medium.  Entries from the file win.
//!    Neither load counts as a change.
//! 2. **Read** – `get` takes the read lock, decodes the stored value to the
//!    caller's type, and falls back to the caller's default when the key is
//!    absent or undecodable.  With auto-populate on, that default is written
//!    into the map so the next save persists it.
//! 3. **Write** – `put` takes the write lock.  Writing a value equal to the
//!    stored one (in its persisted form) is not a change and leaves the store
//!    clean.
//! 4. **Save** – `save` compares the dirty marks and skips the I/O entirely
//!    when nothing changed since the last save.
//!
//! # Locking
//!
//! One `parking_lot::RwLock` guards the map.  Every mutation (including the
//! bulk loads at open time and the auto-populate write) takes the writer lock
//! and bumps the set mark while holding it, so a snapshot taken under the read
//! lock always matches the set mark read with it.  The medium write in `save`
//! happens outside the map lock; a separate I/O mutex keeps concurrent saves
//! from writing their snapshots out of order.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use confkit_core::{
    decode_document, encode_document, CodecError, ConfigType, ConfigValue, DirtyMarks, Document,
    Encoding,
};

use crate::error::StoreError;
use crate::infrastructure::medium::{BackingMedium, FileMedium};
use crate::infrastructure::storage::settings::StoreSettings;

// ── Location and builder ──────────────────────────────────────────────────────

/// Where a store's backing file lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// An explicit file path.
    File(PathBuf),
    /// A logical name resolved to `<config dir>/cfg/<name>.<ext>`.
    Named(String),
}

impl StoreLocation {
    fn store_name(&self) -> String {
        match self {
            StoreLocation::File(path) => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            StoreLocation::Named(name) => name.clone(),
        }
    }
}

/// Configures and opens a [`ConfigStore`].
pub struct ConfigStoreBuilder {
    location: StoreLocation,
    encoding: Encoding,
    seed: Option<Vec<u8>>,
    settings: StoreSettings,
    medium: Option<Box<dyn BackingMedium>>,
}

impl ConfigStoreBuilder {
    fn new(location: StoreLocation) -> Self {
        Self {
            location,
            encoding: Encoding::Plain,
            seed: None,
            settings: StoreSettings::default(),
            medium: None,
        }
    }

    /// Sets the document encoding (plain by default).
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Bundled default document, encoded like the backing file.
    ///
    /// Loaded before the file so entries on disk override it.
    pub fn seed(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.seed = Some(bytes.into());
        self
    }

    /// Applies engine settings (directory, auto-populate, enum cache).
    pub fn with_settings(mut self, settings: StoreSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn auto_populate(mut self, enabled: bool) -> Self {
        self.settings.auto_populate = enabled;
        self
    }

    pub fn enum_cache(mut self, enabled: bool) -> Self {
        self.settings.enum_cache = enabled;
        self
    }

    /// Overrides the config dir named stores resolve against.
    pub fn config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.settings.config_dir = Some(dir.into());
        self
    }

    /// Replaces the file medium, e.g. with an in-memory one.
    pub fn medium(mut self, medium: impl BackingMedium + 'static) -> Self {
        self.medium = Some(Box::new(medium));
        self
    }

    /// Opens the store, loading the seed and then the backing document.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Settings`] if a named location cannot be resolved.
    /// - [`StoreError::Io`] if the backing medium exists but cannot be read.
    ///
    /// A missing file opens an empty store.  A corrupt seed or document is
    /// logged and skipped rather than failing the open.
    pub fn open(self) -> Result<ConfigStore, StoreError> {
        let name = self.location.store_name();
        let medium = match self.medium {
            Some(medium) => medium,
            None => {
                let path = match &self.location {
                    StoreLocation::File(path) => path.clone(),
                    StoreLocation::Named(name) => self.settings.store_path(name, &self.encoding)?,
                };
                Box::new(FileMedium::new(path))
            }
        };

        let store = ConfigStore {
            name,
            entries: RwLock::new(Document::new()),
            marks: DirtyMarks::new(),
            encoding: self.encoding,
            medium,
            io_lock: Mutex::new(()),
            auto_populate: AtomicBool::new(self.settings.auto_populate),
            enum_cache: AtomicBool::new(self.settings.enum_cache),
            closed: AtomicBool::new(false),
        };

        if let Some(seed) = self.seed {
            match decode_document(&seed, &store.encoding) {
                Ok(doc) => {
                    debug!(store = %store.name, entries = doc.len(), "loaded seed document");
                    store.put_all(doc);
                }
                Err(e) => warn!(store = %store.name, error = %e, "ignoring unreadable seed document"),
            }
        }

        let location = store.medium.location();
        match store.medium.read() {
            Ok(Some(bytes)) => match decode_document(&bytes, &store.encoding) {
                Ok(doc) => {
                    debug!(path = %location.display(), entries = doc.len(), "loaded stored document");
                    store.put_all(doc);
                }
                Err(e) => warn!(
                    path = %location.display(),
                    error = %e,
                    "ignoring unreadable configuration document"
                ),
            },
            Ok(None) => debug!(path = %location.display(), "no stored document yet"),
            Err(source) => {
                return Err(StoreError::Io {
                    path: location,
                    source,
                })
            }
        }

        info!(
            store = %store.name,
            path = %location.display(),
            entries = store.size(),
            plain = store.encoding.is_plain(),
            "configuration store opened"
        );
        Ok(store)
    }
}

// ── ConfigStore ───────────────────────────────────────────────────────────────

/// In-memory configuration map with dirty tracking and on-demand persistence.
///
/// `ConfigStore` is `Send + Sync`; share it with `Arc`.
pub struct ConfigStore {
    name: String,
    entries: RwLock<Document>,
    marks: DirtyMarks,
    encoding: Encoding,
    medium: Box<dyn BackingMedium>,
    io_lock: Mutex<()>,
    auto_populate: AtomicBool,
    enum_cache: AtomicBool,
    closed: AtomicBool,
}

impl ConfigStore {
    /// Starts building a store at `location`.
    pub fn builder(location: StoreLocation) -> ConfigStoreBuilder {
        ConfigStoreBuilder::new(location)
    }

    /// Opens a plain store backed by the file at `path`.
    ///
    /// # Errors
    ///
    /// See [`ConfigStoreBuilder::open`].
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::builder(StoreLocation::File(path.into())).open()
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    /// Reads `key` as `T`, falling back to `default`.
    ///
    /// Never fails.  When the key is absent, or its stored value cannot be
    /// decoded as `T`, the default is returned; with auto-populate on, the
    /// default is also stored so the next save persists it.  An empty key or
    /// a closed store returns the default without storing anything.
    pub fn get<T: ConfigType>(&self, key: &str, default: T) -> T {
        if key.is_empty() || self.is_closed() {
            return default;
        }

        let stored = self.entries.read().get(key).cloned();
        let Some(stored) = stored else {
            if self.is_auto_populate() {
                self.populate(key, None, &default);
            }
            return default;
        };

        match T::from_value(&stored) {
            Ok(value) => {
                if self.is_enum_cache_enabled() {
                    self.cache_resolved(key, &stored, value.to_cached_value());
                }
                value
            }
            Err(e) => {
                warn!(
                    store = %self.name,
                    key,
                    expected = T::type_name(),
                    error = %e,
                    "stored value cannot be decoded, using default"
                );
                if self.is_auto_populate() {
                    self.populate(key, Some(&stored), &default);
                }
                default
            }
        }
    }

    /// Returns a copy of the raw stored value.
    pub fn get_raw(&self, key: &str) -> Option<ConfigValue> {
        self.entries.read().get(key).cloned()
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn size(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns all keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Returns a copy of the whole map.
    pub fn snapshot(&self) -> Document {
        self.entries.read().clone()
    }

    /// Renders the map as pretty JSON (sorted keys), for diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Codec`] if the map cannot be rendered.
    pub fn to_json_string(&self) -> Result<String, StoreError> {
        let bytes = encode_document(&self.entries.read(), &Encoding::Plain)?;
        String::from_utf8(bytes)
            .map_err(|e| StoreError::Codec(CodecError::MalformedDocument(e.to_string())))
    }

    // ── Mutations ─────────────────────────────────────────────────────────

    /// Stores a typed value.
    ///
    /// Enums are stored as their cached constant when the enum cache is on
    /// and as their name otherwise.  Returns whether the persisted form
    /// changed.
    ///
    /// # Errors
    ///
    /// See [`ConfigStore::put_value`].
    pub fn put<T: ConfigType>(&self, key: &str, value: T) -> Result<bool, StoreError> {
        self.put_value(key, self.in_memory_form(&value))
    }

    /// Stores a raw value; returns whether the persisted form changed.
    ///
    /// Writing a value equal to the stored one (element-wise for arrays,
    /// bit-wise for floats) does not mark the store dirty.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidKey`] for an empty key.
    /// - [`StoreError::Closed`] after [`ConfigStore::close`].
    /// - [`StoreError::Codec`] for values that cannot be persisted (non-finite
    ///   floats, mixed arrays).
    pub fn put_value(&self, key: &str, value: ConfigValue) -> Result<bool, StoreError> {
        self.check_writable(key)?;
        value.check_persistable()?;

        let mut entries = self.entries.write();
        let changed = entries
            .get(key)
            .map_or(true, |old| !old.same_persisted(&value));
        entries.insert(key.to_owned(), value);
        if changed {
            let mark = self.marks.mark_dirty();
            debug!(store = %self.name, key, mark, "value changed");
        }
        Ok(changed)
    }

    /// Removes `key`, returning its previous value.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidKey`] for an empty key, [`StoreError::Closed`]
    /// after close.
    pub fn remove(&self, key: &str) -> Result<Option<ConfigValue>, StoreError> {
        self.check_writable(key)?;
        if !self.has_key(key) {
            return Ok(None);
        }
        let mut entries = self.entries.write();
        let removed = entries.remove(key);
        if removed.is_some() {
            self.marks.mark_dirty();
            debug!(store = %self.name, key, "value removed");
        }
        Ok(removed)
    }

    /// Removes every entry.
    ///
    /// # Errors
    ///
    /// [`StoreError::Closed`] after close.
    pub fn clear(&self) -> Result<(), StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        let mut entries = self.entries.write();
        entries.clear();
        self.marks.mark_dirty();
        debug!(store = %self.name, "store cleared");
        Ok(())
    }

    /// Writes the map to the backing medium if it changed since the last save.
    ///
    /// Returns `Ok(false)` without I/O when the store is clean (or another
    /// thread is already saving the same changes).  When the write fails the
    /// write mark is rolled back, so the next call retries.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Closed`] after [`ConfigStore::close`].
    /// - [`StoreError::Codec`] if the document cannot be encoded.
    /// - [`StoreError::Io`] if the medium write fails.
    pub fn save(&self) -> Result<bool, StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        let Some(previous) = self.marks.claim() else {
            return Ok(false);
        };

        let _io = self.io_lock.lock();
        let (encoded, snapshot_mark) = {
            let entries = self.entries.read();
            (
                encode_document(&entries, &self.encoding),
                self.marks.set_mark(),
            )
        };
        self.marks.publish(snapshot_mark);

        let result = encoded.map_err(StoreError::from).and_then(|bytes| {
            self.medium.write(&bytes).map_err(|source| StoreError::Io {
                path: self.medium.location(),
                source,
            })
        });

        match result {
            Ok(()) => {
                debug!(store = %self.name, mark = snapshot_mark, "configuration saved");
                Ok(true)
            }
            Err(e) => {
                self.marks.rollback(snapshot_mark, previous);
                error!(store = %self.name, error = %e, "failed to save configuration");
                Err(e)
            }
        }
    }

    /// Marks the store closed; later mutations and saves fail.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        debug!(store = %self.name, "store closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    // ── Marks and options ─────────────────────────────────────────────────

    pub fn set_mark(&self) -> u64 {
        self.marks.set_mark()
    }

    pub fn write_mark(&self) -> u64 {
        self.marks.write_mark()
    }

    /// Returns `true` when a save would write.
    pub fn is_dirty(&self) -> bool {
        !self.marks.is_clean()
    }

    pub fn set_auto_populate(&self, enabled: bool) {
        self.auto_populate.store(enabled, Ordering::SeqCst);
    }

    pub fn is_auto_populate(&self) -> bool {
        self.auto_populate.load(Ordering::SeqCst)
    }

    pub fn set_enum_cache_enabled(&self, enabled: bool) {
        self.enum_cache.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enum_cache_enabled(&self) -> bool {
        self.enum_cache.load(Ordering::SeqCst)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the backing medium.
    pub fn location(&self) -> PathBuf {
        self.medium.location()
    }

    pub fn is_plain(&self) -> bool {
        self.encoding.is_plain()
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn check_writable(&self, key: &str) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey);
        }
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    fn in_memory_form<T: ConfigType>(&self, value: &T) -> ConfigValue {
        if self.is_enum_cache_enabled() {
            value.to_cached_value()
        } else {
            value.to_value()
        }
    }

    /// Bulk load at open time: no dirty mark.
    fn put_all(&self, document: Document) {
        self.entries.write().extend(document);
    }

    /// Stores `default` for `key` if the entry still equals `expected`.
    ///
    /// `expected == None` means "still absent".  A concurrent `put` between
    /// the read and this write therefore wins over the default.
    fn populate<T: ConfigType>(&self, key: &str, expected: Option<&ConfigValue>, default: &T) {
        let value = self.in_memory_form(default);
        if let Err(e) = value.check_persistable() {
            warn!(store = %self.name, key, error = %e, "default value cannot be stored");
            return;
        }

        let mut entries = self.entries.write();
        if entries.get(key) != expected {
            return;
        }
        let changed = expected.map_or(true, |old| !old.same_persisted(&value));
        entries.insert(key.to_owned(), value);
        if changed {
            self.marks.mark_dirty();
            debug!(store = %self.name, key, "stored default value");
        }
    }

    /// Replaces a stored name with its resolved enum constant.
    ///
    /// The persisted form is identical, so the store stays clean.
    fn cache_resolved(&self, key: &str, stored: &ConfigValue, resolved: ConfigValue) {
        if !holds_cached_enum(&resolved)
            || resolved == *stored
            || !resolved.same_persisted(stored)
        {
            return;
        }
        let mut entries = self.entries.write();
        if entries.get(key) == Some(stored) {
            entries.insert(key.to_owned(), resolved);
        }
    }
}

fn holds_cached_enum(value: &ConfigValue) -> bool {
    match value {
        ConfigValue::Enum(_) => true,
        ConfigValue::Array(items) => items.iter().any(holds_cached_enum),
        _ => false,
    }
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("name", &self.name)
            .field("location", &self.medium.location())
            .field("plain", &self.encoding.is_plain())
            .field("entries", &self.size())
            .field("set_mark", &self.marks.set_mark())
            .field("write_mark", &self.marks.write_mark())
            .field("closed", &self.is_closed())
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
