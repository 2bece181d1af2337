//! TOML-based settings for the configuration engine itself.
//!
//! [`StoreSettings`] decides where named stores live and which store options
//! are on by default.  It is read from a small TOML file:
//!
//! ```toml
//! app_name = "my-tool"
//! config_dir = "/etc/my-tool"
//! auto_populate = true
//! enum_cache = false
//! ```
//!
//! # Serde default values
//!
//! Every field is optional.  Fields annotated with
//! `#[serde(default = "some_fn")]` use the return value of `some_fn()` when the
//! field is absent, so an empty file (or no file at all) yields the defaults.
//!
//! # Where named stores live
//!
//! A store opened by name resolves to `<config dir>/cfg/<name>.json` (plain)
//! or `<config dir>/cfg/<name>.ejs` (encrypted).  The config dir is the
//! `config_dir` override when set, otherwise the platform directory:
//!
//! - Windows:  `%APPDATA%\<app_name>`
//! - Linux:    `$XDG_CONFIG_HOME/<app_name>` or `~/.config/<app_name>`
//! - macOS:    `~/Library/Application Support/<app_name>`

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use confkit_core::Encoding;

/// Sub-directory of the config dir that holds named stores.
pub const STORE_SUBDIR: &str = "cfg";

/// Error type for settings file operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The settings could not be serialized to TOML.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Settings schema ───────────────────────────────────────────────────────────

/// Engine-level defaults applied to every store opened with them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreSettings {
    /// Application directory name under the platform config dir.
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// Overrides the platform config dir entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_dir: Option<PathBuf>,
    /// Whether an absent key is written back on first read.
    #[serde(default = "default_true")]
    pub auto_populate: bool,
    /// Whether resolved enum constants replace their stored names in memory.
    #[serde(default)]
    pub enum_cache: bool,
}

fn default_app_name() -> String {
    "confkit".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            config_dir: None,
            auto_populate: default_true(),
            enum_cache: false,
        }
    }
}

impl StoreSettings {
    /// Parses settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Parse`] if the TOML is malformed.
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads settings from `path`, returning the defaults if the file does
    /// not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Io`] for file-system errors other than "not
    /// found", and [`SettingsError::Parse`] if the TOML is malformed.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(SettingsError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Persists the settings to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Io`] for file-system failures or
    /// [`SettingsError::Serialize`] if serialization fails.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| SettingsError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolves the directory named stores are rooted in.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::NoPlatformConfigDir`] when no override is set
    /// and the platform base directory cannot be determined.
    pub fn config_dir(&self) -> Result<PathBuf, SettingsError> {
        match &self.config_dir {
            Some(dir) => Ok(dir.clone()),
            None => platform_config_dir(&self.app_name).ok_or(SettingsError::NoPlatformConfigDir),
        }
    }

    /// Resolves the file path of the store called `name`.
    ///
    /// # Errors
    ///
    /// Same as [`StoreSettings::config_dir`].
    pub fn store_path(&self, name: &str, encoding: &Encoding) -> Result<PathBuf, SettingsError> {
        Ok(named_store_path(&self.config_dir()?, name, encoding))
    }
}

/// Builds `<dir>/cfg/<name>.<ext>` for a named store.
pub fn named_store_path(dir: &Path, name: &str, encoding: &Encoding) -> PathBuf {
    dir.join(STORE_SUBDIR)
        .join(format!("{name}.{}", encoding.extension()))
}

/// Resolves the platform config directory for `app_name`.
pub fn platform_config_dir(app_name: &str) -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join(app_name))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join(app_name))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join(app_name)
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        let _ = app_name;
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use confkit_core::EncryptionKey;
    use uuid::Uuid;

    #[test]
    fn test_default_settings() {
        let settings = StoreSettings::default();
        assert_eq!(settings.app_name, "confkit");
        assert!(settings.auto_populate);
        assert!(!settings.enum_cache);
        assert!(settings.config_dir.is_none());
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let settings = StoreSettings::from_toml_str("").expect("parse");
        assert_eq!(settings, StoreSettings::default());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        // Arrange
        let text = "app_name = \"tool\"\nenum_cache = true\n";

        // Act
        let settings = StoreSettings::from_toml_str(text).expect("parse");

        // Assert
        assert_eq!(settings.app_name, "tool");
        assert!(settings.enum_cache);
        assert!(settings.auto_populate, "absent field keeps its default");
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        let result = StoreSettings::from_toml_str("auto_populate = \"maybe\"");
        assert!(matches!(result, Err(SettingsError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::env::temp_dir()
            .join(format!("confkit_settings_{}", Uuid::new_v4()))
            .join("settings.toml");
        let settings = StoreSettings::load(&path).expect("load");
        assert_eq!(settings, StoreSettings::default());
    }

    #[test]
    fn test_save_then_load_restores_settings() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("confkit_settings_{}", Uuid::new_v4()));
        let path = dir.join("settings.toml");
        let settings = StoreSettings {
            app_name: "tool".to_string(),
            config_dir: Some(dir.clone()),
            auto_populate: false,
            enum_cache: true,
        };

        // Act
        settings.save(&path).expect("save");
        let restored = StoreSettings::load(&path).expect("load");

        // Assert
        assert_eq!(restored, settings);

        // Cleanup
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_override_dir_wins_over_platform_dir() {
        let settings = StoreSettings {
            config_dir: Some(PathBuf::from("/srv/app")),
            ..StoreSettings::default()
        };
        assert_eq!(settings.config_dir().expect("dir"), PathBuf::from("/srv/app"));
    }

    #[test]
    fn test_named_store_path_uses_encoding_extension() {
        // Arrange
        let dir = Path::new("/srv/app");
        let encrypted = Encoding::Encrypted(EncryptionKey::from_bytes([1; 32]));

        // Act
        let plain = named_store_path(dir, "ui", &Encoding::Plain);
        let sealed = named_store_path(dir, "ui", &encrypted);

        // Assert
        assert_eq!(plain, PathBuf::from("/srv/app/cfg/ui.json"));
        assert_eq!(sealed, PathBuf::from("/srv/app/cfg/ui.ejs"));
    }
}
