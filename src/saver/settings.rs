//! Persistent key/value settings store
//!
//! Layouts are stored as raw bytes under a group and a key, scoped per
//! organization and application. [`FileSettings`] keeps one JSON file per
//! application under a settings root; [`MemorySettings`] is for tests and
//! embedding.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::ApplicationIdentity;
use crate::error::SettingsError;

/// Group the layout is written under
pub const LAYOUT_GROUP: &str = "KDDockWidgets::LayoutSaver";

/// Key of the serialized layout inside [`LAYOUT_GROUP`]
pub const LAYOUT_KEY: &str = "data";

pub trait SettingsStore {
    fn value(&self, group: &str, key: &str) -> Option<Vec<u8>>;

    fn set_value(&mut self, group: &str, key: &str, value: &[u8]) -> Result<(), SettingsError>;
}

type Groups = BTreeMap<String, BTreeMap<String, Vec<u8>>>;

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    groups: Groups,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn value(&self, group: &str, key: &str) -> Option<Vec<u8>> {
        self.groups.get(group)?.get(key).cloned()
    }

    fn set_value(&mut self, group: &str, key: &str, value: &[u8]) -> Result<(), SettingsError> {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    groups: Groups,
}

/// JSON file at `<root>/<organization>/<application>.json`, written through
/// on every change
#[derive(Debug)]
pub struct FileSettings {
    path: PathBuf,
    groups: Groups,
}

impl FileSettings {
    /// Open the store for `identity` under `root`. A missing file is an
    /// empty store; a malformed one is an error.
    pub fn open(root: &Path, identity: &ApplicationIdentity) -> Result<Self, SettingsError> {
        if !identity.is_complete() {
            return Err(SettingsError::InvalidIdentity {
                organization: identity.organization.clone(),
                application: identity.application.clone(),
            });
        }
        Self::open_file(crate::config_paths::settings_file(root, identity))
    }

    /// Open the store under [`crate::config_paths::settings_dir`]
    pub fn open_default(identity: &ApplicationIdentity) -> Result<Self, SettingsError> {
        let root = crate::config_paths::settings_dir().ok_or(SettingsError::NoSettingsDir)?;
        Self::open(&root, identity)
    }

    pub fn open_file(path: PathBuf) -> Result<Self, SettingsError> {
        if !path.exists() {
            tracing::debug!("Settings file not found at {}, starting empty", path.display());
            return Ok(Self {
                path,
                groups: Groups::new(),
            });
        }

        let content = std::fs::read_to_string(&path).map_err(|source| SettingsError::Io {
            path: path.clone(),
            source,
        })?;
        let file: SettingsFile =
            serde_json::from_str(&content).map_err(|source| SettingsError::Json {
                path: path.clone(),
                source,
            })?;

        tracing::debug!("Loaded settings from {}", path.display());
        Ok(Self {
            path,
            groups: file.groups,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), SettingsError> {
        let io_error = |source| SettingsError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        let file = SettingsFile {
            groups: self.groups.clone(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|source| SettingsError::Json {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, json).map_err(io_error)?;

        tracing::debug!("Saved settings to {}", self.path.display());
        Ok(())
    }
}

impl SettingsStore for FileSettings {
    fn value(&self, group: &str, key: &str) -> Option<Vec<u8>> {
        self.groups.get(group)?.get(key).cloned()
    }

    fn set_value(&mut self, group: &str, key: &str, value: &[u8]) -> Result<(), SettingsError> {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(key.to_string(), value.to_vec());
        self.flush()
    }
}
