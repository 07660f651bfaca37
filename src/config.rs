//! Docking configuration persistence
//!
//! Stores preferences in `~/.config/dockyard/config.yaml`: which backend
//! drives the native objects, the floating title bar height, the
//! organization/application identity that scopes the layout store, and
//! defaults for newly created windows.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::backend::{BackendKind, BackendOptions, WindowFlags};
use crate::geometry::Size;

/// Organization and application names, the scope of the settings store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationIdentity {
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub application: String,
}

impl ApplicationIdentity {
    pub fn new(organization: impl Into<String>, application: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            application: application.into(),
        }
    }

    /// Both names are needed to locate the settings store, and each must be
    /// a single path segment
    pub fn is_complete(&self) -> bool {
        is_path_segment(&self.organization) && is_path_segment(&self.application)
    }
}

fn is_path_segment(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// Docking configuration that persists across sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockConfig {
    /// Widget representation backing the docking core
    #[serde(default)]
    pub backend: BackendKind,

    /// Height of the title bar drawn at the top of floating windows
    #[serde(default = "default_title_bar_height")]
    pub title_bar_height: i32,

    #[serde(default)]
    pub identity: ApplicationIdentity,

    #[serde(default = "default_main_window_size")]
    pub main_window_size: Size,

    /// Used when a panel floats without a remembered geometry
    #[serde(default = "default_floating_size")]
    pub floating_size: Size,

    /// Keep floating windows above every other window
    #[serde(default)]
    pub floating_stays_on_top: bool,
}

fn default_title_bar_height() -> i32 {
    30
}

fn default_main_window_size() -> Size {
    Size::new(1000, 700)
}

fn default_floating_size() -> Size {
    Size::new(400, 300)
}

impl Default for DockConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            title_bar_height: default_title_bar_height(),
            identity: ApplicationIdentity::default(),
            main_window_size: default_main_window_size(),
            floating_size: default_floating_size(),
            floating_stays_on_top: false,
        }
    }
}

impl DockConfig {
    pub fn backend_options(&self) -> BackendOptions {
        BackendOptions {
            title_bar_height: self.title_bar_height,
        }
    }

    /// Flags given to every floating window's native window
    pub fn floating_window_flags(&self) -> WindowFlags {
        let mut flags = WindowFlags::WINDOW | WindowFlags::TOOL | WindowFlags::FRAMELESS;
        if self.floating_stays_on_top {
            flags |= WindowFlags::STAYS_ON_TOP;
        }
        flags
    }

    /// Load config from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load config from a specific file, or return defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save config to disk
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> Result<(), String> {
        let path = crate::config_paths::config_file()
            .ok_or_else(|| "No config directory available".to_string())?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        std::fs::write(path, content)
            .map_err(|e| format!("Failed to write config to {}: {}", path.display(), e))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }
}
