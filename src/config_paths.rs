//! Centralized configuration paths for dockyard
//!
//! All files live under:
//! - Unix/macOS: `~/.config/dockyard/`
//! - Windows: `%APPDATA%\dockyard\`
//!
//! This module is the single source of truth for config paths.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::config::ApplicationIdentity;

const APP_DIR: &str = "dockyard";

/// Base config directory for dockyard
///
/// Unix/macOS:
///   - If XDG_CONFIG_HOME is set: `$XDG_CONFIG_HOME/dockyard`
///   - Else: `~/.config/dockyard`
///
/// Windows:
///   - `%APPDATA%\dockyard`
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join(APP_DIR))
    }

    #[cfg(not(target_os = "windows"))]
    {
        env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .map(|config| config.join(APP_DIR))
    }
}

/// `~/.config/dockyard/config.yaml`
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.yaml"))
}

/// `~/.config/dockyard/settings/`, root of the per-application layout stores
pub fn settings_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("settings"))
}

/// `<root>/<organization>/<application>.json`
pub fn settings_file(root: &Path, identity: &ApplicationIdentity) -> PathBuf {
    root.join(&identity.organization)
        .join(format!("{}.json", identity.application))
}

/// `~/.config/dockyard/logs/`
pub fn logs_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("logs"))
}

fn ensure_dir(path: &Path) -> Result<(), String> {
    fs::create_dir_all(path)
        .map_err(|e| format!("Failed to create directory {}: {}", path.display(), e))
}

/// Create the logs directory if needed, returning it
pub fn ensure_logs_dir() -> Result<PathBuf, String> {
    let logs = logs_dir().ok_or_else(|| "No config directory available".to_string())?;
    ensure_dir(&logs)?;
    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_file_is_scoped_by_identity() {
        let identity = ApplicationIdentity {
            organization: "KDAB".to_string(),
            application: "dock demo".to_string(),
        };
        assert_eq!(
            settings_file(Path::new("/tmp/root"), &identity),
            PathBuf::from("/tmp/root/KDAB/dock demo.json")
        );
    }
}
