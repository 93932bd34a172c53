// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon settings.
//!
//! Loaded once at startup from a TOML file; loading completion is the
//! "settings" startup prerequisite. Filesystem package scanning lives
//! elsewhere; the daemon only consumes a pre-built package index file.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad settings file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    /// Directory holding the per-service bus sockets.
    pub socket_dir: PathBuf,
    /// Directory for persisted state (the deleted-system-apps file).
    pub state_dir: PathBuf,
    /// Whether the `/dev` category is registered.
    pub dev_mode: bool,
    /// Locale precedence for `$`-prefixed asset references.
    pub locale_fallbacks: Vec<String>,
    /// Apps the web runtime keeps alive in the background on close.
    pub keep_alive_apps: Vec<String>,
    /// Peer service names.
    pub web_runtime_service: String,
    pub booster_service: String,
    pub boot_service: String,
    /// Pre-built package index consumed as the boot scan result.
    pub apps_index: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            socket_dir: PathBuf::from("/run/sam"),
            state_dir: PathBuf::from("/var/lib/sam"),
            dev_mode: false,
            locale_fallbacks: vec!["en".to_string()],
            keep_alive_apps: Vec::new(),
            web_runtime_service: "com.palm.webappmanager".to_string(),
            booster_service: "com.webos.booster".to_string(),
            boot_service: "com.webos.bootmanager".to_string(),
            apps_index: None,
        }
    }
}

impl Settings {
    /// Read the settings file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let mut settings = match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str::<Settings>(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no settings file, using defaults");
                Settings::default()
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(dir) = crate::env::socket_dir_override() {
            settings.socket_dir = dir;
        }
        if let Some(dir) = crate::env::state_dir_override() {
            settings.state_dir = dir;
        }
        Ok(settings)
    }

    pub fn deleted_list_path(&self) -> PathBuf {
        self.state_dir.join("deleted-system-apps.json")
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
