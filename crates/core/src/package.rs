// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Installed application package records.

use crate::id::AppId;
use crate::version::AppVersion;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Declared application type from the package manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppType {
    #[serde(rename = "web")]
    Web,
    #[serde(rename = "stub")]
    Stub,
    #[serde(rename = "native")]
    Native,
    #[serde(rename = "native_builtin")]
    NativeBuiltin,
    #[serde(rename = "native_mvpd")]
    NativeMvpd,
    #[serde(rename = "native_qml")]
    NativeQml,
    #[serde(rename = "native_appshell")]
    NativeAppShell,
    #[serde(rename = "qml")]
    Qml,
}

impl AppType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppType::Web => "web",
            AppType::Stub => "stub",
            AppType::Native => "native",
            AppType::NativeBuiltin => "native_builtin",
            AppType::NativeMvpd => "native_mvpd",
            AppType::NativeQml => "native_qml",
            AppType::NativeAppShell => "native_appshell",
            AppType::Qml => "qml",
        }
    }
}

impl std::fmt::Display for AppType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which kind of install directory a package was found in.
///
/// Doubles as the precedence order when the same app id exists in several
/// directories: a higher value wins a version tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeByDir {
    SystemBuiltIn,
    SystemUpdatable,
    Store,
    ExternalStore,
    Dev,
}

impl TypeByDir {
    pub fn is_system(&self) -> bool {
        matches!(self, TypeByDir::SystemBuiltIn | TypeByDir::SystemUpdatable)
    }
}

/// Runtime family launch/close/pause are delegated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerKind {
    Web,
    Qml,
    Native,
    None,
}

impl HandlerKind {
    /// Runtime family for a declared app type. Stub packages have no runtime;
    /// they are resolved by redirection before dispatch.
    pub fn of(app_type: AppType) -> Self {
        match app_type {
            AppType::Web => HandlerKind::Web,
            AppType::Qml | AppType::NativeQml => HandlerKind::Qml,
            AppType::Native
            | AppType::NativeBuiltin
            | AppType::NativeMvpd
            | AppType::NativeAppShell => HandlerKind::Native,
            AppType::Stub => HandlerKind::None,
        }
    }
}

/// Window-group participation declared by the package.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowGroup {
    pub enabled: bool,
    pub is_owner: bool,
}

/// Stub-package redirection target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Redirection {
    pub id: AppId,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

/// One installed application. Owned by the roster; immutable after
/// construction except for `locked` and `flagged_for_removal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppPackage {
    #[serde(rename = "id")]
    pub app_id: AppId,
    pub folder_path: PathBuf,
    #[serde(rename = "type")]
    pub app_type: AppType,
    pub type_by_dir: TypeByDir,
    /// URI of the entry point (HTML for web, main QML file, or executable).
    pub main: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub version: AppVersion,
    #[serde(default)]
    pub trust_level: String,
    #[serde(default)]
    pub default_window_type: String,
    #[serde(default)]
    pub window_group: WindowGroup,
    #[serde(default = "default_true")]
    pub removable: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub builtin_based: bool,
    #[serde(default = "default_true")]
    pub splash_on_launch: bool,
    #[serde(default)]
    pub spinner_on_launch: bool,
    /// Kilobytes the app declares it needs before launch is admitted.
    #[serde(default)]
    pub required_memory: u32,
    #[serde(default = "default_interface_version")]
    pub native_interface_version: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirection: Option<Redirection>,
    /// Set while the installer holds the package; launches are rejected.
    #[serde(default)]
    pub locked: bool,
    /// Set when the package is going away; it loses every conflict and its
    /// running info is removed once the instance stops.
    #[serde(default)]
    pub flagged_for_removal: bool,
}

fn default_true() -> bool {
    true
}

fn default_interface_version() -> u8 {
    1
}

impl AppPackage {
    /// Runtime family this package is handled by.
    pub fn handler_kind(&self) -> HandlerKind {
        HandlerKind::of(self.app_type)
    }

    pub fn is_dev(&self) -> bool {
        self.type_by_dir == TypeByDir::Dev
    }

    /// Whether this candidate should replace `incumbent` in the roster.
    ///
    /// A removal-flagged incumbent always loses. A non-dev incumbent never
    /// loses to a dev candidate of any version. Otherwise the higher version
    /// wins, and on equal versions the higher directory priority wins.
    pub fn outranks(&self, incumbent: &AppPackage) -> bool {
        if incumbent.flagged_for_removal {
            return true;
        }
        if incumbent.type_by_dir != TypeByDir::Dev && self.type_by_dir == TypeByDir::Dev {
            return false;
        }
        match self.version.cmp(&incumbent.version) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => self.type_by_dir > incumbent.type_by_dir,
        }
    }

    /// Serialize the full appinfo payload used at the bus boundary.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Project selected properties out of a serialized appinfo object.
///
/// Keys absent from the appinfo are reported under `"notSpecified"`. The
/// `"id"` key is always included.
pub fn project_props(appinfo: &Value, properties: &[String]) -> Value {
    let mut out = serde_json::Map::new();
    let mut missing: Vec<Value> = Vec::new();

    if let Some(id) = appinfo.get("id") {
        out.insert("id".to_string(), id.clone());
    }

    for key in properties {
        if key == "id" || out.contains_key(key) {
            continue;
        }
        match appinfo.get(key) {
            Some(value) => {
                out.insert(key.clone(), value.clone());
            }
            None => {
                let entry = Value::String(key.clone());
                if !missing.contains(&entry) {
                    missing.push(entry);
                }
            }
        }
    }

    if !missing.is_empty() {
        out.insert("notSpecified".to_string(), Value::Array(missing));
    }

    Value::Object(out)
}

/// Kind of roster change reported for one app id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Updated,
    Removed,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Updated => "updated",
            ChangeKind::Removed => "removed",
        }
    }
}

/// One roster delta, fanned out to `listApps` subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterChange {
    pub app_id: AppId,
    pub change: ChangeKind,
    pub reason: String,
}

#[cfg(test)]
#[path = "package_tests.rs"]
mod tests;
