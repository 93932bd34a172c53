// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier newtypes shared across the tree.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Installed application identifier.
///
/// Matches the application's install directory name (reverse-DNS by
/// convention). Cheap to clone; short ids are stored inline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(SmolStr);

impl AppId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(SmolStr::new(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for AppId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AppId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AppId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl std::borrow::Borrow<str> for AppId {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for AppId {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for AppId {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Logical output surface an app instance is shown on.
///
/// Keys the running-info table alongside the app id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayId(SmolStr);

impl DisplayId {
    pub const DEFAULT: &'static str = "default";

    pub fn new(id: impl AsRef<str>) -> Self {
        let id = id.as_ref();
        if id.is_empty() {
            Self::default()
        } else {
            Self(SmolStr::new(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DisplayId {
    fn default() -> Self {
        Self(SmolStr::new_static(Self::DEFAULT))
    }
}

impl std::fmt::Display for DisplayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DisplayId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Unique id of one in-flight launch request.
///
/// Random per request; stable while the item travels through the prelaunch
/// pipeline, the memory checker, and the runtime handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LaunchUid(String);

impl LaunchUid {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn from_string(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LaunchUid {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LaunchUid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token identifying an outstanding bus call or an inbound bus message.
///
/// Zero means "no call outstanding".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusToken(pub u64);

impl BusToken {
    pub const NONE: BusToken = BusToken(0);

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for BusToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
