// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Package version triples.

use serde::{Deserialize, Serialize};

/// Application version, ordered lexicographically on (major, minor, micro).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AppVersion {
    pub major: u16,
    pub minor: u16,
    pub micro: u16,
}

impl AppVersion {
    pub const fn new(major: u16, minor: u16, micro: u16) -> Self {
        Self { major, minor, micro }
    }

    /// Lenient parse of a `"major.minor.micro"` string.
    ///
    /// Missing segments default to 0. An unparseable leading segment yields
    /// the default version, matching how packages without a usable version
    /// field are ingested.
    pub fn parse(s: &str) -> Self {
        let mut parts = s.trim().split('.');
        let major = match parts.next().and_then(|p| p.parse::<u16>().ok()) {
            Some(v) => v,
            None => return Self::default(),
        };
        let minor = parts.next().and_then(|p| p.parse::<u16>().ok()).unwrap_or(0);
        let micro = parts.next().and_then(|p| p.parse::<u16>().ok()).unwrap_or(0);
        Self { major, minor, micro }
    }
}

impl Default for AppVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

impl std::fmt::Display for AppVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)
    }
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
