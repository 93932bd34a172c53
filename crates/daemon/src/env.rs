// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment configuration for the daemon binary.

use std::path::PathBuf;

/// Primary bus name of this service.
pub const SERVICE_NAME: &str = "com.webos.applicationManager";

/// Legacy aliases the service also answers to.
pub const COMPAT_NAMES: &[&str] = &["com.webos.service.applicationmanager"];

/// Settings file path: `SAM_CONF` or the system default.
pub fn settings_path() -> PathBuf {
    std::env::var_os("SAM_CONF")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/etc/sam/sam.toml"))
}

/// Socket directory override: `SAM_SOCKET_DIR`.
pub fn socket_dir_override() -> Option<PathBuf> {
    std::env::var_os("SAM_SOCKET_DIR").map(PathBuf::from)
}

/// State directory override: `SAM_STATE_DIR`.
pub fn state_dir_override() -> Option<PathBuf> {
    std::env::var_os("SAM_STATE_DIR").map(PathBuf::from)
}

/// Log filter: `SAM_LOG`, defaulting to `info`.
pub fn log_filter() -> String {
    std::env::var("SAM_LOG").unwrap_or_else(|_| "info".to_string())
}

/// Optional log directory for the rolling file writer: `SAM_LOG_DIR`.
pub fn log_dir() -> Option<PathBuf> {
    std::env::var_os("SAM_LOG_DIR").map(PathBuf::from)
}
