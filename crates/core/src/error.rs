// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error codes surfaced to bus callers.

use serde_json::{json, Value};

pub const ERR_GENERAL: i32 = 1;
pub const ERR_INVALID_PAYLOAD: i32 = 2;
pub const ERR_DEPRECATED: i32 = 999;
pub const ERR_APP_LOCKED: i32 = -5;
pub const ERR_APP_NOT_FOUND: i32 = -6;
pub const ERR_NO_PERMISSION: i32 = -101;

/// A caller-visible failure: code plus human-readable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: i32,
    pub text: String,
}

impl ErrorInfo {
    pub fn new(code: i32, text: impl Into<String>) -> Self {
        Self { code, text: text.into() }
    }

    pub fn general(text: impl Into<String>) -> Self {
        Self::new(ERR_GENERAL, text)
    }

    pub fn invalid_payload(text: impl Into<String>) -> Self {
        Self::new(ERR_INVALID_PAYLOAD, text)
    }

    pub fn app_locked() -> Self {
        Self::new(ERR_APP_LOCKED, "app is locked")
    }

    pub fn app_not_found(app_id: &str) -> Self {
        Self::new(ERR_APP_NOT_FOUND, format!("app not found: {app_id}"))
    }

    pub fn no_permission(text: impl Into<String>) -> Self {
        Self::new(ERR_NO_PERMISSION, text)
    }

    pub fn deprecated() -> Self {
        Self::new(ERR_DEPRECATED, "deprecated method")
    }

    /// The standard failure reply shape.
    pub fn to_payload(&self) -> Value {
        json!({
            "returnValue": false,
            "errorCode": self.code,
            "errorText": self.text,
        })
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.text, self.code)
    }
}
