// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-app connection state for native clients.

use sam_core::{AppId, BusToken};
use serde_json::{json, Value};

/// One native app's registration channel and interface version.
///
/// Version 1 clients may register at any time (or never); version 2 clients
/// get a 3-second window after launch, after which the registration is
/// expired and the channel is unusable.
#[derive(Debug, Clone)]
pub(crate) struct NativeClientInfo {
    pub app_id: AppId,
    pub pid: String,
    pub interface_version: u8,
    pub registered: bool,
    pub registration_expired: bool,
    /// Long-lived reply channel established by `registerApp`.
    pub channel: Option<BusToken>,
}

impl NativeClientInfo {
    pub fn new(app_id: AppId, interface_version: u8) -> Self {
        Self {
            app_id,
            pid: String::new(),
            interface_version,
            registered: false,
            registration_expired: false,
            channel: None,
        }
    }

    /// Record a registration, replacing any previous channel.
    pub fn register(&mut self, channel: BusToken) {
        self.channel = Some(channel);
        self.registered = true;
        self.registration_expired = false;
    }

    /// Whether events can currently be delivered to the client.
    pub fn can_send(&self) -> bool {
        self.registered && self.channel.is_some()
    }

    /// The acknowledgement sent back on `registerApp`. Version 1 clients
    /// expect `message`, version 2 clients expect `event`.
    pub fn registered_payload(&self) -> Value {
        if self.interface_version >= 2 {
            json!({ "returnValue": true, "event": "registered" })
        } else {
            json!({ "returnValue": true, "message": "registered" })
        }
    }

    /// Event payload asking a live client to bring itself forward.
    pub fn relaunch_payload(&self, params: &Value, reason: &str) -> Value {
        if self.interface_version >= 2 {
            json!({
                "returnValue": true,
                "event": "relaunch",
                "parameters": params,
                "reason": reason,
            })
        } else {
            json!({
                "returnValue": true,
                "message": "relaunch",
                "parameters": params,
            })
        }
    }

    /// Event payload asking a version-2 client to close itself.
    pub fn close_payload(&self, reason: &str) -> Value {
        json!({ "returnValue": true, "event": "close", "reason": reason })
    }

    /// Event payload asking a version-2 client to pause.
    pub fn pause_payload(&self, params: &Value) -> Value {
        json!({ "returnValue": true, "event": "pause", "parameters": params })
    }
}

#[cfg(test)]
#[path = "native_client_tests.rs"]
mod tests;
