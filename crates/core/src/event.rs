// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events that drive the lifecycle engine.
//!
//! Every bus reply, handler signal, timer expiry, and task request arrives at
//! the manager as one of these. Serializes as `{"type": "domain:name", ...}`;
//! unknown type tags deserialize to `Custom`.

use crate::id::{AppId, BusToken, DisplayId, LaunchUid};
use crate::package::{AppPackage, RosterChange};
use crate::status::RuntimeStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // -- bus --
    /// Reply to an outbound one-reply call issued earlier.
    #[serde(rename = "bus:reply")]
    BusReply { token: BusToken, payload: Value },

    /// A watched bus service connected or disconnected.
    #[serde(rename = "bus:service-status")]
    ServiceStatus { service: String, connected: bool },

    // -- task intake --
    #[serde(rename = "app:launch")]
    LaunchApp {
        id: AppId,
        #[serde(default)]
        display: DisplayId,
        #[serde(default)]
        params: Value,
        /// Empty for a normal launch, else the preload reason.
        #[serde(default)]
        preload: String,
        #[serde(default)]
        keep_alive: bool,
        #[serde(default)]
        no_splash: bool,
        #[serde(default)]
        spinner: bool,
        #[serde(default)]
        caller_id: String,
        #[serde(default)]
        caller_pid: String,
        /// Inbound message to reply to once the launch resolves.
        #[serde(default)]
        reply: BusToken,
    },

    #[serde(rename = "app:close")]
    CloseApp {
        id: AppId,
        #[serde(default)]
        display: DisplayId,
        #[serde(default)]
        caller_id: String,
        #[serde(default)]
        reason: String,
        #[serde(default)]
        reply: BusToken,
    },

    #[serde(rename = "app:pause")]
    PauseApp {
        id: AppId,
        #[serde(default)]
        params: Value,
        #[serde(default)]
        reply: BusToken,
    },

    #[serde(rename = "app:close-all")]
    CloseAllApps {
        #[serde(default)]
        reason: String,
    },

    /// A native client called `registerApp`; the token is its long-lived
    /// reply channel.
    #[serde(rename = "app:register")]
    RegisterNativeApp { id: AppId, client: BusToken },

    // -- launch pipeline --
    #[serde(rename = "prelaunch:done")]
    PrelaunchDone { uid: LaunchUid },

    #[serde(rename = "memcheck:done")]
    MemoryCheckDone { uid: LaunchUid },

    #[serde(rename = "launch:done")]
    LaunchingDone { uid: LaunchUid },

    // -- handler signals --
    #[serde(rename = "life:runtime-status")]
    RuntimeStatusChanged {
        app_id: AppId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uid: Option<LaunchUid>,
        status: RuntimeStatus,
    },

    #[serde(rename = "running:added")]
    RunningAppAdded {
        app_id: AppId,
        pid: String,
        #[serde(default)]
        web_pid: String,
    },

    #[serde(rename = "running:removed")]
    RunningAppRemoved { app_id: AppId },

    // -- process --
    /// A forked native child was reaped.
    #[serde(rename = "proc:exited")]
    ProcessExited { pid: String, status: i32 },

    // -- timers --
    #[serde(rename = "timer:fired")]
    TimerFired { id: String },

    // -- roster --
    /// Full scan result handed to the roster.
    #[serde(rename = "roster:scanned")]
    RosterScanned { packages: Vec<AppPackage>, reason: String },

    /// Single-app rescan result; `None` means the app is gone from disk.
    #[serde(rename = "roster:app-scanned")]
    RosterAppScanned {
        id: AppId,
        package: Option<Box<AppPackage>>,
        reason: String,
    },

    /// Applied roster deltas, for fan-out and bookkeeping.
    #[serde(rename = "roster:updated")]
    RosterUpdated { changes: Vec<RosterChange> },

    // -- readiness --
    #[serde(rename = "ready:item")]
    PrerequisiteResolved { name: String, passed: bool },

    // -- system --
    #[serde(rename = "system:shutdown")]
    Shutdown,

    /// Catch-all for unknown event types.
    #[serde(other, skip_serializing)]
    Custom,
}

impl Event {
    /// Compact one-line description for effect logs.
    pub fn log_summary(&self) -> String {
        match self {
            Event::BusReply { token, .. } => format!("bus:reply token={token}"),
            Event::ServiceStatus { service, connected } => {
                format!("bus:service-status {service} connected={connected}")
            }
            Event::LaunchApp { id, preload, .. } if preload.is_empty() => {
                format!("app:launch {id}")
            }
            Event::LaunchApp { id, .. } => format!("app:launch {id} (preload)"),
            Event::CloseApp { id, .. } => format!("app:close {id}"),
            Event::PauseApp { id, .. } => format!("app:pause {id}"),
            Event::CloseAllApps { reason } => format!("app:close-all reason={reason}"),
            Event::RegisterNativeApp { id, .. } => format!("app:register {id}"),
            Event::PrelaunchDone { uid } => format!("prelaunch:done {uid}"),
            Event::MemoryCheckDone { uid } => format!("memcheck:done {uid}"),
            Event::LaunchingDone { uid } => format!("launch:done {uid}"),
            Event::RuntimeStatusChanged { app_id, status, .. } => {
                format!("life:runtime-status {app_id} -> {status}")
            }
            Event::RunningAppAdded { app_id, pid, .. } => {
                format!("running:added {app_id} pid={pid}")
            }
            Event::RunningAppRemoved { app_id } => format!("running:removed {app_id}"),
            Event::ProcessExited { pid, status } => {
                format!("proc:exited pid={pid} status={status}")
            }
            Event::TimerFired { id } => format!("timer:fired {id}"),
            Event::RosterScanned { packages, reason } => {
                format!("roster:scanned {} packages reason={reason}", packages.len())
            }
            Event::RosterAppScanned { id, package, .. } => {
                format!("roster:app-scanned {id} present={}", package.is_some())
            }
            Event::RosterUpdated { changes } => format!("roster:updated {} changes", changes.len()),
            Event::PrerequisiteResolved { name, passed } => {
                format!("ready:item {name} passed={passed}")
            }
            Event::Shutdown => "system:shutdown".to_string(),
            Event::Custom => "custom".to_string(),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
