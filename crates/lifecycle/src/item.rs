// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-flight launch and close requests.

use crate::stage::StageItem;
use sam_core::{AppId, BusToken, DisplayId, ErrorInfo, LaunchUid};
use serde_json::Value;
use std::collections::VecDeque;

/// Where a launch item currently is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchStage {
    CheckExecute,
    Prelaunch,
    PrelaunchDone,
    MemoryCheck,
    MemoryCheckDone,
    Launch,
    Done,
}

/// One in-flight launch request.
///
/// Created by the manager, walked through the prelaunch pipeline and the
/// memory checker, then handed to a runtime handler. `requested_app_id` never
/// changes; `app_id` is rewritten only by a stage returning `Redirected`.
pub struct LaunchAppItem {
    uid: LaunchUid,
    requested_app_id: AppId,
    app_id: AppId,
    redirected: bool,
    pub display: DisplayId,
    pub caller_id: String,
    pub caller_pid: String,
    pub params: Value,
    /// Empty for a normal launch, else the preload reason.
    pub preload: String,
    pub keep_alive: bool,
    pub show_splash: bool,
    pub show_spinner: bool,
    pub launch_reason: String,
    pub stage: LaunchStage,
    pub sub_stage: LaunchStage,
    pub stage_queue: VecDeque<StageItem>,
    /// Outstanding bus call, `BusToken::NONE` when idle.
    pub return_token: BusToken,
    /// Inbound request to answer once the launch resolves.
    pub reply: BusToken,
    pub error: Option<ErrorInfo>,
    /// Wall-clock ms when the request was accepted.
    pub launch_start_time: u64,
    /// Process id, filled in by the runtime handler.
    pub pid: String,
}

impl LaunchAppItem {
    pub fn new(app_id: AppId, display: DisplayId, params: Value, reply: BusToken) -> Self {
        Self {
            uid: LaunchUid::new(),
            requested_app_id: app_id.clone(),
            app_id,
            redirected: false,
            display,
            caller_id: String::new(),
            caller_pid: String::new(),
            params,
            preload: String::new(),
            keep_alive: false,
            show_splash: true,
            show_spinner: false,
            launch_reason: "normal".to_string(),
            stage: LaunchStage::CheckExecute,
            sub_stage: LaunchStage::CheckExecute,
            stage_queue: VecDeque::new(),
            return_token: BusToken::NONE,
            reply,
            error: None,
            launch_start_time: 0,
            pid: String::new(),
        }
    }

    pub fn uid(&self) -> &LaunchUid {
        &self.uid
    }

    pub fn app_id(&self) -> &AppId {
        &self.app_id
    }

    /// The id the caller originally asked for, before any redirection.
    pub fn requested_app_id(&self) -> &AppId {
        &self.requested_app_id
    }

    pub fn is_redirected(&self) -> bool {
        self.redirected
    }

    /// Rewrite the target app. Only a stage returning `Redirected` may do
    /// this; the requested id stays untouched.
    pub fn set_redirection(&mut self, target: AppId, params: Value) {
        self.app_id = target;
        if !params.is_null() {
            self.params = params;
        }
        self.redirected = true;
    }

    pub fn set_error(&mut self, error: ErrorInfo) {
        self.error = Some(error);
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn clear_stages(&mut self) {
        self.stage_queue.clear();
    }
}

/// One close request, dispatched straight to a runtime handler.
#[derive(Debug, Clone)]
pub struct CloseAppItem {
    pub app_id: AppId,
    pub display: DisplayId,
    pub pid: String,
    pub caller_id: String,
    /// Free text; `"memoryReclaim"` selects the immediate kill path in the
    /// native handler.
    pub reason: String,
}

impl CloseAppItem {
    pub fn new(app_id: AppId, display: DisplayId, caller_id: String, reason: String) -> Self {
        let reason = if reason.is_empty() { "normal".to_string() } else { reason };
        Self { app_id, display, pid: String::new(), caller_id, reason }
    }

    pub fn is_memory_reclaim(&self) -> bool {
        self.reason == "memoryReclaim"
    }
}

#[cfg(test)]
#[path = "item_tests.rs"]
mod tests;
