// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The running-info table.
//!
//! The only place life and runtime status are stored. Keyed by
//! (app id, display); foreground facts are normalized into one structure and
//! serialized on demand.

use sam_core::{AppId, DisplayId, LifeStatus, RuntimeStatus};
use std::collections::HashMap;

/// One live (or launching) app instance.
#[derive(Debug, Clone)]
pub struct RunningInfo {
    pub app_id: AppId,
    pub display: DisplayId,
    pub pid: String,
    pub web_pid: String,
    pub life_status: LifeStatus,
    pub runtime_status: RuntimeStatus,
    /// Wall-clock ms of the last accepted launch.
    pub last_launch_time: u64,
    /// Blocks new launches while an update holds the instance.
    pub execution_lock: bool,
    /// Empty for a normal instance, else the preload reason.
    pub preload_mode: String,
    /// Defer deletion of this record until the instance reaches Stop.
    pub removal_flag: bool,
}

impl RunningInfo {
    fn new(app_id: AppId, display: DisplayId) -> Self {
        Self {
            app_id,
            display,
            pid: String::new(),
            web_pid: String::new(),
            life_status: LifeStatus::Stop,
            runtime_status: RuntimeStatus::Stop,
            last_launch_time: 0,
            execution_lock: false,
            preload_mode: String::new(),
            removal_flag: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.runtime_status != RuntimeStatus::Stop
    }
}

/// Normalized foreground facts.
#[derive(Debug, Clone, Default)]
pub struct ForegroundInfo {
    current: Option<AppId>,
    apps: Vec<AppId>,
}

impl ForegroundInfo {
    pub fn current(&self) -> Option<&AppId> {
        self.current.as_ref()
    }

    pub fn apps(&self) -> &[AppId] {
        &self.apps
    }
}

/// Table of all live instances.
#[derive(Default)]
pub struct RunningInfoTable {
    entries: HashMap<(AppId, DisplayId), RunningInfo>,
    foreground: ForegroundInfo,
}

impl RunningInfoTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, app_id: &AppId, display: &DisplayId) -> Option<&RunningInfo> {
        self.entries.get(&(app_id.clone(), display.clone()))
    }

    pub fn get_mut(&mut self, app_id: &AppId, display: &DisplayId) -> Option<&mut RunningInfo> {
        self.entries.get_mut(&(app_id.clone(), display.clone()))
    }

    /// First instance of an app across displays.
    pub fn get_app(&self, app_id: &AppId) -> Option<&RunningInfo> {
        self.entries.values().find(|info| &info.app_id == app_id)
    }

    pub fn get_app_mut(&mut self, app_id: &AppId) -> Option<&mut RunningInfo> {
        self.entries.values_mut().find(|info| &info.app_id == app_id)
    }

    pub fn get_by_pid(&self, pid: &str) -> Option<&RunningInfo> {
        self.entries.values().find(|info| info.pid == pid)
    }

    /// Existing entry for (app, display), or a fresh Stop-state one.
    pub fn get_or_add(&mut self, app_id: &AppId, display: &DisplayId) -> &mut RunningInfo {
        self.entries
            .entry((app_id.clone(), display.clone()))
            .or_insert_with(|| RunningInfo::new(app_id.clone(), display.clone()))
    }

    /// Remove one instance record. Entries with `removal_flag` set must only
    /// be removed once their life status reached Stop.
    pub fn remove(&mut self, app_id: &AppId, display: &DisplayId) -> Option<RunningInfo> {
        let removed = self.entries.remove(&(app_id.clone(), display.clone()));
        if removed.is_some() && self.foreground.current.as_ref() == Some(app_id) {
            self.foreground.current = None;
        }
        self.foreground.apps.retain(|id| id != app_id);
        removed
    }

    pub fn is_running(&self, app_id: &AppId) -> bool {
        self.entries.values().any(|info| &info.app_id == app_id && info.is_running())
    }

    pub fn list(&self) -> Vec<&RunningInfo> {
        let mut all: Vec<&RunningInfo> = self.entries.values().collect();
        all.sort_by(|a, b| a.app_id.cmp(&b.app_id));
        all
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // -- foreground bookkeeping --

    pub fn foreground(&self) -> &ForegroundInfo {
        &self.foreground
    }

    /// Record an app entering the foreground.
    pub fn set_foreground(&mut self, app_id: &AppId) {
        self.foreground.current = Some(app_id.clone());
        if !self.foreground.apps.contains(app_id) {
            self.foreground.apps.push(app_id.clone());
        }
    }

    /// Record an app leaving the foreground.
    pub fn clear_foreground(&mut self, app_id: &AppId) {
        if self.foreground.current.as_ref() == Some(app_id) {
            self.foreground.current = None;
        }
        self.foreground.apps.retain(|id| id != app_id);
    }
}

#[cfg(test)]
#[path = "running_tests.rs"]
mod tests;
