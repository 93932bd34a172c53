// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Observable and internal lifecycle states.

use serde::{Deserialize, Serialize};

/// Observable, user-visible lifecycle state of one app instance.
///
/// This is what subscribers of `getAppLifeStatus` see. `Running` is internal
/// plumbing: the route tables always convert it before it becomes observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifeStatus {
    Invalid,
    Stop,
    Preloading,
    Launching,
    Relaunching,
    Foreground,
    Background,
    Closing,
    Pausing,
    Running,
}

impl LifeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifeStatus::Invalid => "invalid",
            LifeStatus::Stop => "stop",
            LifeStatus::Preloading => "preloading",
            LifeStatus::Launching => "launching",
            LifeStatus::Relaunching => "relaunching",
            LifeStatus::Foreground => "foreground",
            LifeStatus::Background => "background",
            LifeStatus::Closing => "closing",
            LifeStatus::Pausing => "pausing",
            LifeStatus::Running => "running",
        }
    }
}

impl std::fmt::Display for LifeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internal, process-level state. Never shown to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeStatus {
    Stop,
    Launching,
    Preloading,
    Running,
    Registered,
    Closing,
    Pausing,
}

impl std::fmt::Display for RuntimeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RuntimeStatus::Stop => "stop",
            RuntimeStatus::Launching => "launching",
            RuntimeStatus::Preloading => "preloading",
            RuntimeStatus::Running => "running",
            RuntimeStatus::Registered => "registered",
            RuntimeStatus::Closing => "closing",
            RuntimeStatus::Pausing => "pausing",
        };
        f.write_str(s)
    }
}

/// Event kind pushed to `getAppLifeEvents` subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifeEvent {
    Invalid,
    Splash,
    Preload,
    Launch,
    Foreground,
    Background,
    Pause,
    Close,
    Stop,
}

impl LifeEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifeEvent::Invalid => "invalid",
            LifeEvent::Splash => "splash",
            LifeEvent::Preload => "preload",
            LifeEvent::Launch => "launch",
            LifeEvent::Foreground => "foreground",
            LifeEvent::Background => "background",
            LifeEvent::Pause => "pause",
            LifeEvent::Close => "close",
            LifeEvent::Stop => "stop",
        }
    }
}

impl std::fmt::Display for LifeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
