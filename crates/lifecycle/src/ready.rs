// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot startup readiness coordination.
//!
//! Each prerequisite item reports Passed or Failed exactly once; when the
//! last one lands, the monitor fires a single aggregate result and releases
//! its items. Failures aggregate; nothing retries.

use std::collections::HashMap;
use tracing::{debug, warn};

/// Aggregate outcome of all prerequisite items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrerequisiteResult {
    Passed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemState {
    Doing,
    Passed,
    Failed,
}

/// Tracks named prerequisite items until all have resolved.
pub struct PrerequisiteMonitor {
    items: HashMap<String, ItemState>,
    fired: bool,
}

impl PrerequisiteMonitor {
    pub fn new() -> Self {
        Self { items: HashMap::new(), fired: false }
    }

    /// Register an item before `run`. Unknown items reported later are
    /// ignored with a warning.
    pub fn add_item(&mut self, name: impl Into<String>) {
        self.items.insert(name.into(), ItemState::Doing);
    }

    /// With no items registered this fires immediately.
    pub fn run(&mut self) -> Option<PrerequisiteResult> {
        if self.items.is_empty() && !self.fired {
            self.fired = true;
            return Some(PrerequisiteResult::Passed);
        }
        None
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Record one item's outcome. Returns the aggregate result exactly once,
    /// when the last outstanding item resolves.
    pub fn set_status(&mut self, name: &str, passed: bool) -> Option<PrerequisiteResult> {
        if self.fired {
            debug!(name, "prerequisite reported after monitor fired");
            return None;
        }
        match self.items.get_mut(name) {
            Some(state) => {
                *state = if passed { ItemState::Passed } else { ItemState::Failed };
            }
            None => {
                warn!(name, "unknown prerequisite item");
                return None;
            }
        }

        if self.items.values().any(|state| *state == ItemState::Doing) {
            return None;
        }

        self.fired = true;
        let result = if self.items.values().any(|state| *state == ItemState::Failed) {
            PrerequisiteResult::Failed
        } else {
            PrerequisiteResult::Passed
        };
        self.items.clear();
        Some(result)
    }
}

impl Default for PrerequisiteMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "ready_tests.rs"]
mod tests;
