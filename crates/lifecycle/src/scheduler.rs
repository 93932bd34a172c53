// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named one-shot timers, polled by the engine loop.
//!
//! Timer ids are strings like `"kill:com.example.app"`; setting an id that
//! already exists rearms it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Default)]
pub struct Scheduler {
    timers: HashMap<String, Instant>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_timer(&mut self, id: impl Into<String>, duration: Duration, now: Instant) {
        self.timers.insert(id.into(), now + duration);
    }

    pub fn cancel_timer(&mut self, id: &str) {
        self.timers.remove(id);
    }

    pub fn cancel_timers_with_prefix(&mut self, prefix: &str) {
        self.timers.retain(|id, _| !id.starts_with(prefix));
    }

    pub fn has_timer(&self, id: &str) -> bool {
        self.timers.contains_key(id)
    }

    /// Earliest pending deadline, for the loop's sleep.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.values().min().copied()
    }

    /// Remove and return every timer due at `now`.
    pub fn take_due(&mut self, now: Instant) -> Vec<String> {
        let due: Vec<String> = self
            .timers
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &due {
            self.timers.remove(id);
        }
        due
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
