// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key → subscriber bookkeeping, transport-independent.

use parking_lot::Mutex;
use sam_core::BusToken;
use std::collections::HashMap;

/// Groups inbound-message tokens under subscription keys.
///
/// The transport decides how to deliver to a token; this registry only tracks
/// membership and prunes subscribers the transport reports dead.
#[derive(Default)]
pub struct SubscriptionRegistry {
    keys: Mutex<HashMap<String, Vec<BusToken>>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, key: &str, token: BusToken) {
        let mut keys = self.keys.lock();
        let subscribers = keys.entry(key.to_string()).or_default();
        if !subscribers.contains(&token) {
            subscribers.push(token);
        }
    }

    pub fn count(&self, key: &str) -> usize {
        self.keys.lock().get(key).map_or(0, Vec::len)
    }

    /// Snapshot of the subscribers on a key, in registration order.
    pub fn subscribers(&self, key: &str) -> Vec<BusToken> {
        self.keys.lock().get(key).cloned().unwrap_or_default()
    }

    /// Remove one token from one key.
    pub fn remove(&self, key: &str, token: BusToken) {
        let mut keys = self.keys.lock();
        if let Some(subscribers) = keys.get_mut(key) {
            subscribers.retain(|t| *t != token);
            if subscribers.is_empty() {
                keys.remove(key);
            }
        }
    }

    /// Remove a token everywhere (its connection closed).
    pub fn remove_everywhere(&self, token: BusToken) {
        let mut keys = self.keys.lock();
        keys.retain(|_, subscribers| {
            subscribers.retain(|t| *t != token);
            !subscribers.is_empty()
        });
    }
}

#[cfg(test)]
#[path = "subscription_tests.rs"]
mod tests;
