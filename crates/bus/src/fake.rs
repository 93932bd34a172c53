// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording bus double for engine tests.

use crate::client::{BusClient, BusError};
use crate::subscription::SubscriptionRegistry;
use async_trait::async_trait;
use parking_lot::Mutex;
use sam_core::BusToken;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One recorded outbound call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub token: BusToken,
    pub uri: String,
    pub payload: Value,
    pub multi: bool,
}

#[derive(Default)]
struct FakeBusState {
    calls: Vec<RecordedCall>,
    responses: Vec<(BusToken, Value)>,
    posts: Vec<(String, Value)>,
    cancelled: Vec<BusToken>,
    watches: Vec<String>,
    categories: Vec<(String, Vec<String>)>,
    service_name: String,
}

/// In-memory [`BusClient`]: records everything, performs nothing.
///
/// Replies are injected by tests feeding `Event::BusReply` straight into the
/// engine under test.
#[derive(Clone, Default)]
pub struct FakeBus {
    next_token: Arc<AtomicU64>,
    state: Arc<Mutex<FakeBusState>>,
    subs: Arc<SubscriptionRegistry>,
}

impl FakeBus {
    pub fn new() -> Self {
        Self {
            next_token: Arc::new(AtomicU64::new(1)),
            state: Arc::new(Mutex::new(FakeBusState::default())),
            subs: Arc::new(SubscriptionRegistry::new()),
        }
    }

    /// All outbound calls so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }

    /// Outbound calls whose uri contains `fragment`.
    pub fn calls_to(&self, fragment: &str) -> Vec<RecordedCall> {
        self.state.lock().calls.iter().filter(|c| c.uri.contains(fragment)).cloned().collect()
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.state.lock().calls.last().cloned()
    }

    /// Replies sent to one inbound token, oldest first.
    pub fn responses_to(&self, token: BusToken) -> Vec<Value> {
        self.state
            .lock()
            .responses
            .iter()
            .filter(|(t, _)| *t == token)
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    /// Subscription posts on one key, oldest first.
    pub fn posts_on(&self, key: &str) -> Vec<Value> {
        self.state
            .lock()
            .posts
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    pub fn cancelled(&self) -> Vec<BusToken> {
        self.state.lock().cancelled.clone()
    }

    pub fn watched_services(&self) -> Vec<String> {
        self.state.lock().watches.clone()
    }

    pub fn registered_categories(&self) -> Vec<(String, Vec<String>)> {
        self.state.lock().categories.clone()
    }

    pub fn service_name(&self) -> String {
        self.state.lock().service_name.clone()
    }
}

#[async_trait]
impl BusClient for FakeBus {
    async fn register_service(&self, name: &str, _compat_names: &[String]) -> Result<(), BusError> {
        self.state.lock().service_name = name.to_string();
        Ok(())
    }

    async fn register_category(&self, category: &str, methods: &[String]) -> Result<(), BusError> {
        self.state.lock().categories.push((category.to_string(), methods.to_vec()));
        Ok(())
    }

    async fn call_one_reply(&self, uri: &str, payload: Value) -> Result<BusToken, BusError> {
        let token = BusToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        self.state.lock().calls.push(RecordedCall {
            token,
            uri: uri.to_string(),
            payload,
            multi: false,
        });
        Ok(token)
    }

    async fn call_multi_reply(&self, uri: &str, payload: Value) -> Result<BusToken, BusError> {
        let token = BusToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        self.state.lock().calls.push(RecordedCall {
            token,
            uri: uri.to_string(),
            payload,
            multi: true,
        });
        Ok(token)
    }

    async fn cancel(&self, token: BusToken) -> Result<(), BusError> {
        self.state.lock().cancelled.push(token);
        Ok(())
    }

    async fn respond(&self, token: BusToken, payload: Value) -> Result<(), BusError> {
        self.state.lock().responses.push((token, payload));
        Ok(())
    }

    fn subscription_add(&self, key: &str, token: BusToken) -> bool {
        self.subs.add(key, token);
        true
    }

    fn subscriber_count(&self, key: &str) -> usize {
        self.subs.count(key)
    }

    fn subscription_reply(&self, key: &str, payload: Value) {
        self.state.lock().posts.push((key.to_string(), payload));
    }

    async fn watch_server_status(&self, service: &str) -> Result<(), BusError> {
        self.state.lock().watches.push(service.to_string());
        Ok(())
    }
}
