// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The bus surface the engine talks to.

use async_trait::async_trait;
use sam_core::BusToken;
use serde_json::Value;
use thiserror::Error;

/// Errors from bus plumbing.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("bad uri: {0}")]
    BadUri(String),

    #[error("service not reachable: {0}")]
    ServiceUnreachable(String),

    #[error("unknown token: {0}")]
    UnknownToken(BusToken),
}

/// One inbound method call delivered to the service dispatcher.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    /// Category-qualified method, e.g. `"/launch"` or `"/dev/closeByAppId"`.
    pub method: String,
    pub payload: Value,
    /// Token used to reply (possibly more than once for subscriptions and
    /// register-style calls).
    pub token: BusToken,
    /// Self-reported caller service name.
    pub caller_id: String,
    /// Caller process id, when the transport can provide it.
    pub caller_pid: String,
}

/// Connection, call, and subscription plumbing to the RPC bus.
///
/// Delivery contracts: replies to `call_one_reply`/`call_multi_reply` arrive
/// on the engine event channel as `Event::BusReply`; watched-service changes
/// arrive as `Event::ServiceStatus`. Subscription delivery is best-effort —
/// a failed delivery is logged and drops the subscriber, never the caller.
#[async_trait]
pub trait BusClient: Clone + Send + Sync + 'static {
    /// Advertise this service under its primary and compat names.
    async fn register_service(&self, name: &str, compat_names: &[String]) -> Result<(), BusError>;

    /// Register a category of methods. All categories must be registered
    /// before the engine loop attaches.
    async fn register_category(&self, category: &str, methods: &[String]) -> Result<(), BusError>;

    /// Issue a single-reply call to another service.
    async fn call_one_reply(&self, uri: &str, payload: Value) -> Result<BusToken, BusError>;

    /// Issue a persistent call (e.g. a subscription on a peer service);
    /// replies keep arriving until the token is cancelled.
    async fn call_multi_reply(&self, uri: &str, payload: Value) -> Result<BusToken, BusError>;

    /// Cancel an outstanding call.
    async fn cancel(&self, token: BusToken) -> Result<(), BusError>;

    /// Reply to an inbound message.
    async fn respond(&self, token: BusToken, payload: Value) -> Result<(), BusError>;

    /// Attach an inbound message to a subscription key. Returns false when
    /// the token's connection is already gone.
    fn subscription_add(&self, key: &str, token: BusToken) -> bool;

    /// Number of live subscribers on a key.
    fn subscriber_count(&self, key: &str) -> usize;

    /// Best-effort post to every subscriber of a key.
    fn subscription_reply(&self, key: &str, payload: Value);

    /// Watch a peer service's availability.
    async fn watch_server_status(&self, service: &str) -> Result<(), BusError>;
}

/// Split `"luna://com.example.service/path/method"` into service and method.
pub(crate) fn parse_uri(uri: &str) -> Result<(&str, &str), BusError> {
    let rest = uri.strip_prefix("luna://").unwrap_or(uri);
    match rest.split_once('/') {
        Some((service, method)) if !service.is_empty() && !method.is_empty() => {
            Ok((service, method))
        }
        _ => Err(BusError::BadUri(uri.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_uri_splits_service_and_method() {
        let (service, method) = parse_uri("luna://com.palm.webappmanager/launchApp").unwrap();
        assert_eq!(service, "com.palm.webappmanager");
        assert_eq!(method, "launchApp");
    }

    #[test]
    fn parse_uri_accepts_bare_form() {
        let (service, method) = parse_uri("com.webos.booster/launch").unwrap();
        assert_eq!(service, "com.webos.booster");
        assert_eq!(method, "launch");
    }

    #[test]
    fn parse_uri_rejects_missing_method() {
        assert!(parse_uri("luna://com.webos.booster").is_err());
        assert!(parse_uri("").is_err());
    }
}
