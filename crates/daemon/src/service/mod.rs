// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bus method dispatch for the `/` and `/dev` categories.
//!
//! Both categories are registered before the engine loop attaches. Handlers
//! parse the payload once at entry, validate it, and either answer
//! immediately or hand the request to the engine which answers when the task
//! resolves.

mod lifecycle;
mod package;

use parking_lot::Mutex;
use sam_bus::{BusClient, InboundRequest};
use sam_core::{Clock, ErrorInfo, Event};
use sam_lifecycle::{Manager, ProcessAdapter, RunningInfoTable};
use sam_roster::Roster;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Methods on the general `/` category.
const GENERAL_METHODS: &[&str] = &[
    "launch",
    "pause",
    "closeByAppId",
    "running",
    "getAppLifeEvents",
    "getAppLifeStatus",
    "getForegroundAppInfo",
    "lockApp",
    "registerApp",
    "listApps",
    "getAppStatus",
    "getAppInfo",
    "getAppBasePath",
    "addLaunchPoint",
    "updateLaunchPoint",
    "removeLaunchPoint",
    "moveLaunchPoint",
    "listLaunchPoints",
];

/// Methods on the `/dev` category (registered only in dev mode).
const DEV_METHODS: &[&str] = &["launch", "closeByAppId", "running", "listApps"];

pub fn general_methods() -> Vec<String> {
    GENERAL_METHODS.iter().map(|m| m.to_string()).collect()
}

pub fn dev_methods() -> Vec<String> {
    DEV_METHODS.iter().map(|m| m.to_string()).collect()
}

/// Shared context for all method handlers.
pub struct ServiceContext<B: BusClient, P: ProcessAdapter, C: Clock> {
    pub manager: Arc<Manager<B, P, C>>,
    pub bus: B,
    pub roster: Arc<Mutex<Roster>>,
    pub running: Arc<Mutex<RunningInfoTable>>,
    pub event_tx: mpsc::Sender<Event>,
}

/// Consume inbound method calls until the bus goes away.
pub async fn dispatch_requests<B, P, C>(
    mut requests: mpsc::Receiver<InboundRequest>,
    ctx: ServiceContext<B, P, C>,
) where
    B: BusClient,
    P: ProcessAdapter,
    C: Clock,
{
    while let Some(request) = requests.recv().await {
        handle_request(&ctx, request).await;
    }
    info!("request stream closed, service dispatcher exiting");
}

/// Handle one inbound method call.
pub async fn handle_request<B, P, C>(ctx: &ServiceContext<B, P, C>, request: InboundRequest)
where
    B: BusClient,
    P: ProcessAdapter,
    C: Clock,
{
    let (dev, method) = match request.method.strip_prefix("/dev/") {
        Some(method) => (true, method.to_string()),
        None => (false, request.method.trim_start_matches('/').to_string()),
    };
    debug!(method = %request.method, caller = %request.caller_id, "inbound call");

    let token = request.token;
    let result: Result<Option<Value>, ErrorInfo> = match method.as_str() {
        "launch" => lifecycle::launch(ctx, request).await,
        "pause" => lifecycle::pause(ctx, request).await,
        "closeByAppId" => lifecycle::close_by_app_id(ctx, request, dev).await,
        "running" => lifecycle::running(ctx, &request, dev),
        "getAppLifeEvents" => lifecycle::get_app_life_events(ctx, &request),
        "getAppLifeStatus" => lifecycle::get_app_life_status(ctx, &request),
        "getForegroundAppInfo" => lifecycle::get_foreground_app_info(ctx, &request),
        "lockApp" => lifecycle::lock_app(ctx, &request),
        "registerApp" => lifecycle::register_app(ctx, request).await,
        "getAppStatus" => lifecycle::get_app_status(ctx, &request),
        "listApps" => package::list_apps(ctx, &request),
        "getAppInfo" => package::get_app_info(ctx, &request),
        "getAppBasePath" => package::get_app_base_path(ctx, &request),
        "addLaunchPoint" | "updateLaunchPoint" | "removeLaunchPoint" | "moveLaunchPoint"
        | "listLaunchPoints" => Err(ErrorInfo::deprecated()),
        other => Err(ErrorInfo::invalid_payload(format!("unknown method: {other}"))),
    };

    match result {
        Ok(Some(payload)) => {
            if let Err(e) = ctx.bus.respond(token, payload).await {
                warn!(token = token.0, error = %e, "reply dropped");
            }
        }
        Ok(None) => {}
        Err(error) => {
            if let Err(e) = ctx.bus.respond(token, error.to_payload()).await {
                warn!(token = token.0, error = %e, "error reply dropped");
            }
        }
    }
}

/// Required string field, non-empty.
pub(crate) fn required_str<'a>(payload: &'a Value, key: &str) -> Result<&'a str, ErrorInfo> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ErrorInfo::invalid_payload(format!("{key} is required")))
}

pub(crate) fn opt_bool(payload: &Value, key: &str) -> bool {
    payload.get(key).and_then(Value::as_bool).unwrap_or(false)
}

pub(crate) fn opt_str(payload: &Value, key: &str) -> String {
    payload.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

#[cfg(test)]
#[path = "../service_tests.rs"]
mod tests;
