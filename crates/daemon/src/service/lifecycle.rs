// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle method handlers.

use super::{opt_bool, opt_str, required_str, ServiceContext};
use sam_bus::{BusClient, InboundRequest};
use sam_core::{AppId, Clock, DisplayId, ErrorInfo, Event, HandlerKind};
use sam_lifecycle::{keys, ProcessAdapter};
use serde_json::{json, Value};

type HandlerResult = Result<Option<Value>, ErrorInfo>;

/// `launch {id, params?, preload?, keepAlive?, noSplash?, spinner?}`.
///
/// The reply is sent by the engine once the launch resolves.
pub(super) async fn launch<B: BusClient, P: ProcessAdapter, C: Clock>(
    ctx: &ServiceContext<B, P, C>,
    request: InboundRequest,
) -> HandlerResult {
    let id = required_str(&request.payload, "id")?.to_string();
    let event = Event::LaunchApp {
        id: AppId::new(&id),
        display: DisplayId::new(opt_str(&request.payload, "displayId")),
        params: request.payload.get("params").cloned().unwrap_or_else(|| json!({})),
        preload: opt_str(&request.payload, "preload"),
        keep_alive: opt_bool(&request.payload, "keepAlive"),
        no_splash: opt_bool(&request.payload, "noSplash"),
        spinner: opt_bool(&request.payload, "spinner"),
        caller_id: request.caller_id,
        caller_pid: request.caller_pid,
        reply: request.token,
    };
    ctx.event_tx
        .send(event)
        .await
        .map_err(|_| ErrorInfo::general("service is shutting down"))?;
    Ok(None)
}

/// `pause {id, params?}`. Replied by the engine.
pub(super) async fn pause<B: BusClient, P: ProcessAdapter, C: Clock>(
    ctx: &ServiceContext<B, P, C>,
    request: InboundRequest,
) -> HandlerResult {
    let id = required_str(&request.payload, "id")?.to_string();
    let event = Event::PauseApp {
        id: AppId::new(&id),
        params: request.payload.get("params").cloned().unwrap_or_else(|| json!({})),
        reply: request.token,
    };
    ctx.event_tx
        .send(event)
        .await
        .map_err(|_| ErrorInfo::general("service is shutting down"))?;
    Ok(None)
}

/// `closeByAppId {id, reason?}`. The dev category only closes dev apps.
pub(super) async fn close_by_app_id<B: BusClient, P: ProcessAdapter, C: Clock>(
    ctx: &ServiceContext<B, P, C>,
    request: InboundRequest,
    dev: bool,
) -> HandlerResult {
    let id = required_str(&request.payload, "id")?.to_string();

    if dev {
        let is_dev = ctx.roster.lock().get(&id).is_some_and(|package| package.is_dev());
        if !is_dev {
            return Err(ErrorInfo::no_permission("only dev apps can be closed here"));
        }
    }

    let event = Event::CloseApp {
        id: AppId::new(&id),
        display: DisplayId::new(opt_str(&request.payload, "displayId")),
        caller_id: request.caller_id,
        reason: opt_str(&request.payload, "reason"),
        reply: request.token,
    };
    ctx.event_tx
        .send(event)
        .await
        .map_err(|_| ErrorInfo::general("service is shutting down"))?;
    Ok(None)
}

/// `running {subscribe?}`.
pub(super) fn running<B: BusClient, P: ProcessAdapter, C: Clock>(
    ctx: &ServiceContext<B, P, C>,
    request: &InboundRequest,
    dev: bool,
) -> HandlerResult {
    let mut payload = ctx.manager.running_snapshot(dev);
    let key = if dev { keys::DEV_RUNNING } else { keys::RUNNING };
    let subscribed =
        opt_bool(&request.payload, "subscribe") && ctx.bus.subscription_add(key, request.token);
    payload["subscribed"] = Value::Bool(subscribed);
    Ok(Some(payload))
}

/// `getAppLifeEvents {subscribe:true}`.
pub(super) fn get_app_life_events<B: BusClient, P: ProcessAdapter, C: Clock>(
    ctx: &ServiceContext<B, P, C>,
    request: &InboundRequest,
) -> HandlerResult {
    subscribe_only(ctx, request, keys::LIFE_EVENTS)
}

/// `getAppLifeStatus {subscribe:true}`.
pub(super) fn get_app_life_status<B: BusClient, P: ProcessAdapter, C: Clock>(
    ctx: &ServiceContext<B, P, C>,
    request: &InboundRequest,
) -> HandlerResult {
    subscribe_only(ctx, request, keys::LIFE_STATUS)
}

fn subscribe_only<B: BusClient, P: ProcessAdapter, C: Clock>(
    ctx: &ServiceContext<B, P, C>,
    request: &InboundRequest,
    key: &str,
) -> HandlerResult {
    if !opt_bool(&request.payload, "subscribe") {
        return Err(ErrorInfo::invalid_payload("subscription is required"));
    }
    let subscribed = ctx.bus.subscription_add(key, request.token);
    Ok(Some(json!({ "returnValue": true, "subscribed": subscribed })))
}

/// `getForegroundAppInfo {subscribe?, extraInfo?}`.
pub(super) fn get_foreground_app_info<B: BusClient, P: ProcessAdapter, C: Clock>(
    ctx: &ServiceContext<B, P, C>,
    request: &InboundRequest,
) -> HandlerResult {
    let extra = opt_bool(&request.payload, "extraInfo");
    let mut payload = ctx.manager.foreground_snapshot(extra);
    let key = if extra { keys::FOREGROUND_EX } else { keys::FOREGROUND };
    let subscribed =
        opt_bool(&request.payload, "subscribe") && ctx.bus.subscription_add(key, request.token);
    payload["subscribed"] = Value::Bool(subscribed);
    Ok(Some(payload))
}

/// `lockApp {id, lock}`.
pub(super) fn lock_app<B: BusClient, P: ProcessAdapter, C: Clock>(
    ctx: &ServiceContext<B, P, C>,
    request: &InboundRequest,
) -> HandlerResult {
    let id = required_str(&request.payload, "id")?;
    let lock = request
        .payload
        .get("lock")
        .and_then(Value::as_bool)
        .ok_or_else(|| ErrorInfo::invalid_payload("lock is required"))?;

    ctx.roster
        .lock()
        .lock(id, lock)
        .map_err(|_| ErrorInfo::app_not_found(id))?;
    // A live instance blocks relaunches through the same flag.
    if let Some(entry) = ctx.running.lock().get_app_mut(&AppId::new(id)) {
        entry.execution_lock = lock;
    }
    Ok(Some(json!({ "returnValue": true, "id": id, "locked": lock })))
}

/// `registerApp` — identity comes from the caller; the reply channel stays
/// open for application events.
pub(super) async fn register_app<B: BusClient, P: ProcessAdapter, C: Clock>(
    ctx: &ServiceContext<B, P, C>,
    request: InboundRequest,
) -> HandlerResult {
    if request.caller_id.is_empty() {
        return Err(ErrorInfo::general("cannot find caller id"));
    }
    let registrable = ctx
        .roster
        .lock()
        .get(&request.caller_id)
        .is_some_and(|package| package.handler_kind() == HandlerKind::Native);
    if !registrable {
        return Err(ErrorInfo::general("only native apps can register"));
    }

    let event = Event::RegisterNativeApp {
        id: AppId::new(&request.caller_id),
        client: request.token,
    };
    ctx.event_tx
        .send(event)
        .await
        .map_err(|_| ErrorInfo::general("service is shutting down"))?;
    Ok(None)
}

/// `getAppStatus {appId, appInfo?, subscribe?}`.
pub(super) fn get_app_status<B: BusClient, P: ProcessAdapter, C: Clock>(
    ctx: &ServiceContext<B, P, C>,
    request: &InboundRequest,
) -> HandlerResult {
    let id = required_str(&request.payload, "appId")?;
    let with_info = opt_bool(&request.payload, "appInfo");

    let app_info = {
        let roster = ctx.roster.lock();
        match roster.get(id) {
            Some(package) => package.to_json(),
            None => return Err(ErrorInfo::app_not_found(id)),
        }
    };

    let status = {
        let running = ctx.running.lock();
        running
            .get_app(&AppId::new(id))
            .map(|info| info.life_status.as_str())
            .unwrap_or("stop")
    };

    let mut payload = json!({ "returnValue": true, "appId": id, "status": status });
    if with_info {
        payload["appInfo"] = app_info;
    }
    let subscribed = opt_bool(&request.payload, "subscribe")
        && ctx.bus.subscription_add(&keys::app_status(id, with_info), request.token);
    payload["subscribed"] = Value::Bool(subscribed);
    Ok(Some(payload))
}
