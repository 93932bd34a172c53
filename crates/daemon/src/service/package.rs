// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Package method handlers.

use super::{opt_bool, required_str, ServiceContext};
use sam_bus::{BusClient, InboundRequest};
use sam_core::{project_props, Clock, ErrorInfo};
use sam_lifecycle::{keys, ProcessAdapter};
use serde_json::{json, Value};

type HandlerResult = Result<Option<Value>, ErrorInfo>;

fn properties_of(payload: &Value) -> Vec<String> {
    payload
        .get("properties")
        .and_then(Value::as_array)
        .map(|props| {
            props.iter().filter_map(Value::as_str).map(str::to_string).collect()
        })
        .unwrap_or_default()
}

/// `listApps {properties?, subscribe?}`.
///
/// With a properties array the reply (and every later push) is projected;
/// `id` is always included.
pub(super) fn list_apps<B: BusClient, P: ProcessAdapter, C: Clock>(
    ctx: &ServiceContext<B, P, C>,
    request: &InboundRequest,
) -> HandlerResult {
    let properties = properties_of(&request.payload);
    let subscribe = opt_bool(&request.payload, "subscribe");

    let mut payload = if properties.is_empty() {
        ctx.manager.list_apps_payload()
    } else {
        let full = ctx.manager.list_apps_payload();
        let apps: Vec<Value> = full["apps"]
            .as_array()
            .map(|apps| apps.iter().map(|app| project_props(app, &properties)).collect())
            .unwrap_or_default();
        json!({ "returnValue": true, "apps": apps })
    };

    let subscribed = if subscribe {
        if properties.is_empty() {
            ctx.bus.subscription_add(keys::LIST_APPS, request.token)
        } else {
            ctx.manager.register_compact_subscriber(request.token, properties);
            true
        }
    } else {
        false
    };
    payload["subscribed"] = Value::Bool(subscribed);
    Ok(Some(payload))
}

/// `getAppInfo {id, properties?}`.
pub(super) fn get_app_info<B: BusClient, P: ProcessAdapter, C: Clock>(
    ctx: &ServiceContext<B, P, C>,
    request: &InboundRequest,
) -> HandlerResult {
    let id = required_str(&request.payload, "id")?;
    let properties = properties_of(&request.payload);

    let app_info = {
        let roster = ctx.roster.lock();
        match roster.get(id) {
            Some(package) => package.to_json(),
            None => return Err(ErrorInfo::app_not_found(id)),
        }
    };
    let app_info =
        if properties.is_empty() { app_info } else { project_props(&app_info, &properties) };

    Ok(Some(json!({ "returnValue": true, "appId": id, "appInfo": app_info })))
}

/// `getAppBasePath {appId}` — callers may only ask about themselves.
pub(super) fn get_app_base_path<B: BusClient, P: ProcessAdapter, C: Clock>(
    ctx: &ServiceContext<B, P, C>,
    request: &InboundRequest,
) -> HandlerResult {
    let id = required_str(&request.payload, "appId")?;
    if request.caller_id != id {
        return Err(ErrorInfo::no_permission("caller must equal appId"));
    }

    let base_path = {
        let roster = ctx.roster.lock();
        match roster.get(id) {
            Some(package) => {
                let main = std::path::Path::new(&package.main);
                if main.is_absolute() {
                    package.main.clone()
                } else {
                    package.folder_path.join(main).to_string_lossy().into_owned()
                }
            }
            None => return Err(ErrorInfo::app_not_found(id)),
        }
    };

    Ok(Some(json!({ "returnValue": true, "appId": id, "basePath": base_path })))
}
