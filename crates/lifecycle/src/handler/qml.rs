// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! QML booster handler.
//!
//! Launch posts the main QML file to the booster; the reply carries the pid.
//! Exits arrive on the booster's `processFinished` signal and are matched to
//! an app through the running-info table.

use crate::error::LifecycleError;
use crate::item::CloseAppItem;
use crate::manager::Manager;
use crate::process::ProcessAdapter;
use sam_bus::BusClient;
use sam_core::{AppId, BusToken, Clock, ErrorInfo, Event, LaunchUid, RuntimeStatus};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{error, info};

pub(crate) struct QmlHandlerState {
    /// Outstanding booster launch calls, token → item.
    pub pending: HashMap<BusToken, LaunchUid>,
    /// processFinished signal subscription; NONE while disconnected.
    pub signal: BusToken,
}

impl QmlHandlerState {
    pub fn new() -> Self {
        Self { pending: HashMap::new(), signal: BusToken::NONE }
    }
}

impl<B, P, C> Manager<B, P, C>
where
    B: BusClient,
    P: ProcessAdapter,
    C: Clock,
{
    /// Post `launch` to the booster for an item.
    pub(crate) async fn qml_launch(&self, uid: LaunchUid) -> Result<Vec<Event>, LifecycleError> {
        let prepared = {
            let roster = self.roster.lock();
            let items = self.launch_items.lock();
            let Some(item) = items.get(&uid) else {
                return Ok(vec![]);
            };
            roster.get(item.app_id().as_str()).map(|package| {
                let payload = json!({
                    "main": package.main,
                    "appId": item.app_id(),
                    "params": item.params.to_string(),
                });
                let uri = format!("luna://{}/launch", self.config.booster_service);
                (uri, payload, item.app_id().clone(), !item.preload.is_empty())
            })
        };
        let Some((uri, payload, app_id, preloading)) = prepared else {
            error!(%uid, "no package for qml launch");
            return self.fail_launch(uid, ErrorInfo::general("internal error")).await;
        };

        let token = match self.executor.call_one_reply(&uri, payload).await {
            Ok(token) => token,
            Err(e) => {
                error!(app_id = %app_id, error = %e, "booster launch call failed");
                return self.fail_launch(uid, ErrorInfo::general("internal error")).await;
            }
        };

        self.qml.lock().pending.insert(token, uid.clone());
        if let Some(item) = self.launch_items.lock().get_mut(&uid) {
            item.return_token = token;
        }

        let status =
            if preloading { RuntimeStatus::Preloading } else { RuntimeStatus::Launching };
        Ok(vec![Event::RuntimeStatusChanged { app_id, uid: Some(uid), status }])
    }

    /// Handle the booster's launch reply: extract the pid or fail.
    pub(crate) async fn qml_launch_reply(
        &self,
        uid: LaunchUid,
        payload: &Value,
    ) -> Result<Vec<Event>, LifecycleError> {
        let app_id = {
            let mut items = self.launch_items.lock();
            let Some(item) = items.get_mut(&uid) else {
                return Ok(vec![]);
            };
            item.return_token = BusToken::NONE;
            item.app_id().clone()
        };

        let ok = payload.get("returnValue").and_then(Value::as_bool).unwrap_or(false);
        let pid = payload
            .get("pid")
            .and_then(Value::as_i64)
            .map(|pid| pid.to_string())
            .unwrap_or_default();

        if !ok || pid.is_empty() {
            error!(app_id = %app_id, reply = %payload, "booster launch failed");
            let mut events =
                self.fail_launch(uid, ErrorInfo::general("booster error")).await?;
            events.push(Event::RuntimeStatusChanged {
                app_id,
                uid: None,
                status: RuntimeStatus::Stop,
            });
            return Ok(events);
        }

        if let Some(item) = self.launch_items.lock().get_mut(&uid) {
            item.pid = pid.clone();
        }
        info!(app_id = %app_id, pid, "booster launched app");
        Ok(vec![
            Event::RunningAppAdded { app_id: app_id.clone(), pid, web_pid: String::new() },
            Event::RuntimeStatusChanged { app_id, uid: None, status: RuntimeStatus::Running },
            Event::LaunchingDone { uid },
        ])
    }

    /// Post `close` to the booster.
    pub(crate) async fn qml_close(
        &self,
        item: &CloseAppItem,
    ) -> Result<Vec<Event>, ErrorInfo> {
        let uri = format!("luna://{}/close", self.config.booster_service);
        let payload = json!({ "appId": item.app_id });
        if self.executor.call_one_reply(&uri, payload).await.is_err() {
            return Err(ErrorInfo::general("close request fail"));
        }
        Ok(vec![Event::RuntimeStatusChanged {
            app_id: item.app_id.clone(),
            uid: None,
            status: RuntimeStatus::Closing,
        }])
    }

    /// The booster has no pause interface.
    pub(crate) fn qml_pause(&self, app_id: &AppId) -> Result<Vec<Event>, ErrorInfo> {
        error!(app_id = %app_id, "pause requested for qml app");
        Err(ErrorInfo::general("no interface defined for qml booster"))
    }

    /// React to the booster service appearing or disappearing.
    pub(crate) async fn qml_service_status(
        &self,
        connected: bool,
    ) -> Result<Vec<Event>, LifecycleError> {
        if connected {
            let uri = format!("luna://{}/processFinished", self.config.booster_service);
            let token = self.executor.call_multi_reply(&uri, json!({"subscribe": true})).await?;
            self.qml.lock().signal = token;
            return Ok(vec![]);
        }

        let signal = std::mem::take(&mut self.qml.lock().signal);
        if !signal.is_none() {
            self.executor.execute(sam_core::Effect::CancelCall { token: signal }).await?;
        }
        Ok(vec![])
    }

    /// A booster process finished; map the pid back to its app.
    pub(crate) fn qml_process_finished(&self, payload: &Value) -> Vec<Event> {
        let pid = match payload.get("pid") {
            Some(Value::Number(pid)) => pid.to_string(),
            Some(Value::String(pid)) => pid.clone(),
            _ => {
                error!(payload = %payload, "processFinished without a pid");
                return vec![];
            }
        };

        let app_id = {
            let running = self.running.lock();
            running.get_by_pid(&pid).map(|info| info.app_id.clone())
        };
        let Some(app_id) = app_id else {
            error!(pid, "no app matched by finished pid");
            return vec![];
        };

        info!(app_id = %app_id, pid, "qml process finished");
        vec![
            Event::RuntimeStatusChanged {
                app_id: app_id.clone(),
                uid: None,
                status: RuntimeStatus::Stop,
            },
            Event::RunningAppRemoved { app_id },
        ]
    }
}
