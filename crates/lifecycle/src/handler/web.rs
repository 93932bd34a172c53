// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Web runtime handler.
//!
//! Launches go through the web runtime's `launchApp`; liveness comes from a
//! subscription to its `listRunningApps`, diffed list against list. Apps that
//! were launched but have not yet shown up on the running list are "loading".

use crate::error::LifecycleError;
use crate::item::CloseAppItem;
use crate::manager::Manager;
use crate::process::ProcessAdapter;
use sam_bus::BusClient;
use sam_core::{
    AppId, BusToken, Clock, Effect, ErrorInfo, Event, LaunchUid, RuntimeStatus,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{error, info, warn};

/// Guard for the first launch completing while the runtime warms up.
const LOADING_GUARD_TIMEOUT: Duration = Duration::from_secs(30);
pub(crate) const LOADING_GUARD_TIMER: &str = "web:loading-guard";

const INVALID_WEB_PID: &str = "-1";
const ZERO_WEB_PID: &str = "0";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WebRunningEntry {
    pub id: AppId,
    pub pid: String,
    pub web_pid: String,
}

pub(crate) struct WebHandlerState {
    /// Outstanding launchApp calls, token → item.
    pub pending: HashMap<BusToken, LaunchUid>,
    /// Launched but not yet on the runtime's running list.
    pub loading: Vec<AppId>,
    /// Last running list received from the runtime.
    pub running_list: Vec<WebRunningEntry>,
    /// listRunningApps subscription token; NONE while disconnected.
    pub subscription: BusToken,
}

impl WebHandlerState {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
            loading: Vec::new(),
            running_list: Vec::new(),
            subscription: BusToken::NONE,
        }
    }

    pub fn is_loading(&self, app_id: &AppId) -> bool {
        self.loading.contains(app_id)
    }

    fn add_loading(&mut self, app_id: &AppId) -> bool {
        let was_empty = self.loading.is_empty();
        if !self.loading.contains(app_id) {
            info!(app_id = %app_id, "added to web loading list");
            self.loading.push(app_id.clone());
        }
        was_empty
    }

    fn remove_loading(&mut self, app_id: &AppId) {
        if self.loading.contains(app_id) {
            info!(app_id = %app_id, "removed from web loading list");
            self.loading.retain(|id| id != app_id);
        }
    }
}

impl<B, P, C> Manager<B, P, C>
where
    B: BusClient,
    P: ProcessAdapter,
    C: Clock,
{
    /// Issue `launchApp` for an item and mark the app loading.
    pub(crate) async fn web_launch(&self, uid: LaunchUid) -> Result<Vec<Event>, LifecycleError> {
        let prepared = {
            let roster = self.roster.lock();
            let items = self.launch_items.lock();
            let Some(item) = items.get(&uid) else {
                return Ok(vec![]);
            };
            roster.get(item.app_id().as_str()).map(|package| {
                let mut payload = json!({
                    "appDesc": package.to_json(),
                    "reason": item.launch_reason,
                    "parameters": item.params,
                    "launchingAppId": item.caller_id,
                    "launchingProcId": item.caller_pid,
                    "keepAlive": item.keep_alive
                        || self.config.keep_alive_apps.contains(item.app_id()),
                });
                if !item.preload.is_empty() {
                    payload["preload"] = Value::String(item.preload.clone());
                }
                let uri = format!("luna://{}/launchApp", self.config.web_runtime_service);
                (uri, payload, item.app_id().clone(), !item.preload.is_empty())
            })
        };
        let Some((uri, payload, app_id, preloading)) = prepared else {
            error!(%uid, "no package for web launch");
            return self.fail_launch(uid, ErrorInfo::general("internal error")).await;
        };

        let token = match self.executor.call_one_reply(&uri, payload).await {
            Ok(token) => token,
            Err(e) => {
                error!(app_id = %app_id, error = %e, "web launchApp call failed");
                return self.fail_launch(uid, ErrorInfo::general("internal error")).await;
            }
        };

        let arm_guard = {
            let mut web = self.web.lock();
            web.pending.insert(token, uid.clone());
            web.add_loading(&app_id)
        };
        if let Some(item) = self.launch_items.lock().get_mut(&uid) {
            item.return_token = token;
        }
        if arm_guard {
            self.executor
                .execute(Effect::SetTimer {
                    id: LOADING_GUARD_TIMER.to_string(),
                    duration: LOADING_GUARD_TIMEOUT,
                })
                .await?;
        }

        let status =
            if preloading { RuntimeStatus::Preloading } else { RuntimeStatus::Launching };
        Ok(vec![Event::RuntimeStatusChanged { app_id, uid: Some(uid), status }])
    }

    /// Handle the `launchApp` reply for an item.
    pub(crate) async fn web_launch_reply(
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

        // The runtime omits returnValue on success; an explicit false is the
        // failure signal.
        if payload.get("returnValue").and_then(Value::as_bool) == Some(false) {
            error!(app_id = %app_id, reply = %payload, "web runtime refused launch");
            self.web.lock().remove_loading(&app_id);
            let mut events = self
                .fail_launch(uid, ErrorInfo::general("web runtime launchApp failed"))
                .await?;
            events.push(Event::RuntimeStatusChanged {
                app_id,
                uid: None,
                status: RuntimeStatus::Stop,
            });
            return Ok(events);
        }

        if let Some(item) = self.launch_items.lock().get_mut(&uid) {
            if let Some(proc_id) = payload.get("procId").and_then(Value::as_str) {
                item.pid = proc_id.to_string();
            }
        }
        info!(app_id = %app_id, "received launch return from web runtime");
        Ok(vec![Event::LaunchingDone { uid }])
    }

    /// Issue `killApp`. The app must be running or still loading.
    pub(crate) async fn web_close(
        &self,
        item: &CloseAppItem,
    ) -> Result<Vec<Event>, ErrorInfo> {
        // "Running" here means the runtime's own list has the app; an app we
        // launched that has not shown up yet is only loading.
        let loading_only = {
            let web = self.web.lock();
            if web.running_list.iter().any(|entry| entry.id == item.app_id) {
                false
            } else if web.is_loading(&item.app_id) {
                true
            } else {
                info!(app_id = %item.app_id, "web app is not running");
                return Err(ErrorInfo::general("app is not running"));
            }
        };

        let uri = format!("luna://{}/killApp", self.config.web_runtime_service);
        let payload = json!({ "appId": item.app_id, "reason": item.reason });
        if self.executor.call_one_reply(&uri, payload).await.is_err() {
            return Err(ErrorInfo::general("kill request fail"));
        }

        let mut events = vec![Event::RuntimeStatusChanged {
            app_id: item.app_id.clone(),
            uid: None,
            status: RuntimeStatus::Closing,
        }];
        if loading_only {
            // The running list never saw this app; close it out manually.
            self.web.lock().remove_loading(&item.app_id);
            info!(app_id = %item.app_id, "closing app that was still loading");
            events.push(Event::RuntimeStatusChanged {
                app_id: item.app_id.clone(),
                uid: None,
                status: RuntimeStatus::Stop,
            });
        }
        Ok(events)
    }

    /// Issue `pauseApp`.
    pub(crate) async fn web_pause(
        &self,
        app_id: &AppId,
        params: &Value,
    ) -> Result<Vec<Event>, ErrorInfo> {
        let uri = format!("luna://{}/pauseApp", self.config.web_runtime_service);
        let payload = json!({ "appId": app_id, "reason": "pause", "parameters": params });
        if self.executor.call_one_reply(&uri, payload).await.is_err() {
            return Err(ErrorInfo::general("pause request fail"));
        }
        Ok(vec![Event::RuntimeStatusChanged {
            app_id: app_id.clone(),
            uid: None,
            status: RuntimeStatus::Pausing,
        }])
    }

    /// React to the web runtime service appearing or disappearing.
    pub(crate) async fn web_service_status(
        &self,
        connected: bool,
    ) -> Result<Vec<Event>, LifecycleError> {
        if connected {
            let uri =
                format!("luna://{}/listRunningApps", self.config.web_runtime_service);
            let token = self
                .executor
                .call_multi_reply(&uri, json!({"includeSysApps": true, "subscribe": true}))
                .await?;
            self.web.lock().subscription = token;
            return Ok(vec![]);
        }

        // Disconnected: drop the subscription and fail whatever was loading.
        let (subscription, loading) = {
            let mut web = self.web.lock();
            let subscription = std::mem::take(&mut web.subscription);
            let loading = std::mem::take(&mut web.loading);
            web.running_list.clear();
            (subscription, loading)
        };
        if !subscription.is_none() {
            self.executor.execute(Effect::CancelCall { token: subscription }).await?;
        }
        warn!("web runtime service disconnected");

        let mut events = Vec::new();
        for app_id in loading {
            let uid = self
                .launch_items
                .lock()
                .values()
                .find(|item| item.app_id() == &app_id)
                .map(|item| item.uid().clone());
            if let Some(uid) = uid {
                events.extend(
                    self.fail_launch(uid, ErrorInfo::general("web runtime disconnected"))
                        .await?,
                );
            }
            events.push(Event::RuntimeStatusChanged {
                app_id,
                uid: None,
                status: RuntimeStatus::Stop,
            });
        }
        Ok(events)
    }

    /// Diff a fresh running list from the runtime against the previous one.
    pub(crate) async fn web_running_list(
        &self,
        payload: &Value,
    ) -> Result<Vec<Event>, LifecycleError> {
        let new_list: Vec<WebRunningEntry> = payload
            .get("running")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| WebRunningEntry {
                        id: AppId::new(
                            entry.get("id").and_then(Value::as_str).unwrap_or_default(),
                        ),
                        pid: entry
                            .get("processid")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        web_pid: entry
                            .get("webprocessid")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut events = Vec::new();
        let old_list = {
            let web = self.web.lock();
            web.running_list.clone()
        };

        for old in &old_list {
            let (removed, changed) = match new_list.iter().find(|new| new.id == old.id) {
                Some(new) if new.web_pid == old.web_pid => (false, false),
                Some(_) => (true, true),
                None => (true, false),
            };
            if !removed {
                continue;
            }
            info!(app_id = %old.id, changed, "web app left running list");
            if !changed {
                events.push(Event::RuntimeStatusChanged {
                    app_id: old.id.clone(),
                    uid: None,
                    status: RuntimeStatus::Stop,
                });
            }
            if old.web_pid != INVALID_WEB_PID && old.web_pid != ZERO_WEB_PID {
                events.push(Event::RunningAppRemoved { app_id: old.id.clone() });
            }
        }

        for new in &new_list {
            let (added, changed) = match old_list.iter().find(|old| old.id == new.id) {
                Some(old) if old.web_pid == new.web_pid => (false, false),
                Some(_) => (true, true),
                None => (true, false),
            };
            if !added {
                continue;
            }
            // The runtime reports transient invalid web-process ids.
            if new.web_pid == INVALID_WEB_PID || new.web_pid == ZERO_WEB_PID {
                warn!(app_id = %new.id, web_pid = %new.web_pid, "ignoring invalid web pid");
                continue;
            }
            info!(app_id = %new.id, pid = %new.pid, changed, "web app joined running list");
            events.push(Event::RunningAppAdded {
                app_id: new.id.clone(),
                pid: new.pid.clone(),
                web_pid: new.web_pid.clone(),
            });
            let disarm_guard = {
                let mut web = self.web.lock();
                web.remove_loading(&new.id);
                web.loading.is_empty()
            };
            if disarm_guard {
                self.executor
                    .execute(Effect::CancelTimer { id: LOADING_GUARD_TIMER.to_string() })
                    .await?;
            }
            if !changed {
                events.push(Event::RuntimeStatusChanged {
                    app_id: new.id.clone(),
                    uid: None,
                    status: RuntimeStatus::Running,
                });
            }
        }

        self.web.lock().running_list = new_list;
        Ok(events)
    }

    /// The 30 s loading guard fired: whatever is still loading is stuck.
    pub(crate) async fn web_loading_timeout(&self) -> Result<Vec<Event>, LifecycleError> {
        let stuck = {
            let mut web = self.web.lock();
            std::mem::take(&mut web.loading)
        };
        let mut events = Vec::new();
        for app_id in stuck {
            warn!(app_id = %app_id, "web app never reached the running list");
            let uid = self
                .launch_items
                .lock()
                .values()
                .find(|item| item.app_id() == &app_id)
                .map(|item| item.uid().clone());
            if let Some(uid) = uid {
                events
                    .extend(self.fail_launch(uid, ErrorInfo::general("loading timeout")).await?);
            }
            events.push(Event::RuntimeStatusChanged {
                app_id,
                uid: None,
                status: RuntimeStatus::Stop,
            });
        }
        Ok(events)
    }
}
