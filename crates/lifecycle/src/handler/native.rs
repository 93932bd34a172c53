// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Native app handler.
//!
//! Forks children directly and supervises them: version-2 clients must call
//! `registerApp` within 3 seconds of launch to get an event channel; close is
//! a graceful signal (or close event) escalated to SIGKILL on the process
//! group after 1 second. Launches that arrive while an instance is busy are
//! parked and pumped when the state resolves.

use crate::error::LifecycleError;
use crate::handler::NativeClientInfo;
use crate::item::CloseAppItem;
use crate::manager::Manager;
use crate::process::ProcessAdapter;
use sam_bus::BusClient;
use sam_core::{
    AppId, BusToken, Clock, Effect, ErrorInfo, Event, KillSignal, LaunchUid, RuntimeStatus,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How long a version-2 client has to register after launch.
pub(crate) const REGISTRATION_WINDOW: Duration = Duration::from_secs(3);
/// Grace period between the polite close and SIGKILL.
pub(crate) const FORCE_KILL_TIMEOUT: Duration = Duration::from_secs(1);

pub(crate) const KILL_TIMER_PREFIX: &str = "native-kill:";
pub(crate) const REG_TIMER_PREFIX: &str = "native-reg:";

pub(crate) struct NativeHandlerState {
    pub clients: HashMap<AppId, NativeClientInfo>,
    /// Launch items waiting for an instance to finish launching or closing.
    pub pending_launches: Vec<LaunchUid>,
}

impl NativeHandlerState {
    pub fn new() -> Self {
        Self { clients: HashMap::new(), pending_launches: Vec::new() }
    }

    pub fn client_app_by_pid(&self, pid: &str) -> Option<AppId> {
        self.clients.values().find(|client| client.pid == pid).map(|c| c.app_id.clone())
    }
}

impl<B, P, C> Manager<B, P, C>
where
    B: BusClient,
    P: ProcessAdapter,
    C: Clock,
{
    /// Entry point: dispatch a launch on the instance's runtime status.
    pub(crate) async fn native_launch(
        &self,
        uid: LaunchUid,
    ) -> Result<Vec<Event>, LifecycleError> {
        let prepared = {
            let roster = self.roster.lock();
            let items = self.launch_items.lock();
            let Some(item) = items.get(&uid) else {
                return Ok(vec![]);
            };
            roster.get(item.app_id().as_str()).map(|package| {
                let exe = if PathBuf::from(&package.main).is_absolute() {
                    PathBuf::from(&package.main)
                } else {
                    package.folder_path.join(&package.main)
                };
                (item.app_id().clone(), package.native_interface_version, exe)
            })
        };
        let Some((app_id, interface_version, exe)) = prepared else {
            error!(%uid, "no package for native launch");
            return self.fail_launch(uid, ErrorInfo::general("internal error")).await;
        };

        self.native
            .lock()
            .clients
            .entry(app_id.clone())
            .or_insert_with(|| NativeClientInfo::new(app_id.clone(), interface_version));

        let runtime_status = {
            let running = self.running.lock();
            running.get_app(&app_id).map(|info| info.runtime_status).unwrap_or(RuntimeStatus::Stop)
        };

        match runtime_status {
            RuntimeStatus::Stop => {
                self.native_launch_from_stop(uid, app_id, interface_version, exe).await
            }
            RuntimeStatus::Launching | RuntimeStatus::Preloading | RuntimeStatus::Closing => {
                info!(app_id = %app_id, status = %runtime_status, "parking native launch");
                self.native.lock().pending_launches.push(uid);
                Ok(vec![])
            }
            RuntimeStatus::Running | RuntimeStatus::Registered | RuntimeStatus::Pausing => {
                self.native_relaunch(uid, app_id).await
            }
        }
    }

    async fn native_launch_from_stop(
        &self,
        uid: LaunchUid,
        app_id: AppId,
        interface_version: u8,
        exe: PathBuf,
    ) -> Result<Vec<Event>, LifecycleError> {
        let (args, preloading) = {
            let items = self.launch_items.lock();
            match items.get(&uid) {
                Some(item) => (vec![item.params.to_string()], !item.preload.is_empty()),
                None => return Ok(vec![]),
            }
        };

        let pid = match self.executor.processes().spawn(&app_id, &exe, &args, &[]).await {
            Ok(pid) => pid,
            Err(e) => {
                error!(app_id = %app_id, error = %e, "native fork failed");
                self.native.lock().clients.remove(&app_id);
                return self
                    .fail_launch(uid, ErrorInfo::general("failed to launch the app"))
                    .await;
            }
        };

        if let Some(client) = self.native.lock().clients.get_mut(&app_id) {
            client.pid = pid.clone();
        }
        if let Some(item) = self.launch_items.lock().get_mut(&uid) {
            item.pid = pid.clone();
        }

        if interface_version >= 2 {
            self.executor
                .execute(Effect::SetTimer {
                    id: format!("{REG_TIMER_PREFIX}{app_id}"),
                    duration: REGISTRATION_WINDOW,
                })
                .await?;
        }

        let status =
            if preloading { RuntimeStatus::Preloading } else { RuntimeStatus::Launching };
        Ok(vec![
            Event::RuntimeStatusChanged {
                app_id: app_id.clone(),
                uid: Some(uid.clone()),
                status,
            },
            Event::RunningAppAdded { app_id: app_id.clone(), pid, web_pid: String::new() },
            Event::RuntimeStatusChanged {
                app_id,
                uid: None,
                status: RuntimeStatus::Running,
            },
            Event::LaunchingDone { uid },
        ])
    }

    /// Relaunch a live instance: registered clients get a relaunch event;
    /// unreachable ones are closed and the launch re-runs after the exit.
    async fn native_relaunch(
        &self,
        uid: LaunchUid,
        app_id: AppId,
    ) -> Result<Vec<Event>, LifecycleError> {
        let params = {
            let items = self.launch_items.lock();
            items.get(&uid).map(|item| item.params.clone()).unwrap_or(Value::Null)
        };

        let channel_payload = {
            let native = self.native.lock();
            native.clients.get(&app_id).and_then(|client| {
                if client.can_send() && !client.registration_expired {
                    client.channel.map(|token| (token, client.relaunch_payload(&params, "relaunch")))
                } else {
                    None
                }
            })
        };

        match channel_payload {
            Some((token, payload)) => {
                info!(app_id = %app_id, "sending relaunch event to registered client");
                self.executor.execute(Effect::Respond { token, payload }).await?;
                Ok(vec![
                    Event::RuntimeStatusChanged {
                        app_id,
                        uid: Some(uid.clone()),
                        status: RuntimeStatus::Launching,
                    },
                    Event::LaunchingDone { uid },
                ])
            }
            None => {
                // No usable channel: recycle the process and re-run the
                // launch once the exit is reaped.
                let pid = {
                    let running = self.running.lock();
                    running.get_app(&app_id).map(|info| info.pid.clone()).unwrap_or_default()
                };
                warn!(app_id = %app_id, pid, "client unreachable, recycling process for relaunch");
                if !pid.is_empty() {
                    self.executor
                        .execute(Effect::KillProcessGroup {
                            pid,
                            signal: KillSignal::Term,
                        })
                        .await?;
                    self.executor
                        .execute(Effect::SetTimer {
                            id: format!("{KILL_TIMER_PREFIX}{app_id}"),
                            duration: FORCE_KILL_TIMEOUT,
                        })
                        .await?;
                }
                self.native.lock().pending_launches.push(uid);
                Ok(vec![Event::RuntimeStatusChanged {
                    app_id,
                    uid: None,
                    status: RuntimeStatus::Closing,
                }])
            }
        }
    }

    /// A native client called `registerApp`; `channel` is its long-lived
    /// reply channel.
    pub(crate) async fn native_register(
        &self,
        app_id: AppId,
        channel: BusToken,
    ) -> Result<Vec<Event>, LifecycleError> {
        let ack = {
            let mut native = self.native.lock();
            native.clients.get_mut(&app_id).map(|client| {
                client.register(channel);
                client.registered_payload()
            })
        };

        let Some(ack) = ack else {
            info!(app_id = %app_id, "registerApp from unknown client");
            let payload = json!({ "returnValue": false, "errorText": "cannot find caller id" });
            self.executor.execute(Effect::Respond { token: channel, payload }).await?;
            return Ok(vec![]);
        };

        self.executor.execute(Effect::Respond { token: channel, payload: ack }).await?;
        self.executor
            .execute(Effect::CancelTimer { id: format!("{REG_TIMER_PREFIX}{app_id}") })
            .await?;
        info!(app_id = %app_id, "native client connected");

        let mut events = vec![Event::RuntimeStatusChanged {
            app_id: app_id.clone(),
            uid: None,
            status: RuntimeStatus::Registered,
        }];

        // Every launch parked on this registration becomes a relaunch.
        let parked = self.take_parked_launches(&app_id, usize::MAX);
        for uid in parked {
            info!(app_id = %app_id, %uid, "running launch that waited for registration");
            events.extend(self.native_relaunch(uid, app_id.clone()).await?);
        }
        Ok(events)
    }

    /// Close a native instance.
    pub(crate) async fn native_close(
        &self,
        item: &CloseAppItem,
    ) -> Result<Vec<Event>, ErrorInfo> {
        let client = {
            let native = self.native.lock();
            native.clients.get(&item.app_id).cloned()
        };
        let Some(client) = client else {
            info!(app_id = %item.app_id, "no native client to close");
            return Err(ErrorInfo::general("native app is not running"));
        };

        let runtime_status = {
            let running = self.running.lock();
            running
                .get_app(&item.app_id)
                .map(|info| info.runtime_status)
                .unwrap_or(RuntimeStatus::Stop)
        };
        if runtime_status == RuntimeStatus::Stop {
            info!(app_id = %item.app_id, "native app is not running");
            return Err(ErrorInfo::general("native app is not running"));
        }

        let pid = if client.pid.is_empty() { item.pid.clone() } else { client.pid.clone() };

        if item.is_memory_reclaim() {
            // Reclaim closes do not wait for the app's cooperation.
            info!(app_id = %item.app_id, pid, "memory reclaim, killing process group");
            let _ = self
                .executor
                .execute(Effect::KillProcessGroup { pid, signal: KillSignal::Kill })
                .await;
        } else if client.interface_version >= 2
            && client.can_send()
            && !client.registration_expired
        {
            if let Some(token) = client.channel {
                let payload = client.close_payload(&item.reason);
                let _ = self.executor.execute(Effect::Respond { token, payload }).await;
            }
            let _ = self
                .executor
                .execute(Effect::SetTimer {
                    id: format!("{KILL_TIMER_PREFIX}{}", item.app_id),
                    duration: FORCE_KILL_TIMEOUT,
                })
                .await;
        } else {
            let _ = self
                .executor
                .execute(Effect::KillProcessGroup { pid, signal: KillSignal::Term })
                .await;
            let _ = self
                .executor
                .execute(Effect::SetTimer {
                    id: format!("{KILL_TIMER_PREFIX}{}", item.app_id),
                    duration: FORCE_KILL_TIMEOUT,
                })
                .await;
        }

        Ok(vec![Event::RuntimeStatusChanged {
            app_id: item.app_id.clone(),
            uid: None,
            status: RuntimeStatus::Closing,
        }])
    }

    /// Pause a native instance through its event channel.
    pub(crate) async fn native_pause(
        &self,
        app_id: &AppId,
        params: &Value,
    ) -> Result<Vec<Event>, ErrorInfo> {
        let channel_payload = {
            let native = self.native.lock();
            native.clients.get(app_id).and_then(|client| {
                if client.can_send() && !client.registration_expired {
                    client.channel.map(|token| (token, client.pause_payload(params)))
                } else {
                    None
                }
            })
        };
        let Some((token, payload)) = channel_payload else {
            return Err(ErrorInfo::general("app is not registered"));
        };
        let _ = self.executor.execute(Effect::Respond { token, payload }).await;
        Ok(vec![Event::RuntimeStatusChanged {
            app_id: app_id.clone(),
            uid: None,
            status: RuntimeStatus::Pausing,
        }])
    }

    /// A forked child was reaped.
    pub(crate) async fn native_process_exited(
        &self,
        pid: &str,
        status: i32,
    ) -> Result<Vec<Event>, LifecycleError> {
        let app_id = {
            let native = self.native.lock();
            native.client_app_by_pid(pid)
        };
        let Some(app_id) = app_id else {
            debug!(pid, "exit for unknown native pid");
            return Ok(vec![]);
        };

        let closed_by_sam = {
            let running = self.running.lock();
            running
                .get_app(&app_id)
                .map(|info| info.runtime_status == RuntimeStatus::Closing)
                .unwrap_or(false)
        };
        info!(
            app_id = %app_id,
            pid,
            exit_status = status,
            closed_by = if closed_by_sam { "sam" } else { "itself" },
            "native app exited"
        );

        self.native.lock().clients.remove(&app_id);
        self.executor
            .execute(Effect::CancelTimer { id: format!("{KILL_TIMER_PREFIX}{app_id}") })
            .await?;
        self.executor
            .execute(Effect::CancelTimer { id: format!("{REG_TIMER_PREFIX}{app_id}") })
            .await?;

        let mut events = vec![
            Event::RuntimeStatusChanged {
                app_id: app_id.clone(),
                uid: None,
                status: RuntimeStatus::Stop,
            },
            Event::RunningAppRemoved { app_id: app_id.clone() },
        ];

        // One parked launch gets to run now that the instance is gone. It is
        // re-admitted behind the Stop transition above, so the dispatch sees
        // a stopped instance.
        for uid in self.take_parked_launches(&app_id, 1) {
            info!(app_id = %app_id, %uid, "running launch that waited for close");
            events.push(Event::MemoryCheckDone { uid });
        }
        Ok(events)
    }

    /// The 1 s close grace expired: force-kill the group.
    pub(crate) async fn native_kill_timeout(
        &self,
        app_id: &AppId,
    ) -> Result<Vec<Event>, LifecycleError> {
        let pid = {
            let native = self.native.lock();
            native.clients.get(app_id).map(|client| client.pid.clone()).unwrap_or_default()
        };
        if pid.is_empty() {
            return Ok(vec![]);
        }
        warn!(app_id = %app_id, pid, "close grace expired, killing process group");
        self.executor
            .execute(Effect::KillProcessGroup { pid, signal: KillSignal::Kill })
            .await?;
        Ok(vec![])
    }

    /// The 3 s registration window expired.
    pub(crate) fn native_registration_timeout(&self, app_id: &AppId) {
        let mut native = self.native.lock();
        if let Some(client) = native.clients.get_mut(app_id) {
            if !client.registered {
                warn!(app_id = %app_id, "registration window expired");
                client.registration_expired = true;
            }
        }
    }

    /// Remove up to `limit` parked launches targeting `app_id`.
    fn take_parked_launches(&self, app_id: &AppId, limit: usize) -> Vec<LaunchUid> {
        let items = self.launch_items.lock();
        let mut native = self.native.lock();
        let mut taken = Vec::new();
        native.pending_launches.retain(|uid| {
            if taken.len() < limit
                && items.get(uid).is_some_and(|item| item.app_id() == app_id)
            {
                taken.push(uid.clone());
                false
            } else {
                true
            }
        });
        taken
    }
}
