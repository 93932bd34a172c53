// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event dispatch for the lifecycle engine.

use crate::error::LifecycleError;
use crate::handler::{
    KILL_TIMER_PREFIX, LOADING_GUARD_TIMER, REG_TIMER_PREFIX,
};
use crate::manager::tasks::LaunchRequest;
use crate::manager::{Manager, PREREQ_BOOT};
use crate::process::ProcessAdapter;
use crate::ready::PrerequisiteResult;
use sam_bus::BusClient;
use sam_core::{AppId, AppPackage, BusToken, Clock, Event};
use serde_json::Value;
use tracing::{debug, info, warn};

impl<B, P, C> Manager<B, P, C>
where
    B: BusClient,
    P: ProcessAdapter,
    C: Clock,
{
    /// Handle one incoming event and return any produced events.
    ///
    /// The engine loop feeds returned events straight back in, so cascades
    /// (prelaunch done → memory check → handler dispatch) stay ordered.
    pub async fn handle_event(&self, event: Event) -> Result<Vec<Event>, LifecycleError> {
        match event {
            Event::LaunchApp {
                id,
                display,
                params,
                preload,
                keep_alive,
                no_splash,
                spinner,
                caller_id,
                caller_pid,
                reply,
            } => {
                self.handle_launch(LaunchRequest {
                    id,
                    display,
                    params,
                    preload,
                    keep_alive,
                    no_splash,
                    spinner,
                    caller_id,
                    caller_pid,
                    reply,
                })
                .await
            }

            Event::CloseApp { id, display, caller_id, reason, reply } => {
                self.handle_close(id, display, caller_id, reason, reply).await
            }

            Event::PauseApp { id, params, reply } => self.handle_pause(id, params, reply).await,

            Event::CloseAllApps { reason } => self.handle_close_all(reason).await,

            Event::RegisterNativeApp { id, client } => self.native_register(id, client).await,

            Event::PrelaunchDone { uid } => self.on_prelaunch_done(uid).await,

            Event::MemoryCheckDone { uid } => self.on_memory_check_done(uid).await,

            Event::LaunchingDone { uid } => self.on_launching_done(uid).await,

            Event::BusReply { token, payload } => self.on_bus_reply(token, &payload).await,

            Event::ServiceStatus { service, connected } => {
                self.on_service_status(&service, connected).await
            }

            Event::RuntimeStatusChanged { app_id, uid, status } => {
                self.on_runtime_status(app_id, uid, status).await
            }

            Event::RunningAppAdded { app_id, pid, web_pid } => {
                self.on_running_app_added(app_id, pid, web_pid).await
            }

            Event::RunningAppRemoved { app_id } => self.on_running_app_removed(app_id).await,

            Event::ProcessExited { pid, status } => {
                self.native_process_exited(&pid, status).await
            }

            Event::TimerFired { id } => self.on_timer_fired(&id).await,

            Event::RosterScanned { packages, reason } => {
                self.on_roster_scanned(packages, reason).await
            }

            Event::RosterAppScanned { id, package, reason } => {
                self.on_roster_app_scanned(id, package.map(|package| *package), reason).await
            }

            Event::RosterUpdated { changes } => self.on_roster_updated(&changes).await,

            Event::PrerequisiteResolved { name, passed } => {
                self.on_prerequisite(&name, passed);
                Ok(vec![])
            }

            Event::Shutdown => self.cancel_pipeline().await,

            Event::Custom => Ok(vec![]),
        }
    }

    /// Route a bus reply to whoever issued the call.
    async fn on_bus_reply(
        &self,
        token: BusToken,
        payload: &Value,
    ) -> Result<Vec<Event>, LifecycleError> {
        // Resolve the owner before awaiting anything; the lookups below must
        // not hold their locks into the handlers.
        let prelaunch_uid = self.prelauncher.lock().take_pending(token);
        if let Some(uid) = prelaunch_uid {
            return self.on_prelaunch_reply(uid, payload).await;
        }
        let web_uid = self.web.lock().pending.remove(&token);
        if let Some(uid) = web_uid {
            return self.web_launch_reply(uid, payload).await;
        }
        let qml_uid = self.qml.lock().pending.remove(&token);
        if let Some(uid) = qml_uid {
            return self.qml_launch_reply(uid, payload).await;
        }
        let web_subscription = self.web.lock().subscription;
        if web_subscription == token {
            return self.web_running_list(payload).await;
        }
        let qml_signal = self.qml.lock().signal;
        if qml_signal == token {
            return Ok(self.qml_process_finished(payload));
        }
        debug!(token = token.0, "unroutable bus reply");
        Ok(vec![])
    }

    async fn on_service_status(
        &self,
        service: &str,
        connected: bool,
    ) -> Result<Vec<Event>, LifecycleError> {
        info!(service, connected, "peer service status changed");
        if service == self.config.web_runtime_service {
            return self.web_service_status(connected).await;
        }
        if service == self.config.booster_service {
            return self.qml_service_status(connected).await;
        }
        if service == self.config.boot_service && connected {
            return Ok(vec![Event::PrerequisiteResolved {
                name: PREREQ_BOOT.to_string(),
                passed: true,
            }]);
        }
        Ok(vec![])
    }

    async fn on_timer_fired(&self, id: &str) -> Result<Vec<Event>, LifecycleError> {
        if id == LOADING_GUARD_TIMER {
            return self.web_loading_timeout().await;
        }
        if let Some(app_id) = id.strip_prefix(KILL_TIMER_PREFIX) {
            return self.native_kill_timeout(&AppId::new(app_id)).await;
        }
        if let Some(app_id) = id.strip_prefix(REG_TIMER_PREFIX) {
            self.native_registration_timeout(&AppId::new(app_id));
            return Ok(vec![]);
        }
        debug!(timer = id, "unknown timer");
        Ok(vec![])
    }

    /// A full scan result arrived. Tasks received while it is applied are
    /// held and re-emitted afterwards, launches held for readiness flush too.
    async fn on_roster_scanned(
        &self,
        packages: Vec<AppPackage>,
        reason: String,
    ) -> Result<Vec<Event>, LifecycleError> {
        self.set_scanning(true);
        let changes = self.roster.lock().apply_scan(packages, &reason);
        self.set_scanning(false);

        let mut events = Vec::new();
        if !changes.is_empty() {
            events.push(Event::RosterUpdated { changes });
        }
        events.append(&mut self.pending_scan.lock());
        events.append(&mut self.pending_ready.lock());
        Ok(events)
    }

    async fn on_roster_app_scanned(
        &self,
        id: AppId,
        package: Option<AppPackage>,
        reason: String,
    ) -> Result<Vec<Event>, LifecycleError> {
        self.set_scanning(true);
        let change = self.roster.lock().apply_one(&id, package, &reason);
        self.set_scanning(false);

        let mut events = Vec::new();
        if let Some(change) = change {
            events.push(Event::RosterUpdated { changes: vec![change] });
        }
        events.append(&mut self.pending_scan.lock());
        Ok(events)
    }

    pub(crate) fn on_prerequisite(&self, name: &str, passed: bool) {
        if let Some(result) = self.monitor.lock().set_status(name, passed) {
            match result {
                PrerequisiteResult::Passed => info!("startup prerequisites passed"),
                PrerequisiteResult::Failed => {
                    warn!("startup prerequisites failed, continuing degraded")
                }
            }
        }
    }
}
