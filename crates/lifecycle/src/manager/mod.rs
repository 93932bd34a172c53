// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The lifecycle manager.
//!
//! Single serial driver for every launch, close, and pause: gates tasks on
//! roster readiness, walks launches through the prelaunch pipeline and the
//! memory checker, dispatches to the per-runtime handlers, and applies every
//! resulting transition through the route tables.

mod events;
mod fanout;
mod status;
mod tasks;

/// Well-known subscription keys.
pub mod keys {
    pub const RUNNING: &str = "running";
    pub const DEV_RUNNING: &str = "dev_running";
    pub const LIFE_EVENTS: &str = "getAppLifeEvents";
    pub const LIFE_STATUS: &str = "getAppLifeStatus";
    pub const FOREGROUND: &str = "foregroundAppInfo";
    pub const FOREGROUND_EX: &str = "foregroundAppInfoEx";
    pub const LIST_APPS: &str = "listApps";

    /// Per-app status key; `with_info` selects the appinfo-bearing variant.
    pub fn app_status(app_id: &str, with_info: bool) -> String {
        format!("getappstatus#{}#{}", app_id, if with_info { "Y" } else { "N" })
    }
}

use crate::executor::Executor;
use crate::item::LaunchAppItem;
use crate::memory::MemoryChecker;
use crate::prelaunch::{PrelaunchAction, Prelauncher, StageSeeder};
use crate::process::ProcessAdapter;
use crate::ready::PrerequisiteMonitor;
use crate::running::RunningInfoTable;
use crate::scheduler::Scheduler;
use crate::handler::{NativeHandlerState, QmlHandlerState, WebHandlerState};
use parking_lot::Mutex;
use sam_bus::BusClient;
use sam_core::{AppId, BusToken, Clock, Event, LaunchUid};
use sam_roster::Roster;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Names of the two startup prerequisites.
pub const PREREQ_SETTINGS: &str = "settings";
pub const PREREQ_BOOT: &str = "boot";

/// Peer-service wiring and policy knobs.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Web runtime service name (launchApp / killApp / pauseApp / listRunningApps).
    pub web_runtime_service: String,
    /// QML booster service name (launch / close / processFinished).
    pub booster_service: String,
    /// Service whose availability means "boot done".
    pub boot_service: String,
    /// Apps the web runtime should keep alive in the background on close.
    pub keep_alive_apps: Vec<AppId>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            web_runtime_service: "com.palm.webappmanager".to_string(),
            booster_service: "com.webos.booster".to_string(),
            boot_service: "com.webos.bootmanager".to_string(),
            keep_alive_apps: Vec::new(),
        }
    }
}

/// External dependencies handed to the manager.
pub struct ManagerDeps<B, P> {
    pub bus: B,
    pub processes: P,
    pub roster: Arc<Mutex<Roster>>,
    pub running: Arc<Mutex<RunningInfoTable>>,
}

/// The lifecycle engine. One per daemon.
pub struct Manager<B: BusClient, P: ProcessAdapter, C: Clock> {
    pub executor: Executor<B, P, C>,
    pub(crate) config: ManagerConfig,
    pub(crate) roster: Arc<Mutex<Roster>>,
    pub(crate) running: Arc<Mutex<RunningInfoTable>>,
    /// Every in-flight launch item, keyed by uid. The item's `stage` field
    /// says which pipeline step owns it right now.
    pub(crate) launch_items: Mutex<HashMap<LaunchUid, LaunchAppItem>>,
    pub(crate) prelauncher: Mutex<Prelauncher>,
    pub(crate) memory_checker: Mutex<MemoryChecker>,
    pub(crate) web: Mutex<WebHandlerState>,
    pub(crate) qml: Mutex<QmlHandlerState>,
    pub(crate) native: Mutex<NativeHandlerState>,
    pub(crate) monitor: Mutex<PrerequisiteMonitor>,
    /// Launch requests held until the roster's first scan lands.
    pub(crate) pending_ready: Mutex<Vec<Event>>,
    /// Any task held while a roster scan is being applied.
    pub(crate) pending_scan: Mutex<Vec<Event>>,
    pub(crate) scanning: AtomicBool,
    /// Per-subscriber property projections for `listAppsCompact`.
    pub(crate) compact_props: Mutex<HashMap<BusToken, Vec<String>>>,
}

impl<B, P, C> Manager<B, P, C>
where
    B: BusClient,
    P: ProcessAdapter,
    C: Clock,
{
    pub fn new(
        deps: ManagerDeps<B, P>,
        clock: C,
        config: ManagerConfig,
        event_tx: mpsc::Sender<Event>,
    ) -> Self {
        let scheduler = Arc::new(Mutex::new(Scheduler::new()));
        let mut monitor = PrerequisiteMonitor::new();
        monitor.add_item(PREREQ_SETTINGS);
        monitor.add_item(PREREQ_BOOT);

        Self {
            executor: Executor::new(deps.bus, deps.processes, clock, scheduler, event_tx),
            config,
            roster: deps.roster,
            running: deps.running,
            launch_items: Mutex::new(HashMap::new()),
            prelauncher: Mutex::new(Prelauncher::new()),
            memory_checker: Mutex::new(MemoryChecker::new()),
            web: Mutex::new(WebHandlerState::new()),
            qml: Mutex::new(QmlHandlerState::new()),
            native: Mutex::new(NativeHandlerState::new()),
            monitor: Mutex::new(monitor),
            pending_ready: Mutex::new(Vec::new()),
            pending_scan: Mutex::new(Vec::new()),
            scanning: AtomicBool::new(false),
            compact_props: Mutex::new(HashMap::new()),
        }
    }

    /// Watch the peer services whose state the handlers depend on. Called
    /// once at startup, after category registration.
    pub async fn watch_services(&self) -> Result<(), crate::executor::ExecuteError> {
        let bus = self.executor.bus();
        bus.watch_server_status(&self.config.web_runtime_service).await?;
        bus.watch_server_status(&self.config.booster_service).await?;
        bus.watch_server_status(&self.config.boot_service).await?;
        Ok(())
    }

    pub(crate) fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::Relaxed)
    }

    pub(crate) fn set_scanning(&self, scanning: bool) {
        self.scanning.store(scanning, Ordering::Relaxed);
    }

    /// Run `f` against the pipeline state of one item with a stage seeder
    /// bound to the current roster and running-info contents.
    pub(crate) fn with_pipeline<R>(
        &self,
        uid: &LaunchUid,
        f: impl FnOnce(&mut Prelauncher, &mut LaunchAppItem, StageSeeder<'_>) -> R,
    ) -> Option<R> {
        let roster = self.roster.lock();
        let running = self.running.lock();
        let seed = move |item: &mut LaunchAppItem| {
            crate::stage::seed_stages(item, &roster, &running)
        };
        let mut items = self.launch_items.lock();
        let item = items.get_mut(uid)?;
        let mut prelauncher = self.prelauncher.lock();
        Some(f(&mut prelauncher, item, &seed))
    }

    /// Register a `listAppsCompact` subscriber's property projection.
    pub fn register_compact_subscriber(&self, token: BusToken, properties: Vec<String>) {
        self.compact_props.lock().insert(token, properties);
    }

    /// Follow an action returned by the prelauncher: issue the stage call or
    /// report completion.
    pub(crate) async fn drive_prelaunch(
        &self,
        uid: LaunchUid,
        action: PrelaunchAction,
    ) -> Result<Vec<Event>, crate::error::LifecycleError> {
        match action {
            PrelaunchAction::Wait => Ok(vec![]),
            PrelaunchAction::Done => Ok(vec![Event::PrelaunchDone { uid }]),
            PrelaunchAction::Call { uri, payload, .. } => {
                match self.executor.call_one_reply(&uri, payload).await {
                    Ok(token) => {
                        if let Some(item) = self.launch_items.lock().get_mut(&uid) {
                            item.return_token = token;
                        }
                        self.prelauncher.lock().note_call(uid, token);
                        Ok(vec![])
                    }
                    Err(e) => {
                        tracing::error!(%uid, error = %e, "prelaunch stage call failed");
                        if let Some(item) = self.launch_items.lock().get_mut(&uid) {
                            item.set_error(sam_core::ErrorInfo::general("internal error"));
                        }
                        self.prelauncher.lock().abort(&uid);
                        Ok(vec![Event::PrelaunchDone { uid }])
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../manager_tests/mod.rs"]
mod tests;
