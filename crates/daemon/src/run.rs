// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon wiring and the engine event loop.

use crate::env;
use crate::service;
use crate::settings::{Settings, SettingsError};
use parking_lot::Mutex;
use sam_bus::{BusClient, BusError, SocketBus};
use sam_core::{AppId, AppPackage, Clock, Event, SystemClock};
use sam_lifecycle::{
    ExecuteError, Manager, ManagerConfig, ManagerDeps, NativeProcesses, ProcessAdapter,
    RunningInfoTable, PREREQ_SETTINGS,
};
use sam_roster::Roster;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Idle tick when no timer is pending, so the loop stays responsive to a
/// timer armed from another task.
const IDLE_TICK: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("bus error: {0}")]
    Bus(#[from] BusError),

    #[error("engine error: {0}")]
    Execute(#[from] ExecuteError),

    #[error("bad apps index: {0}")]
    BadAppsIndex(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the whole daemon and run its event loop until shutdown.
pub async fn run_daemon(settings: Settings) -> Result<(), DaemonError> {
    let (event_tx, event_rx) = mpsc::channel(1024);
    let (bus, requests_rx) = SocketBus::new(&settings.socket_dir, event_tx.clone());

    // Register the service and all categories before anything attaches to
    // the loop; late category registration races client calls.
    let compat: Vec<String> = env::COMPAT_NAMES.iter().map(|name| name.to_string()).collect();
    bus.register_service(env::SERVICE_NAME, &compat).await?;
    bus.register_category("/", &service::general_methods()).await?;
    if settings.dev_mode {
        bus.register_category("/dev", &service::dev_methods()).await?;
        info!("dev mode: /dev category registered");
    }

    let roster = Arc::new(Mutex::new(Roster::new(
        settings.deleted_list_path(),
        settings.locale_fallbacks.clone(),
    )));
    let running = Arc::new(Mutex::new(RunningInfoTable::new()));
    let processes = NativeProcesses::new(event_tx.clone());

    let config = ManagerConfig {
        web_runtime_service: settings.web_runtime_service.clone(),
        booster_service: settings.booster_service.clone(),
        boot_service: settings.boot_service.clone(),
        keep_alive_apps: settings.keep_alive_apps.iter().map(AppId::new).collect(),
    };
    let manager = Arc::new(Manager::new(
        ManagerDeps {
            bus: bus.clone(),
            processes,
            roster: Arc::clone(&roster),
            running: Arc::clone(&running),
        },
        SystemClock,
        config,
        event_tx.clone(),
    ));

    manager.watch_services().await?;

    let server = bus.clone();
    tokio::spawn(async move {
        if let Err(e) = server.serve().await {
            error!(error = %e, "bus socket server failed");
        }
    });

    let service_ctx = service::ServiceContext {
        manager: Arc::clone(&manager),
        bus: bus.clone(),
        roster: Arc::clone(&roster),
        running: Arc::clone(&running),
        event_tx: event_tx.clone(),
    };
    tokio::spawn(service::dispatch_requests(requests_rx, service_ctx));

    // Settings are loaded by the time we get here; report the prerequisite.
    let _ = event_tx
        .send(Event::PrerequisiteResolved { name: PREREQ_SETTINGS.to_string(), passed: true })
        .await;

    // Consume the boot scan result. A broken index publishes an empty
    // roster rather than wedging launches forever.
    let packages = match &settings.apps_index {
        Some(index) => match load_apps_index(index) {
            Ok(packages) => packages,
            Err(e) => {
                error!(index = %index.display(), error = %e,
                       "unreadable apps index, publishing empty roster");
                Vec::new()
            }
        },
        None => {
            warn!("no apps index configured, starting with an empty roster");
            Vec::new()
        }
    };
    let _ = event_tx.send(Event::RosterScanned { packages, reason: "boot".to_string() }).await;

    info!("sam daemon up");
    run_event_loop(&manager, event_rx).await;
    Ok(())
}

/// Parse a pre-built package index file (a JSON array of appinfo records).
pub fn load_apps_index(path: &Path) -> Result<Vec<AppPackage>, DaemonError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// The engine loop: one event at a time, cascades processed in FIFO order,
/// timers interleaved between events.
pub async fn run_event_loop<B, P, C>(
    manager: &Manager<B, P, C>,
    mut event_rx: mpsc::Receiver<Event>,
) where
    B: BusClient,
    P: ProcessAdapter,
    C: Clock,
{
    loop {
        let deadline = manager.executor.scheduler().lock().next_deadline();
        let sleep_target = deadline.unwrap_or_else(|| Instant::now() + IDLE_TICK);

        tokio::select! {
            maybe_event = event_rx.recv() => {
                match maybe_event {
                    Some(Event::Shutdown) => {
                        info!("shutdown requested");
                        process_event_chain(manager, Event::Shutdown).await;
                        break;
                    }
                    Some(event) => process_event_chain(manager, event).await,
                    None => {
                        info!("event channel closed, engine loop exiting");
                        break;
                    }
                }
            }
            _ = tokio::time::sleep_until(tokio::time::Instant::from_std(sleep_target)) => {
                let due = {
                    let scheduler = manager.executor.scheduler();
                    let now = Instant::now();
                    let mut scheduler = scheduler.lock();
                    scheduler.take_due(now)
                };
                for id in due {
                    process_event_chain(manager, Event::TimerFired { id }).await;
                }
            }
        }
    }
}

/// Run one event and everything it cascades into.
async fn process_event_chain<B, P, C>(manager: &Manager<B, P, C>, event: Event)
where
    B: BusClient,
    P: ProcessAdapter,
    C: Clock,
{
    let mut queue = VecDeque::from([event]);
    while let Some(event) = queue.pop_front() {
        match manager.handle_event(event).await {
            Ok(result) => queue.extend(result),
            Err(e) => error!(error = %e, "event handling failed"),
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
