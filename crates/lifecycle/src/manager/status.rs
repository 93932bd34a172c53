// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transition routing: every status change a handler reports goes through
//! the route tables before it touches the running-info table or a
//! subscriber.

use crate::error::LifecycleError;
use crate::manager::Manager;
use crate::process::ProcessAdapter;
use sam_bus::BusClient;
use sam_core::{
    life_route, life_status_of, runtime_route, AppId, Clock, DisplayId, Event, LaunchUid,
    LifeStatus, RouteAction, RouteLog, RoutePolicy, RuntimeStatus,
};
use tracing::{debug, error, info, warn};

impl<B, P, C> Manager<B, P, C>
where
    B: BusClient,
    P: ProcessAdapter,
    C: Clock,
{
    /// A handler reported a runtime-level status. Route it at the runtime
    /// level, then derive and route the observable life status.
    pub(crate) async fn on_runtime_status(
        &self,
        app_id: AppId,
        uid: Option<LaunchUid>,
        proposed: RuntimeStatus,
    ) -> Result<Vec<Event>, LifecycleError> {
        let item_display = match uid.as_ref() {
            Some(uid) => self.launch_items.lock().get(uid).map(|item| item.display.clone()),
            None => None,
        };
        let display = item_display.unwrap_or_else(|| self.display_of(&app_id));

        {
            let mut running = self.running.lock();
            let entry = running.get_or_add(&app_id, &display);
            let current = entry.runtime_status;
            if runtime_route(current, proposed) == RouteAction::Set {
                info!(app_id = %app_id, from = %current, to = %proposed, "runtime status changed");
                entry.runtime_status = proposed;
            } else {
                debug!(app_id = %app_id, current = %current, proposed = %proposed,
                       "skip set runtime status");
            }
        }

        self.set_life_status(&app_id, &display, life_status_of(proposed)).await
    }

    /// Route and apply an observable life status, fanning out on success.
    pub(crate) async fn set_life_status(
        &self,
        app_id: &AppId,
        display: &DisplayId,
        proposed: LifeStatus,
    ) -> Result<Vec<Event>, LifecycleError> {
        let applied = {
            let mut running = self.running.lock();
            let entry = running.get_or_add(app_id, display);
            let current = entry.life_status;
            let route = life_route(current, proposed);
            log_route(app_id, current, proposed, &route);
            if route.action == RouteAction::Set {
                entry.life_status = route.next;
                Some((current, route.next, entry.pid.clone()))
            } else {
                None
            }
        };
        let Some((previous, next, pid)) = applied else {
            return Ok(vec![]);
        };

        let mut effects = Vec::new();

        {
            let mut running = self.running.lock();
            if next == LifeStatus::Foreground {
                running.set_foreground(app_id);
            } else if previous == LifeStatus::Foreground {
                running.clear_foreground(app_id);
            }
        }
        if next == LifeStatus::Foreground || previous == LifeStatus::Foreground {
            effects.extend(self.foreground_effects());
        }

        effects.extend(self.life_status_effects(app_id, next, &pid));

        if next == LifeStatus::Stop {
            // The record goes away with the instance; removal-flagged
            // records were only waiting for this.
            let removed = {
                let mut running = self.running.lock();
                running.remove(app_id, display)
            };
            if removed.as_ref().is_some_and(|info| info.removal_flag) {
                info!(app_id = %app_id, "removed running info for flagged app");
            }
            effects.extend(self.running_effects());
        }

        self.executor.execute_all(effects).await?;
        Ok(vec![])
    }

    /// A runtime reported a live instance: record its pids.
    pub(crate) async fn on_running_app_added(
        &self,
        app_id: AppId,
        pid: String,
        web_pid: String,
    ) -> Result<Vec<Event>, LifecycleError> {
        {
            let display = self.display_of(&app_id);
            let mut running = self.running.lock();
            let entry = running.get_or_add(&app_id, &display);
            entry.pid = pid;
            entry.web_pid = web_pid;
        }
        let effects = self.running_effects();
        self.executor.execute_all(effects).await?;
        Ok(vec![])
    }

    /// A runtime reported an instance gone. The record itself is removed by
    /// the Stop transition; this only refreshes subscribers.
    pub(crate) async fn on_running_app_removed(
        &self,
        _app_id: AppId,
    ) -> Result<Vec<Event>, LifecycleError> {
        let effects = self.running_effects();
        self.executor.execute_all(effects).await?;
        Ok(vec![])
    }

    pub(crate) fn display_of(&self, app_id: &AppId) -> DisplayId {
        self.running.lock().get_app(app_id).map(|info| info.display.clone()).unwrap_or_default()
    }
}

fn log_route(app_id: &AppId, current: LifeStatus, proposed: LifeStatus, route: &RoutePolicy) {
    match route.log {
        RouteLog::None => {}
        RouteLog::Check => {
            debug!(app_id = %app_id, %current, %proposed, action = ?route.action, "life route")
        }
        RouteLog::Warn => {
            warn!(app_id = %app_id, %current, %proposed, action = ?route.action, "life route")
        }
        RouteLog::Error => {
            error!(app_id = %app_id, %current, %proposed, action = ?route.action, "life route")
        }
    }
}
