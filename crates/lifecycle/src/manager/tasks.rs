// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task intake and pipeline driving.
//!
//! Launch requests run Prelauncher → MemoryChecker → handler; close and
//! pause dispatch straight to the handler for the package's runtime family.
//! All tasks are gated on roster readiness and on a scan in progress.

use crate::error::LifecycleError;
use crate::item::{CloseAppItem, LaunchAppItem, LaunchStage};
use crate::manager::Manager;
use crate::process::ProcessAdapter;
use sam_bus::BusClient;
use sam_core::{
    AppId, BusToken, Clock, DisplayId, Effect, ErrorInfo, Event, HandlerKind, LaunchUid,
    LifeEvent,
};
use serde_json::{json, Value};
use tracing::{info, warn};

/// Parameters of one accepted launch request.
pub(crate) struct LaunchRequest {
    pub id: AppId,
    pub display: DisplayId,
    pub params: Value,
    pub preload: String,
    pub keep_alive: bool,
    pub no_splash: bool,
    pub spinner: bool,
    pub caller_id: String,
    pub caller_pid: String,
    pub reply: BusToken,
}

impl LaunchRequest {
    fn into_event(self) -> Event {
        Event::LaunchApp {
            id: self.id,
            display: self.display,
            params: self.params,
            preload: self.preload,
            keep_alive: self.keep_alive,
            no_splash: self.no_splash,
            spinner: self.spinner,
            caller_id: self.caller_id,
            caller_pid: self.caller_pid,
            reply: self.reply,
        }
    }
}

impl<B, P, C> Manager<B, P, C>
where
    B: BusClient,
    P: ProcessAdapter,
    C: Clock,
{
    pub(crate) async fn handle_launch(
        &self,
        request: LaunchRequest,
    ) -> Result<Vec<Event>, LifecycleError> {
        // Launches additionally wait for the roster's first scan.
        if !self.roster.lock().is_ready() {
            info!(app_id = %request.id, "roster not ready, holding launch");
            self.pending_ready.lock().push(request.into_event());
            return Ok(vec![]);
        }
        if self.is_scanning() {
            self.pending_scan.lock().push(request.into_event());
            return Ok(vec![]);
        }

        let package = {
            let roster = self.roster.lock();
            roster
                .get(request.id.as_str())
                .map(|package| (package.splash_on_launch, package.spinner_on_launch))
        };
        let Some((splash_on_launch, spinner_on_launch)) = package else {
            warn!(app_id = %request.id, "launch for unknown app");
            return self
                .respond_error(request.reply, ErrorInfo::app_not_found(request.id.as_str()))
                .await;
        };

        let mut item =
            LaunchAppItem::new(request.id.clone(), request.display, request.params, request.reply);
        item.caller_id = request.caller_id;
        item.caller_pid = request.caller_pid;
        item.preload = request.preload;
        item.keep_alive = request.keep_alive;
        item.show_splash = splash_on_launch && !request.no_splash;
        item.show_spinner = spinner_on_launch || request.spinner;
        item.launch_start_time = self.executor.clock().epoch_ms();
        let uid = item.uid().clone();
        let show_splash = item.show_splash && item.preload.is_empty();

        info!(app_id = %request.id, %uid, "launch accepted");
        self.launch_items.lock().insert(uid.clone(), item);

        if show_splash {
            let effect = self.life_event_effect(&request.id, LifeEvent::Splash);
            self.executor.execute(effect).await?;
        }

        match self.with_pipeline(&uid, |prelauncher, item, seed| prelauncher.add_item(item, seed))
        {
            Some(action) => self.drive_prelaunch(uid, action).await,
            None => Ok(vec![]),
        }
    }

    /// A bus reply belonging to a prelaunch stage arrived.
    pub(crate) async fn on_prelaunch_reply(
        &self,
        uid: LaunchUid,
        payload: &Value,
    ) -> Result<Vec<Event>, LifecycleError> {
        let action = self.with_pipeline(&uid, |prelauncher, item, seed| {
            prelauncher.on_reply(item, payload, seed)
        });
        match action {
            Some(action) => self.drive_prelaunch(uid, action).await,
            None => {
                info!(%uid, "reply for an item that is already gone");
                Ok(vec![])
            }
        }
    }

    /// An external input completes a bridge stage for an item.
    ///
    /// Bridge stages fire their call and park; whoever owns the external
    /// signal feeds the continuation payload in here.
    pub async fn input_bridged_return(
        &self,
        uid: LaunchUid,
        payload: &Value,
    ) -> Result<Vec<Event>, LifecycleError> {
        let action = self.with_pipeline(&uid, |prelauncher, item, seed| {
            prelauncher.input_bridged_return(item, payload, seed)
        });
        match action {
            Some(action) => self.drive_prelaunch(uid, action).await,
            None => Ok(vec![]),
        }
    }

    /// Prelaunch finished: failed items complete, the rest enter the memory
    /// checker.
    pub(crate) async fn on_prelaunch_done(
        &self,
        uid: LaunchUid,
    ) -> Result<Vec<Event>, LifecycleError> {
        let has_error = {
            let items = self.launch_items.lock();
            match items.get(&uid) {
                Some(item) => item.has_error(),
                None => return Ok(vec![]),
            }
        };
        if has_error {
            return Ok(vec![Event::LaunchingDone { uid }]);
        }

        let admitted = {
            let mut items = self.launch_items.lock();
            if let Some(item) = items.get_mut(&uid) {
                item.stage = LaunchStage::MemoryCheck;
            }
            let mut checker = self.memory_checker.lock();
            checker.add_item(uid);
            checker.run()
        };
        Ok(admitted
            .into_iter()
            .map(|done| {
                if let Some(item) = self.launch_items.lock().get_mut(&done) {
                    item.stage = LaunchStage::MemoryCheckDone;
                }
                Event::MemoryCheckDone { uid: done }
            })
            .collect())
    }

    /// Memory check passed: dispatch to the runtime handler.
    pub(crate) async fn on_memory_check_done(
        &self,
        uid: LaunchUid,
    ) -> Result<Vec<Event>, LifecycleError> {
        let state = {
            let items = self.launch_items.lock();
            match items.get(&uid) {
                Some(item) => Some((item.has_error(), item.app_id().clone())),
                None => None,
            }
        };
        let Some((has_error, app_id)) = state else {
            return Ok(vec![]);
        };
        if has_error {
            return Ok(vec![Event::LaunchingDone { uid }]);
        }

        if let Some(item) = self.launch_items.lock().get_mut(&uid) {
            item.stage = LaunchStage::Launch;
            item.sub_stage = LaunchStage::Launch;
        }

        let handler = {
            let roster = self.roster.lock();
            roster.get(app_id.as_str()).map(|package| package.handler_kind())
        };
        match handler {
            None => self.fail_launch(uid, ErrorInfo::app_not_found(app_id.as_str())).await,
            Some(HandlerKind::Web) => self.web_launch(uid).await,
            Some(HandlerKind::Qml) => self.qml_launch(uid).await,
            Some(HandlerKind::Native) => self.native_launch(uid).await,
            Some(HandlerKind::None) => {
                // A stub this far along means its redirection never fired.
                self.fail_launch(uid, ErrorInfo::general("no runtime handler")).await
            }
        }
    }

    /// The handler finished with the item: answer the caller and close out
    /// the launch.
    pub(crate) async fn on_launching_done(
        &self,
        uid: LaunchUid,
    ) -> Result<Vec<Event>, LifecycleError> {
        let Some(mut item) = self.launch_items.lock().remove(&uid) else {
            return Ok(vec![]);
        };
        item.stage = LaunchStage::Done;

        let mut effects = Vec::new();
        let mut events = Vec::new();

        match &item.error {
            Some(error) => {
                warn!(app_id = %item.app_id(), %uid, error = %error, "launch failed");
                if !item.reply.is_none() {
                    effects.push(Effect::Respond {
                        token: item.reply,
                        payload: error.to_payload(),
                    });
                }
            }
            None => {
                let elapsed =
                    self.executor.clock().epoch_ms().saturating_sub(item.launch_start_time);
                info!(app_id = %item.app_id(), %uid, elapsed_ms = elapsed, "launch done");

                let mut payload = json!({
                    "returnValue": true,
                    "appId": item.app_id(),
                });
                if !item.pid.is_empty() {
                    payload["processId"] = Value::String(item.pid.clone());
                }
                if !item.reply.is_none() {
                    effects.push(Effect::Respond { token: item.reply, payload });
                }

                {
                    let mut running = self.running.lock();
                    let entry = running.get_or_add(item.app_id(), &item.display);
                    entry.last_launch_time = item.launch_start_time;
                    entry.preload_mode = item.preload.clone();
                    if entry.pid.is_empty() && !item.pid.is_empty() {
                        entry.pid = item.pid.clone();
                    }
                }

                // Without a separate window manager, a completed non-preload
                // launch is what brings the app to the foreground.
                if item.preload.is_empty() {
                    events.extend(
                        self.set_life_status(
                            item.app_id(),
                            &item.display,
                            sam_core::LifeStatus::Foreground,
                        )
                        .await?,
                    );
                }
            }
        }

        self.executor.execute_all(effects).await?;
        Ok(events)
    }

    /// Record a failure on an item and complete it.
    pub(crate) async fn fail_launch(
        &self,
        uid: LaunchUid,
        error: ErrorInfo,
    ) -> Result<Vec<Event>, LifecycleError> {
        if let Some(item) = self.launch_items.lock().get_mut(&uid) {
            if item.error.is_none() {
                item.set_error(error);
            }
        }
        Ok(vec![Event::LaunchingDone { uid }])
    }

    pub(crate) async fn respond_error(
        &self,
        reply: BusToken,
        error: ErrorInfo,
    ) -> Result<Vec<Event>, LifecycleError> {
        if !reply.is_none() {
            self.executor
                .execute(Effect::Respond { token: reply, payload: error.to_payload() })
                .await?;
        }
        Ok(vec![])
    }

    pub(crate) async fn handle_close(
        &self,
        id: AppId,
        display: DisplayId,
        caller_id: String,
        reason: String,
        reply: BusToken,
    ) -> Result<Vec<Event>, LifecycleError> {
        if self.is_scanning() {
            self.pending_scan.lock().push(Event::CloseApp {
                id,
                display,
                caller_id,
                reason,
                reply,
            });
            return Ok(vec![]);
        }

        let handler = {
            let roster = self.roster.lock();
            roster.get(id.as_str()).map(|package| package.handler_kind())
        };
        let Some(handler) = handler else {
            return self.respond_error(reply, ErrorInfo::app_not_found(id.as_str())).await;
        };

        let mut close_item = CloseAppItem::new(id, display, caller_id, reason);
        close_item.pid = {
            let running = self.running.lock();
            running.get_app(&close_item.app_id).map(|info| info.pid.clone()).unwrap_or_default()
        };

        let result = match handler {
            HandlerKind::Web => self.web_close(&close_item).await,
            HandlerKind::Qml => self.qml_close(&close_item).await,
            HandlerKind::Native => self.native_close(&close_item).await,
            HandlerKind::None => self.stub_close(&close_item),
        };

        match result {
            Ok(events) => {
                if !reply.is_none() {
                    let payload = json!({ "returnValue": true, "appId": close_item.app_id });
                    self.executor.execute(Effect::Respond { token: reply, payload }).await?;
                }
                Ok(events)
            }
            Err(error) => self.respond_error(reply, error).await,
        }
    }

    pub(crate) async fn handle_pause(
        &self,
        id: AppId,
        params: Value,
        reply: BusToken,
    ) -> Result<Vec<Event>, LifecycleError> {
        if self.is_scanning() {
            self.pending_scan.lock().push(Event::PauseApp { id, params, reply });
            return Ok(vec![]);
        }

        let handler = {
            let roster = self.roster.lock();
            roster.get(id.as_str()).map(|package| package.handler_kind())
        };
        let Some(handler) = handler else {
            return self.respond_error(reply, ErrorInfo::app_not_found(id.as_str())).await;
        };

        let result = match handler {
            HandlerKind::Web => self.web_pause(&id, &params).await,
            HandlerKind::Qml => self.qml_pause(&id),
            HandlerKind::Native => self.native_pause(&id, &params).await,
            HandlerKind::None => self.stub_pause(&id),
        };

        match result {
            Ok(events) => {
                if !reply.is_none() {
                    let payload = json!({ "returnValue": true });
                    self.executor.execute(Effect::Respond { token: reply, payload }).await?;
                }
                Ok(events)
            }
            Err(error) => self.respond_error(reply, error).await,
        }
    }

    /// Close every live instance, e.g. on shutdown.
    pub(crate) async fn handle_close_all(
        &self,
        reason: String,
    ) -> Result<Vec<Event>, LifecycleError> {
        if self.is_scanning() {
            self.pending_scan.lock().push(Event::CloseAllApps { reason });
            return Ok(vec![]);
        }

        let targets: Vec<(AppId, DisplayId)> = {
            let running = self.running.lock();
            running
                .list()
                .into_iter()
                .filter(|info| info.is_running())
                .map(|info| (info.app_id.clone(), info.display.clone()))
                .collect()
        };

        let mut events = Vec::new();
        for (app_id, display) in targets {
            info!(app_id = %app_id, reason, "closing app (close all)");
            events.extend(
                self.handle_close(
                    app_id,
                    display,
                    String::new(),
                    reason.clone(),
                    BusToken::NONE,
                )
                .await?,
            );
        }
        Ok(events)
    }

    /// Shutdown or explicit cancel: fail every queued pipeline item.
    pub(crate) async fn cancel_pipeline(&self) -> Result<Vec<Event>, LifecycleError> {
        let mut events = Vec::new();

        let cancelled = self.prelauncher.lock().cancel_all();
        for uid in cancelled {
            if let Some(item) = self.launch_items.lock().get_mut(&uid) {
                info!(app_id = %item.app_id(), %uid, "cancelling queued launch");
                item.set_error(ErrorInfo::general("cancel all request"));
            }
            events.push(Event::PrelaunchDone { uid });
        }

        let flushed = self.memory_checker.lock().cancel_all();
        for uid in flushed {
            if let Some(item) = self.launch_items.lock().get_mut(&uid) {
                item.set_error(ErrorInfo::general("cancel all request"));
            }
            events.push(Event::LaunchingDone { uid });
        }

        Ok(events)
    }
}
