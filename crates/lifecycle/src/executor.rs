// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effect executor.

use crate::process::{ProcessAdapter, ProcessError};
use crate::scheduler::Scheduler;
use parking_lot::Mutex;
use sam_bus::{BusClient, BusError};
use sam_core::{BusToken, Clock, Effect, Event};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Errors that can occur during effect execution.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("bus error: {0}")]
    Bus(#[from] BusError),

    #[error("process error: {0}")]
    Process(#[from] ProcessError),
}

/// Executes effects against the bus, the process adapter, and the timer
/// scheduler.
pub struct Executor<B, P, C: Clock> {
    bus: B,
    processes: P,
    clock: C,
    scheduler: Arc<Mutex<Scheduler>>,
    event_tx: mpsc::Sender<Event>,
}

impl<B, P, C> Executor<B, P, C>
where
    B: BusClient,
    P: ProcessAdapter,
    C: Clock,
{
    pub fn new(
        bus: B,
        processes: P,
        clock: C,
        scheduler: Arc<Mutex<Scheduler>>,
        event_tx: mpsc::Sender<Event>,
    ) -> Self {
        Self { bus, processes, clock, scheduler, event_tx }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn processes(&self) -> &P {
        &self.processes
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn scheduler(&self) -> Arc<Mutex<Scheduler>> {
        Arc::clone(&self.scheduler)
    }

    pub fn event_tx(&self) -> mpsc::Sender<Event> {
        self.event_tx.clone()
    }

    /// Execute a single effect with tracing.
    ///
    /// Returns an optional event to feed back into the engine loop.
    pub async fn execute(&self, effect: Effect) -> Result<Option<Event>, ExecuteError> {
        let info: String =
            effect.fields().iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join(" ");
        let op = effect.name();
        let verbose = effect.verbose();
        if verbose {
            info!("executing effect={op} {info}");
        }

        let result = self.execute_inner(effect).await;
        match &result {
            Ok(_) if !verbose => {}
            Ok(_) => info!("completed effect={op}"),
            Err(e) => error!(error = %e, "effect failed effect={op} {info}"),
        }
        result
    }

    async fn execute_inner(&self, effect: Effect) -> Result<Option<Event>, ExecuteError> {
        match effect {
            Effect::Emit { event } => Ok(Some(event)),

            Effect::Respond { token, payload } => {
                // A gone caller is not an engine failure.
                if let Err(e) = self.bus.respond(token, payload).await {
                    warn!(token = token.0, error = %e, "reply dropped, caller gone");
                }
                Ok(None)
            }

            Effect::SubscriptionReply { key, payload } => {
                self.bus.subscription_reply(&key, payload);
                Ok(None)
            }

            Effect::CancelCall { token } => {
                self.bus.cancel(token).await?;
                Ok(None)
            }

            Effect::KillProcessGroup { pid, signal } => {
                if let Err(e) = self.processes.kill_group(&pid, signal) {
                    warn!(pid, error = %e, "process group signal failed");
                }
                Ok(None)
            }

            Effect::SetTimer { id, duration } => {
                let now = self.clock.now();
                self.scheduler.lock().set_timer(id, duration, now);
                Ok(None)
            }

            Effect::CancelTimer { id } => {
                self.scheduler.lock().cancel_timer(&id);
                Ok(None)
            }
        }
    }

    /// Execute effects in order, collecting any produced events.
    pub async fn execute_all(&self, effects: Vec<Effect>) -> Result<Vec<Event>, ExecuteError> {
        let mut events = Vec::new();
        for effect in effects {
            if let Some(event) = self.execute(effect).await? {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Issue a single-reply bus call directly (the token must be recorded by
    /// the caller so the reply can be routed).
    pub async fn call_one_reply(&self, uri: &str, payload: Value) -> Result<BusToken, ExecuteError> {
        Ok(self.bus.call_one_reply(uri, payload).await?)
    }

    /// Issue a persistent call (peer subscription).
    pub async fn call_multi_reply(
        &self,
        uri: &str,
        payload: Value,
    ) -> Result<BusToken, ExecuteError> {
        Ok(self.bus.call_multi_reply(uri, payload).await?)
    }
}
