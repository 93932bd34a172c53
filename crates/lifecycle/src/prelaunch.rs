// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The prelaunch pipeline engine.
//!
//! Walks one launch item's ordered stage queue: leading direct checks run
//! synchronously, call stages suspend the item until their bus reply (or, for
//! bridge stages, until an external input is bridged back in). A stage that
//! redirects re-seeds the queue for the new app id and restarts.

use crate::item::{LaunchAppItem, LaunchStage};
use crate::stage::{StageInput, StageKind, StageResult};
use sam_core::{BusToken, ErrorInfo, LaunchUid};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{error, info, warn};

/// Seeds (or re-seeds after a redirect) an item's stage queue.
pub type StageSeeder<'a> = &'a dyn Fn(&mut LaunchAppItem) -> Result<(), ErrorInfo>;

/// What the caller must do next for an item.
#[derive(Debug)]
pub enum PrelaunchAction {
    /// Issue this bus call, then report the token with [`Prelauncher::note_call`].
    Call { kind: StageKind, uri: String, payload: Value },
    /// The item is parked (waiting on a reply or a bridged input).
    Wait,
    /// Pipeline complete; the item's error field tells success from failure.
    Done,
}

/// Pipeline bookkeeping for all in-flight launch items.
///
/// The manager owns the items; this struct owns only the processing queue
/// and the outstanding-call index.
#[derive(Default)]
pub struct Prelauncher {
    queue: Vec<LaunchUid>,
    pending: HashMap<BusToken, LaunchUid>,
}

impl Prelauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, uid: &LaunchUid) -> bool {
        self.queue.contains(uid)
    }

    pub fn queued(&self) -> &[LaunchUid] {
        &self.queue
    }

    /// Admit an item and run its pipeline as far as it goes synchronously.
    /// Duplicate uids are rejected with an error on the item.
    pub fn add_item(&mut self, item: &mut LaunchAppItem, seed: StageSeeder<'_>) -> PrelaunchAction {
        if self.contains(item.uid()) {
            error!(app_id = %item.app_id(), uid = %item.uid(), "already in prelaunching queue");
            item.set_error(ErrorInfo::general("already in prelaunching queue"));
            return PrelaunchAction::Done;
        }

        self.queue.push(item.uid().clone());
        item.stage = LaunchStage::Prelaunch;

        if let Err(e) = seed(item) {
            error!(app_id = %item.app_id(), error = %e, "stage seeding failed");
            item.set_error(e);
            return self.finish(item);
        }

        self.run(item, seed)
    }

    /// Record the token of the call just issued for an item.
    pub fn note_call(&mut self, uid: LaunchUid, token: BusToken) {
        self.pending.insert(token, uid);
    }

    /// Resolve a bus reply token to the waiting item, removing it from the
    /// outstanding-call index.
    pub fn take_pending(&mut self, token: BusToken) -> Option<LaunchUid> {
        self.pending.remove(&token)
    }

    /// Continue an item after its call stage replied.
    pub fn on_reply(
        &mut self,
        item: &mut LaunchAppItem,
        payload: &Value,
        seed: StageSeeder<'_>,
    ) -> PrelaunchAction {
        item.return_token = BusToken::NONE;

        match item.stage_queue.front() {
            None => self.finish(item),
            Some(front) if front.kind.is_bridged() => {
                info!(app_id = %item.app_id(), "received return for just bridge request");
                PrelaunchAction::Wait
            }
            Some(_) => self.handle_front(item, payload, seed),
        }
    }

    /// Feed an externally-bridged reply into the item's front bridge stage.
    pub fn input_bridged_return(
        &mut self,
        item: &mut LaunchAppItem,
        payload: &Value,
        seed: StageSeeder<'_>,
    ) -> PrelaunchAction {
        item.return_token = BusToken::NONE;

        match item.stage_queue.front() {
            None => self.finish(item),
            Some(front) if front.kind.is_bridged() => {
                info!(app_id = %item.app_id(), "trigger bridged launching");
                self.handle_front(item, payload, seed)
            }
            Some(front) => {
                warn!(app_id = %item.app_id(), kind = ?front.kind,
                      "bridged input but front stage is not a bridge call");
                PrelaunchAction::Wait
            }
        }
    }

    /// Fail every queued item. Returns the uids; the caller writes the
    /// cancel error and emits completion for each.
    pub fn cancel_all(&mut self) -> Vec<LaunchUid> {
        self.pending.clear();
        std::mem::take(&mut self.queue)
    }

    /// Drop one item's pipeline bookkeeping (its call could not be issued).
    pub fn abort(&mut self, uid: &LaunchUid) {
        self.queue.retain(|queued| queued != uid);
        self.pending.retain(|_, pending| pending != uid);
    }

    /// Run leading direct checks, stopping at the first call stage.
    fn run(&mut self, item: &mut LaunchAppItem, seed: StageSeeder<'_>) -> PrelaunchAction {
        loop {
            let Some(stage) = item.stage_queue.pop_front() else {
                return self.finish(item);
            };

            if stage.kind == StageKind::DirectCheck {
                item.sub_stage = stage.tag;
                match (stage.handler)(item, StageInput::Direct) {
                    StageResult::Redirected => return self.redirect(item, seed),
                    StageResult::Error => {
                        error!(app_id = %item.app_id(), "direct-check stage failed");
                        return self.finish(item);
                    }
                    StageResult::GoNextStage => prune_dependents(item),
                    StageResult::GoDependentStage => {}
                }
                continue;
            }

            // Call stage: build the payload and hand the call back to the
            // manager. The stage stays at the front until its input arrives.
            item.sub_stage = stage.tag;
            let payload = match &stage.payload {
                Some(builder) => match builder(item) {
                    Ok(payload) => payload,
                    Err(_) => {
                        error!(app_id = %item.app_id(), "failed to make stage payload");
                        item.set_error(ErrorInfo::general("internal error"));
                        return self.finish(item);
                    }
                },
                None => Value::Object(serde_json::Map::new()),
            };
            let action =
                PrelaunchAction::Call { kind: stage.kind, uri: stage.uri.clone(), payload };
            item.stage_queue.push_front(stage);
            return action;
        }
    }

    /// Run the front stage's handler on an arrived input, then continue.
    fn handle_front(
        &mut self,
        item: &mut LaunchAppItem,
        payload: &Value,
        seed: StageSeeder<'_>,
    ) -> PrelaunchAction {
        let Some(stage) = item.stage_queue.pop_front() else {
            return self.finish(item);
        };

        match (stage.handler)(item, StageInput::Reply(payload)) {
            StageResult::Error => {
                info!(app_id = %item.app_id(), "call stage failed");
                self.finish(item)
            }
            StageResult::Redirected => self.redirect(item, seed),
            StageResult::GoNextStage => {
                prune_dependents(item);
                if item.stage_queue.is_empty() {
                    self.finish(item)
                } else {
                    self.run(item, seed)
                }
            }
            StageResult::GoDependentStage => {
                if item.stage_queue.is_empty() {
                    self.finish(item)
                } else {
                    self.run(item, seed)
                }
            }
        }
    }

    fn redirect(&mut self, item: &mut LaunchAppItem, seed: StageSeeder<'_>) -> PrelaunchAction {
        info!(
            old = %item.requested_app_id(),
            new = %item.app_id(),
            "redirected to another app"
        );
        item.clear_stages();
        if let Err(e) = seed(item) {
            item.set_error(e);
            return self.finish(item);
        }
        self.run(item, seed)
    }

    fn finish(&mut self, item: &mut LaunchAppItem) -> PrelaunchAction {
        item.sub_stage = LaunchStage::PrelaunchDone;
        item.stage = LaunchStage::PrelaunchDone;
        self.queue.retain(|uid| uid != item.uid());
        self.pending.retain(|_, uid| uid != item.uid());
        PrelaunchAction::Done
    }
}

/// Drop leading dependent stages once their parent stage passed cleanly.
fn prune_dependents(item: &mut LaunchAppItem) {
    while item.stage_queue.front().is_some_and(|stage| stage.kind.is_dependent()) {
        item.stage_queue.pop_front();
    }
}

#[cfg(test)]
#[path = "prelaunch_tests.rs"]
mod tests;
