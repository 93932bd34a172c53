// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prelaunch pipeline stages.

use crate::item::{LaunchAppItem, LaunchStage};
use crate::running::RunningInfoTable;
use sam_core::{AppPackage, AppType, ErrorInfo};
use sam_roster::Roster;
use serde_json::Value;

/// How a stage is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    /// Synchronous check; no bus traffic.
    DirectCheck,
    /// Bus call whose reply resumes the pipeline.
    MainCall,
    /// Like `MainCall`, but only runs when the previous stage returned
    /// `GoDependentStage`; pruned otherwise.
    SubCall,
    /// Dependent variant of `BridgeCall`.
    SubBridgeCall,
    /// Bus call whose direct reply is ignored; the pipeline resumes when an
    /// external input is bridged back in.
    BridgeCall,
}

impl StageKind {
    pub fn is_dependent(&self) -> bool {
        matches!(self, StageKind::SubCall | StageKind::SubBridgeCall)
    }

    pub fn is_bridged(&self) -> bool {
        matches!(self, StageKind::BridgeCall | StageKind::SubBridgeCall)
    }
}

/// What a stage handler decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageResult {
    /// Passed; dependent follow-up stages are pruned.
    GoNextStage,
    /// Passed conditionally; dependent follow-up stages stay queued.
    GoDependentStage,
    /// The item's app id was rewritten; re-seed and restart the pipeline.
    Redirected,
    /// Failed; the item's error code/text explain why.
    Error,
}

/// Input handed to a stage handler.
pub enum StageInput<'a> {
    /// Direct-check execution, no payload.
    Direct,
    /// Reply payload from the stage's bus call (or bridged input).
    Reply(&'a Value),
}

pub type PayloadBuilder = Box<dyn Fn(&LaunchAppItem) -> Result<Value, ErrorInfo> + Send>;
pub type StageHandler = Box<dyn Fn(&mut LaunchAppItem, StageInput<'_>) -> StageResult + Send>;

/// One queued pipeline stage.
pub struct StageItem {
    pub kind: StageKind,
    /// Call target for the call kinds; empty for direct checks.
    pub uri: String,
    pub payload: Option<PayloadBuilder>,
    pub handler: StageHandler,
    pub tag: LaunchStage,
}

impl StageItem {
    pub fn direct_check(
        tag: LaunchStage,
        handler: impl Fn(&mut LaunchAppItem, StageInput<'_>) -> StageResult + Send + 'static,
    ) -> Self {
        Self {
            kind: StageKind::DirectCheck,
            uri: String::new(),
            payload: None,
            handler: Box::new(handler),
            tag,
        }
    }

    pub fn call(
        kind: StageKind,
        uri: impl Into<String>,
        payload: impl Fn(&LaunchAppItem) -> Result<Value, ErrorInfo> + Send + 'static,
        handler: impl Fn(&mut LaunchAppItem, StageInput<'_>) -> StageResult + Send + 'static,
        tag: LaunchStage,
    ) -> Self {
        Self {
            kind,
            uri: uri.into(),
            payload: Some(Box::new(payload)),
            handler: Box::new(handler),
            tag,
        }
    }
}

impl std::fmt::Debug for StageItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageItem")
            .field("kind", &self.kind)
            .field("uri", &self.uri)
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

/// Seed the stage queue for the item's current target app.
///
/// Base pipeline: an execution-lock check, plus the redirection check for
/// stub packages. Called again after every redirect.
pub fn seed_stages(
    item: &mut LaunchAppItem,
    roster: &Roster,
    running: &RunningInfoTable,
) -> Result<(), ErrorInfo> {
    let package = match roster.get(item.app_id().as_str()) {
        Some(package) => package,
        None => return Err(ErrorInfo::general("internal error")),
    };

    item.stage_queue.push_back(execution_lock_stage(package, running));

    if package.app_type == AppType::Stub {
        item.stage_queue.push_back(stub_redirect_stage(package));
    }

    Ok(())
}

fn execution_lock_stage(package: &AppPackage, running: &RunningInfoTable) -> StageItem {
    let locked = package.locked
        || running.get_app(&package.app_id).is_some_and(|info| info.execution_lock);
    StageItem::direct_check(LaunchStage::CheckExecute, move |item, _| {
        if locked {
            tracing::error!(app_id = %item.app_id(), "launch rejected, app is locked");
            item.set_error(ErrorInfo::app_locked());
            StageResult::Error
        } else {
            StageResult::GoNextStage
        }
    })
}

fn stub_redirect_stage(package: &AppPackage) -> StageItem {
    let redirection = package.redirection.clone();
    StageItem::direct_check(LaunchStage::Prelaunch, move |item, _| {
        if item.is_redirected() {
            // A stub pointing at another stub would bounce forever.
            item.set_error(ErrorInfo::general("redirection loop"));
            return StageResult::Error;
        }
        match &redirection {
            Some(target) => {
                item.set_redirection(target.id.clone(), target.params.clone());
                StageResult::Redirected
            }
            None => {
                item.set_error(ErrorInfo::general("no redirection target"));
                StageResult::Error
            }
        }
    })
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
