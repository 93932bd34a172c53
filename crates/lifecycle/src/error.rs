// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-internal error type.

use thiserror::Error;

/// Errors surfaced by the lifecycle engine.
///
/// Most failures are written onto the launch item and reported to the
/// caller; these variants cover the plumbing failures around that path.
/// None of them kill the event loop.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("effect execution failed: {0}")]
    Execute(#[from] crate::executor::ExecuteError),

    #[error("process error: {0}")]
    Process(#[from] crate::process::ProcessError),

    #[error("roster error: {0}")]
    Roster(#[from] sam_roster::RosterError),
}
