// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sam-roster: the authoritative map of installed applications.
//!
//! Consumes scan results, resolves version and directory-priority conflicts,
//! remembers which system apps the user deleted, and reports every change so
//! the manager can fan it out.

mod assets;
mod roster;

pub use assets::localize_asset;
pub use roster::{Roster, RosterError};
