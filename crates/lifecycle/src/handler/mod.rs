// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-runtime lifecycle handlers.
//!
//! One handler per runtime family. Each implements launch/close/pause by
//! talking to its runtime service or by forking a child, and reports results
//! as engine events: runtime-status changes, running-list changes, and
//! launching-done completions.

mod native;
mod native_client;
mod qml;
mod stub;
mod web;

pub(crate) use native::{NativeHandlerState, KILL_TIMER_PREFIX, REG_TIMER_PREFIX};
pub(crate) use native_client::NativeClientInfo;
pub(crate) use qml::QmlHandlerState;
pub(crate) use web::{WebHandlerState, LOADING_GUARD_TIMER};
