// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stub handler.
//!
//! Stub packages never launch a process: their redirection entry rewrites
//! the launch target inside the prelaunch pipeline. Close and pause are
//! acknowledged no-ops.

use crate::item::CloseAppItem;
use crate::manager::Manager;
use crate::process::ProcessAdapter;
use sam_bus::BusClient;
use sam_core::{AppId, Clock, ErrorInfo, Event};
use tracing::info;

impl<B, P, C> Manager<B, P, C>
where
    B: BusClient,
    P: ProcessAdapter,
    C: Clock,
{
    pub(crate) fn stub_close(&self, item: &CloseAppItem) -> Result<Vec<Event>, ErrorInfo> {
        info!(app_id = %item.app_id, "close on stub app is a no-op");
        Ok(vec![])
    }

    pub(crate) fn stub_pause(&self, app_id: &AppId) -> Result<Vec<Event>, ErrorInfo> {
        info!(app_id = %app_id, "pause on stub app is a no-op");
        Ok(vec![])
    }
}
