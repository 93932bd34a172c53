// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sam-core: domain types for the System Application Manager.
//!
//! Everything here is pure data and pure functions: status enums, the
//! lifecycle route tables, package records, events, and effects. No I/O.

pub mod clock;
pub mod effect;
pub mod error;
pub mod event;
pub mod id;
pub mod package;
pub mod router;
pub mod status;
pub mod version;

pub use clock::{Clock, FakeClock, SystemClock};
pub use effect::{Effect, KillSignal};
pub use error::{ErrorInfo, ERR_APP_LOCKED, ERR_APP_NOT_FOUND, ERR_DEPRECATED, ERR_GENERAL,
                ERR_INVALID_PAYLOAD, ERR_NO_PERMISSION};
pub use event::Event;
pub use id::{AppId, BusToken, DisplayId, LaunchUid};
pub use package::{project_props, AppPackage, AppType, ChangeKind, HandlerKind, Redirection,
                  RosterChange, TypeByDir, WindowGroup};
pub use router::{convert_route, life_event_of, life_route, life_status_of, runtime_route,
                 RouteAction, RouteLog, RoutePolicy};
pub use status::{LifeEvent, LifeStatus, RuntimeStatus};
pub use version::AppVersion;
