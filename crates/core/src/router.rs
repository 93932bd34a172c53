// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle transition routing.
//!
//! Single source of truth for which (current, proposed) status pairs are
//! applied, ignored, or converted, and how loudly each decision is logged.
//! These are pure functions; all mutation happens in the lifecycle manager.

use crate::status::{LifeEvent, LifeStatus, RuntimeStatus};

/// What to do with a proposed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    /// Apply the proposed status.
    Set,
    /// Keep the current status.
    Ignore,
    /// Replace the proposed status via the conversion table, then apply.
    Convert,
}

/// Log severity attached to a route decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteLog {
    None,
    Check,
    Warn,
    Error,
}

/// Resolved route for one (current, proposed) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePolicy {
    /// Status to apply when `action` is `Set` (already converted if needed).
    pub next: LifeStatus,
    pub action: RouteAction,
    pub log: RouteLog,
}

const INVALID_ROUTE: RoutePolicy =
    RoutePolicy { next: LifeStatus::Invalid, action: RouteAction::Ignore, log: RouteLog::Error };

fn policy(next: LifeStatus, action: RouteAction, log: RouteLog) -> RoutePolicy {
    RoutePolicy { next, action, log }
}

/// Conversion table consulted when the main table answers `Convert`.
///
/// `Running` proposed on a stopped or preloading instance means the runtime
/// reported the process alive without a window, which observers see as
/// `Background`. `Launching` proposed on a background instance is a relaunch.
pub fn convert_route(current: LifeStatus, proposed: LifeStatus) -> RoutePolicy {
    use LifeStatus::*;
    use RouteAction::Set;
    use RouteLog::None as Quiet;
    match (current, proposed) {
        (Stop, Running) => policy(Background, Set, Quiet),
        (Preloading, Running) => policy(Background, Set, Quiet),
        (Background, Launching) => policy(Relaunching, Set, Quiet),
        _ => INVALID_ROUTE,
    }
}

/// Route a proposed observable life status against the current one.
///
/// A `Convert` cell resolves through [`convert_route`] so callers always get
/// back the final status to apply.
pub fn life_route(current: LifeStatus, proposed: LifeStatus) -> RoutePolicy {
    use LifeStatus::*;
    use RouteAction::*;
    use RouteLog::{Check, Error, None as Quiet, Warn};

    let cell = match current {
        Stop => match proposed {
            Stop => policy(Stop, Ignore, Error),
            // fresh launch for preload
            Preloading => policy(Preloading, Set, Quiet),
            // fresh launch
            Launching => policy(Launching, Set, Quiet),
            Relaunching => policy(Relaunching, Ignore, Error),
            // foreground/background reported while respawning after a crash
            Foreground => policy(Foreground, Ignore, Warn),
            Background => policy(Background, Ignore, Warn),
            Closing => policy(Closing, Ignore, Error),
            Pausing => policy(Pausing, Ignore, Error),
            Running => policy(Running, Convert, Warn),
            Invalid => INVALID_ROUTE,
        },
        Preloading => match proposed {
            // app crash
            Stop => policy(Stop, Set, Warn),
            // consecutive preload launch
            Preloading => policy(Preloading, Ignore, Error),
            // real launch while preloading
            Launching => policy(Launching, Set, Check),
            Relaunching => policy(Relaunching, Ignore, Error),
            Foreground => policy(Foreground, Set, Warn),
            Background => policy(Background, Ignore, Quiet),
            // close while preloading
            Closing => policy(Closing, Set, Check),
            Pausing => policy(Pausing, Ignore, Error),
            Running => policy(Running, Convert, Warn),
            Invalid => INVALID_ROUTE,
        },
        Launching => match proposed {
            Stop => policy(Stop, Set, Warn),
            Preloading => policy(Preloading, Ignore, Error),
            // consecutive launch
            Launching => policy(Launching, Ignore, Check),
            Relaunching => policy(Relaunching, Ignore, Error),
            // normal flow
            Foreground => policy(Foreground, Set, Quiet),
            Background => policy(Background, Ignore, Warn),
            Closing => policy(Closing, Set, Check),
            Pausing => policy(Pausing, Ignore, Check),
            Running => policy(Running, Ignore, Quiet),
            Invalid => INVALID_ROUTE,
        },
        Relaunching => match proposed {
            Stop => policy(Stop, Set, Warn),
            Preloading => policy(Preloading, Ignore, Error),
            Launching => policy(Launching, Ignore, Error),
            Relaunching => policy(Relaunching, Ignore, Check),
            Foreground => policy(Foreground, Set, Quiet),
            Background => policy(Background, Ignore, Warn),
            Closing => policy(Closing, Set, Check),
            Pausing => policy(Pausing, Ignore, Check),
            Running => policy(Running, Ignore, Quiet),
            Invalid => INVALID_ROUTE,
        },
        Foreground => match proposed {
            Stop => policy(Stop, Set, Warn),
            Preloading => policy(Preloading, Ignore, Error),
            Launching => policy(Launching, Ignore, Error),
            Relaunching => policy(Relaunching, Ignore, Warn),
            Foreground => policy(Foreground, Ignore, Warn),
            // app switched away or paused
            Background => policy(Background, Set, Quiet),
            Closing => policy(Closing, Set, Quiet),
            Pausing => policy(Pausing, Set, Quiet),
            Running => policy(Running, Ignore, Quiet),
            Invalid => INVALID_ROUTE,
        },
        Background => match proposed {
            Stop => policy(Stop, Set, Warn),
            Preloading => policy(Preloading, Ignore, Error),
            // launch of a live background app is a relaunch
            Launching => policy(Launching, Convert, Error),
            Relaunching => policy(Relaunching, Set, Quiet),
            Foreground => policy(Foreground, Set, Warn),
            Background => policy(Background, Ignore, Warn),
            Closing => policy(Closing, Set, Quiet),
            Pausing => policy(Pausing, Ignore, Quiet),
            Running => policy(Running, Ignore, Quiet),
            Invalid => INVALID_ROUTE,
        },
        Closing => match proposed {
            // normal flow
            Stop => policy(Stop, Set, Quiet),
            Preloading => policy(Preloading, Ignore, Error),
            Launching => policy(Launching, Ignore, Error),
            Relaunching => policy(Relaunching, Ignore, Error),
            Foreground => policy(Foreground, Ignore, Check),
            Background => policy(Background, Ignore, Warn),
            Closing => policy(Closing, Ignore, Quiet),
            Pausing => policy(Pausing, Ignore, Error),
            Running => policy(Running, Ignore, Error),
            Invalid => INVALID_ROUTE,
        },
        Pausing => match proposed {
            Stop => policy(Stop, Set, Warn),
            Preloading => policy(Preloading, Ignore, Error),
            Launching => policy(Launching, Ignore, Error),
            Relaunching => policy(Relaunching, Set, Check),
            Foreground => policy(Foreground, Ignore, Warn),
            Background => policy(Background, Set, Quiet),
            Closing => policy(Closing, Set, Check),
            Pausing => policy(Pausing, Ignore, Warn),
            Running => policy(Running, Ignore, Error),
            Invalid => INVALID_ROUTE,
        },
        Invalid | Running => INVALID_ROUTE,
    };

    if cell.action == Convert {
        convert_route(current, proposed)
    } else {
        cell
    }
}

/// Route a proposed runtime status against the current one.
///
/// Simpler than the life table: only `Set` or `Ignore`. `Pausing` is never
/// stored at the runtime level; it exists only as an observable life status.
pub fn runtime_route(current: RuntimeStatus, proposed: RuntimeStatus) -> RouteAction {
    use RouteAction::*;
    use RuntimeStatus::*;
    match (current, proposed) {
        (Stop, Launching) | (Stop, Preloading) | (Stop, Running) => Set,
        (Launching, Stop) | (Launching, Running) => Set,
        (Preloading, Stop) | (Preloading, Running) => Set,
        (Running, Stop) | (Running, Registered) | (Running, Closing) => Set,
        (Registered, Stop) | (Registered, Closing) => Set,
        (Closing, Stop) => Set,
        _ => Ignore,
    }
}

/// Observable life status a runtime-level status maps to.
pub fn life_status_of(runtime: RuntimeStatus) -> LifeStatus {
    match runtime {
        RuntimeStatus::Stop => LifeStatus::Stop,
        RuntimeStatus::Launching => LifeStatus::Launching,
        RuntimeStatus::Preloading => LifeStatus::Preloading,
        RuntimeStatus::Running | RuntimeStatus::Registered => LifeStatus::Running,
        RuntimeStatus::Closing => LifeStatus::Closing,
        RuntimeStatus::Pausing => LifeStatus::Pausing,
    }
}

/// Subscription event kind for an observable life status.
pub fn life_event_of(status: LifeStatus) -> LifeEvent {
    match status {
        LifeStatus::Invalid | LifeStatus::Running => LifeEvent::Invalid,
        LifeStatus::Stop => LifeEvent::Stop,
        LifeStatus::Preloading => LifeEvent::Preload,
        LifeStatus::Launching | LifeStatus::Relaunching => LifeEvent::Launch,
        LifeStatus::Foreground => LifeEvent::Foreground,
        LifeStatus::Background => LifeEvent::Background,
        LifeStatus::Closing => LifeEvent::Close,
        LifeStatus::Pausing => LifeEvent::Pause,
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
