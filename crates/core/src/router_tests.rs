// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;
use LifeStatus::*;

#[parameterized(
    fresh_launch = { Stop, Launching, Launching },
    fresh_preload = { Stop, Preloading, Preloading },
    launch_while_preloading = { Preloading, Launching, Launching },
    launch_done = { Launching, Foreground, Foreground },
    relaunch_done = { Relaunching, Foreground, Foreground },
    switch_away = { Foreground, Background, Background },
    close_request = { Foreground, Closing, Closing },
    pause_request = { Foreground, Pausing, Pausing },
    close_done = { Closing, Stop, Stop },
    crash_while_launching = { Launching, Stop, Stop },
    crash_in_background = { Background, Stop, Stop },
    pause_then_background = { Pausing, Background, Background },
    pause_then_relaunch = { Pausing, Relaunching, Relaunching },
)]
fn set_routes(current: LifeStatus, proposed: LifeStatus, applied: LifeStatus) {
    let route = life_route(current, proposed);
    assert_eq!(route.action, RouteAction::Set);
    assert_eq!(route.next, applied);
}

#[parameterized(
    duplicate_stop = { Stop, Stop },
    duplicate_launch = { Launching, Launching },
    duplicate_foreground = { Foreground, Foreground },
    background_while_launching = { Launching, Background },
    foreground_while_closing = { Closing, Foreground },
    pause_in_background = { Background, Pausing },
    running_while_launching = { Launching, Running },
)]
fn ignore_routes(current: LifeStatus, proposed: LifeStatus) {
    assert_eq!(life_route(current, proposed).action, RouteAction::Ignore);
}

#[parameterized(
    stopped_process_alive = { Stop, Running, Background },
    preloaded_process_alive = { Preloading, Running, Background },
    background_relaunch = { Background, Launching, Relaunching },
)]
fn converted_routes(current: LifeStatus, proposed: LifeStatus, converted: LifeStatus) {
    let route = life_route(current, proposed);
    assert_eq!(route.action, RouteAction::Set, "conversion resolves to Set");
    assert_eq!(route.next, converted);
}

#[test]
fn convert_cells_agree_with_conversion_table() {
    // The raw conversion table must cover exactly the Convert cells.
    assert_eq!(convert_route(Stop, Running).next, Background);
    assert_eq!(convert_route(Preloading, Running).next, Background);
    assert_eq!(convert_route(Background, Launching).next, Relaunching);
    // Anything else falls back to the invalid route.
    let invalid = convert_route(Foreground, Stop);
    assert_eq!(invalid.action, RouteAction::Ignore);
    assert_eq!(invalid.log, RouteLog::Error);
}

#[test]
fn running_never_escapes_as_observable() {
    // Invariant: whatever the current status, routing a proposed Running
    // either converts to something else or is ignored.
    for current in [Stop, Preloading, Launching, Relaunching, Foreground, Background, Closing, Pausing]
    {
        let route = life_route(current, Running);
        if route.action == RouteAction::Set {
            assert_ne!(route.next, Running, "from {current}");
        }
    }
}

#[test]
fn route_from_invalid_is_rejected() {
    let route = life_route(Invalid, Launching);
    assert_eq!(route.action, RouteAction::Ignore);
    assert_eq!(route.log, RouteLog::Error);
}

#[parameterized(
    fork = { RuntimeStatus::Stop, RuntimeStatus::Launching, RouteAction::Set },
    preload_fork = { RuntimeStatus::Stop, RuntimeStatus::Preloading, RouteAction::Set },
    launch_completes = { RuntimeStatus::Launching, RuntimeStatus::Running, RouteAction::Set },
    register = { RuntimeStatus::Running, RuntimeStatus::Registered, RouteAction::Set },
    close_registered = { RuntimeStatus::Registered, RuntimeStatus::Closing, RouteAction::Set },
    exit_after_close = { RuntimeStatus::Closing, RuntimeStatus::Stop, RouteAction::Set },
    early_register = { RuntimeStatus::Launching, RuntimeStatus::Registered, RouteAction::Ignore },
    duplicate = { RuntimeStatus::Running, RuntimeStatus::Running, RouteAction::Ignore },
    pausing_not_stored = { RuntimeStatus::Running, RuntimeStatus::Pausing, RouteAction::Ignore },
    stop_close = { RuntimeStatus::Stop, RuntimeStatus::Closing, RouteAction::Ignore },
)]
fn runtime_routes(current: RuntimeStatus, proposed: RuntimeStatus, expected: RouteAction) {
    assert_eq!(runtime_route(current, proposed), expected);
}

#[parameterized(
    stop = { RuntimeStatus::Stop, Stop },
    launching = { RuntimeStatus::Launching, Launching },
    preloading = { RuntimeStatus::Preloading, Preloading },
    running = { RuntimeStatus::Running, Running },
    registered = { RuntimeStatus::Registered, Running },
    closing = { RuntimeStatus::Closing, Closing },
    pausing = { RuntimeStatus::Pausing, Pausing },
)]
fn runtime_to_life(runtime: RuntimeStatus, life: LifeStatus) {
    assert_eq!(life_status_of(runtime), life);
}

#[parameterized(
    preload = { Preloading, LifeEvent::Preload },
    launch = { Launching, LifeEvent::Launch },
    relaunch = { Relaunching, LifeEvent::Launch },
    foreground = { Foreground, LifeEvent::Foreground },
    background = { Background, LifeEvent::Background },
    closing = { Closing, LifeEvent::Close },
    pausing = { Pausing, LifeEvent::Pause },
    stop = { Stop, LifeEvent::Stop },
    running = { Running, LifeEvent::Invalid },
)]
fn life_events(status: LifeStatus, event: LifeEvent) {
    assert_eq!(life_event_of(status), event);
}
