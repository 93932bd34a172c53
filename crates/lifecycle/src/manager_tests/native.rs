// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Native handler scenarios.

use super::*;
use sam_core::KillSignal;

const NATIVE_APP: &str = "com.example.native";

fn kill_timer() -> String {
    format!("native-kill:{NATIVE_APP}")
}

fn reg_timer() -> String {
    format!("native-reg:{NATIVE_APP}")
}

#[tokio::test]
async fn fresh_v2_launch_with_registration() {
    let ctx = setup(vec![native_v2_package(NATIVE_APP)]).await;
    let reply = BusToken(100);

    handle_event_chain(&ctx, launch_event(NATIVE_APP, reply)).await;

    // The child was forked with the launch params as its argument.
    let spawned = ctx.processes.spawned();
    assert_eq!(spawned.len(), 1);
    assert_eq!(spawned[0].app_id, NATIVE_APP);
    assert_eq!(spawned[0].exe, PathBuf::from("/apps/com.example.native/run"));

    // Caller got its reply with the pid.
    let responses = ctx.bus.responses_to(reply);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["returnValue"], true);
    assert_eq!(responses[0]["appId"], NATIVE_APP);
    assert_eq!(responses[0]["processId"], spawned[0].pid);

    // Observable flow: stop -> launching -> foreground.
    assert_eq!(pushed_statuses(&ctx, NATIVE_APP), vec!["launching", "foreground"]);

    // The registration window is armed for a v2 client.
    assert!(ctx.manager.executor.scheduler().lock().has_timer(&reg_timer()));

    // The child registers and receives the registered event.
    let channel = BusToken(777);
    handle_event_chain(
        &ctx,
        Event::RegisterNativeApp { id: AppId::new(NATIVE_APP), client: channel },
    )
    .await;
    let acks = ctx.bus.responses_to(channel);
    assert_eq!(acks.len(), 1);
    assert_eq!(acks[0]["event"], "registered");
    assert_eq!(acks[0]["returnValue"], true);

    let runtime = ctx
        .running
        .lock()
        .get_app(&AppId::new(NATIVE_APP))
        .map(|info| info.runtime_status);
    assert_eq!(runtime, Some(sam_core::RuntimeStatus::Registered));
    assert!(!ctx.manager.executor.scheduler().lock().has_timer(&reg_timer()));
}

#[tokio::test]
async fn register_from_unknown_client_is_rejected() {
    let ctx = setup(vec![native_v2_package(NATIVE_APP)]).await;
    let channel = BusToken(13);

    handle_event_chain(
        &ctx,
        Event::RegisterNativeApp { id: AppId::new(NATIVE_APP), client: channel },
    )
    .await;

    let acks = ctx.bus.responses_to(channel);
    assert_eq!(acks.len(), 1);
    assert_eq!(acks[0]["returnValue"], false);
    assert_eq!(acks[0]["errorText"], "cannot find caller id");
}

#[tokio::test]
async fn relaunch_of_registered_client_uses_the_channel() {
    let ctx = setup(vec![native_v2_package(NATIVE_APP)]).await;
    handle_event_chain(&ctx, launch_event(NATIVE_APP, BusToken(100))).await;
    let channel = BusToken(777);
    handle_event_chain(
        &ctx,
        Event::RegisterNativeApp { id: AppId::new(NATIVE_APP), client: channel },
    )
    .await;

    let reply = BusToken(101);
    handle_event_chain(&ctx, launch_event(NATIVE_APP, reply)).await;

    // No second fork; the registered channel got a relaunch event.
    assert_eq!(ctx.processes.spawned().len(), 1);
    let pushes = ctx.bus.responses_to(channel);
    assert_eq!(pushes.len(), 2);
    assert_eq!(pushes[1]["event"], "relaunch");
    let responses = ctx.bus.responses_to(reply);
    assert_eq!(responses[0]["returnValue"], true);
}

#[tokio::test]
async fn missed_registration_window_forces_signal_close() {
    let ctx = setup(vec![native_v2_package(NATIVE_APP)]).await;
    handle_event_chain(&ctx, launch_event(NATIVE_APP, BusToken(100))).await;
    let pid = ctx.processes.last_pid().unwrap_or_else(|| panic!("no pid"));

    // The 3 s window expires without a registerApp.
    handle_event_chain(&ctx, Event::TimerFired { id: reg_timer() }).await;

    // A close cannot use the channel: it goes SIGTERM + escalation timer.
    handle_event_chain(&ctx, close_event(NATIVE_APP, "", BusToken(101))).await;
    assert_eq!(ctx.processes.killed(), vec![(pid.clone(), KillSignal::Term)]);
    assert!(ctx.manager.executor.scheduler().lock().has_timer(&kill_timer()));

    // Escalation fires SIGKILL on the group.
    handle_event_chain(&ctx, Event::TimerFired { id: kill_timer() }).await;
    assert_eq!(
        ctx.processes.killed(),
        vec![(pid.clone(), KillSignal::Term), (pid.clone(), KillSignal::Kill)]
    );

    // The exit is reaped: stop observable, record gone.
    handle_event_chain(&ctx, Event::ProcessExited { pid, status: 9 }).await;
    assert_eq!(life_status(&ctx, NATIVE_APP), None);
    let statuses = pushed_statuses(&ctx, NATIVE_APP);
    assert_eq!(statuses.last().map(String::as_str), Some("stop"));
}

#[tokio::test]
async fn registered_v2_close_sends_close_event_then_arms_kill_timer() {
    let ctx = setup(vec![native_v2_package(NATIVE_APP)]).await;
    handle_event_chain(&ctx, launch_event(NATIVE_APP, BusToken(100))).await;
    let channel = BusToken(777);
    handle_event_chain(
        &ctx,
        Event::RegisterNativeApp { id: AppId::new(NATIVE_APP), client: channel },
    )
    .await;

    handle_event_chain(&ctx, close_event(NATIVE_APP, "", BusToken(101))).await;

    let pushes = ctx.bus.responses_to(channel);
    assert_eq!(pushes.last().map(|p| p["event"].clone()), Some(json!("close")));
    assert!(ctx.processes.killed().is_empty(), "graceful close does not signal yet");
    assert!(ctx.manager.executor.scheduler().lock().has_timer(&kill_timer()));

    // The child obeys and exits before the grace expires.
    let pid = ctx.processes.last_pid().unwrap_or_else(|| panic!("no pid"));
    handle_event_chain(&ctx, Event::ProcessExited { pid, status: 0 }).await;
    assert!(
        !ctx.manager.executor.scheduler().lock().has_timer(&kill_timer()),
        "exit cancels the kill timer"
    );
    assert_eq!(life_status(&ctx, NATIVE_APP), None);
}

#[tokio::test]
async fn memory_reclaim_close_kills_immediately() {
    let ctx = setup(vec![native_v2_package(NATIVE_APP)]).await;
    handle_event_chain(&ctx, launch_event(NATIVE_APP, BusToken(100))).await;
    let channel = BusToken(777);
    handle_event_chain(
        &ctx,
        Event::RegisterNativeApp { id: AppId::new(NATIVE_APP), client: channel },
    )
    .await;
    let pid = ctx.processes.last_pid().unwrap_or_else(|| panic!("no pid"));

    handle_event_chain(&ctx, close_event(NATIVE_APP, "memoryReclaim", BusToken(101))).await;

    assert_eq!(ctx.processes.killed(), vec![(pid, KillSignal::Kill)]);
}

#[tokio::test]
async fn launch_parked_while_closing_runs_after_exit() {
    let ctx = setup(vec![native_v2_package(NATIVE_APP)]).await;
    handle_event_chain(&ctx, launch_event(NATIVE_APP, BusToken(100))).await;
    let pid = ctx.processes.last_pid().unwrap_or_else(|| panic!("no pid"));

    // Close starts (unregistered v2 -> signal path), instance is Closing.
    handle_event_chain(&ctx, close_event(NATIVE_APP, "", BusToken(101))).await;
    assert_eq!(life_status(&ctx, NATIVE_APP), Some(LifeStatus::Closing));

    // A launch that arrives mid-close is parked.
    let reply = BusToken(102);
    handle_event_chain(&ctx, launch_event(NATIVE_APP, reply)).await;
    assert_eq!(ctx.processes.spawned().len(), 1, "no fork while closing");
    assert!(ctx.bus.responses_to(reply).is_empty());

    // The exit pumps the parked launch into a fresh fork.
    handle_event_chain(&ctx, Event::ProcessExited { pid, status: 0 }).await;
    assert_eq!(ctx.processes.spawned().len(), 2);
    let responses = ctx.bus.responses_to(reply);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["returnValue"], true);
}

#[tokio::test]
async fn close_of_stopped_native_app_fails() {
    let ctx = setup(vec![native_v2_package(NATIVE_APP)]).await;
    let reply = BusToken(110);

    handle_event_chain(&ctx, close_event(NATIVE_APP, "", reply)).await;

    let responses = ctx.bus.responses_to(reply);
    assert_eq!(responses[0]["returnValue"], false);
    assert_eq!(responses[0]["errorText"], "native app is not running");
}

#[tokio::test]
async fn removal_flagged_app_record_survives_until_stop() {
    let ctx = setup(vec![native_v2_package(NATIVE_APP)]).await;
    handle_event_chain(&ctx, launch_event(NATIVE_APP, BusToken(100))).await;
    let pid = ctx.processes.last_pid().unwrap_or_else(|| panic!("no pid"));

    // The app is uninstalled while running: the roster drops it, the
    // running record is flagged but stays.
    handle_event_chain(
        &ctx,
        Event::RosterAppScanned {
            id: AppId::new(NATIVE_APP),
            package: None,
            reason: "uninstalled".to_string(),
        },
    )
    .await;
    {
        let running = ctx.running.lock();
        let info = running.get_app(&AppId::new(NATIVE_APP));
        assert!(info.is_some_and(|info| info.removal_flag));
    }

    // Only the stop transition may delete it.
    handle_event_chain(&ctx, Event::ProcessExited { pid, status: 0 }).await;
    assert!(ctx.running.lock().get_app(&AppId::new(NATIVE_APP)).is_none());
}
