// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Manager tests.

mod native;
mod qml;
mod stub;
mod web;

use super::*;
use crate::process::FakeProcesses;
use crate::running::RunningInfoTable;
use sam_bus::FakeBus;
use sam_core::{
    AppPackage, AppType, AppVersion, DisplayId, FakeClock, LifeStatus, Redirection, TypeByDir,
    WindowGroup,
};
use sam_roster::Roster;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::path::PathBuf;

pub(crate) struct TestContext {
    pub manager: Manager<FakeBus, FakeProcesses, FakeClock>,
    pub bus: FakeBus,
    pub processes: FakeProcesses,
    pub clock: FakeClock,
    pub running: Arc<Mutex<RunningInfoTable>>,
    _dir: tempfile::TempDir,
}

pub(crate) fn package(id: &str, app_type: AppType) -> AppPackage {
    AppPackage {
        app_id: AppId::new(id),
        folder_path: PathBuf::from(format!("/apps/{id}")),
        app_type,
        type_by_dir: TypeByDir::Store,
        main: match app_type {
            AppType::Web => "index.html".to_string(),
            AppType::Qml => "main.qml".to_string(),
            _ => "run".to_string(),
        },
        title: id.to_string(),
        version: AppVersion::default(),
        trust_level: "default".to_string(),
        default_window_type: "card".to_string(),
        window_group: WindowGroup::default(),
        removable: true,
        visible: true,
        builtin_based: false,
        splash_on_launch: true,
        spinner_on_launch: false,
        required_memory: 0,
        native_interface_version: 1,
        redirection: None,
        locked: false,
        flagged_for_removal: false,
    }
}

pub(crate) fn native_v2_package(id: &str) -> AppPackage {
    let mut pkg = package(id, AppType::Native);
    pkg.native_interface_version = 2;
    pkg
}

pub(crate) fn stub_package(id: &str, target: &str) -> AppPackage {
    let mut pkg = package(id, AppType::Stub);
    pkg.redirection = Some(Redirection { id: AppId::new(target), params: Value::Null });
    pkg
}

/// Build a manager over fakes and apply an initial full scan so the roster
/// is ready.
pub(crate) async fn setup(packages: Vec<AppPackage>) -> TestContext {
    setup_with_scan(packages, true).await
}

pub(crate) async fn setup_with_scan(packages: Vec<AppPackage>, scan: bool) -> TestContext {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let bus = FakeBus::new();
    let processes = FakeProcesses::new();
    let clock = FakeClock::new();
    let roster = Arc::new(Mutex::new(Roster::new(
        dir.path().join("deleted-apps.json"),
        vec!["en".to_string()],
    )));
    let running = Arc::new(Mutex::new(RunningInfoTable::new()));
    let (event_tx, _event_rx) = mpsc::channel(64);

    let manager = Manager::new(
        ManagerDeps {
            bus: bus.clone(),
            processes: processes.clone(),
            roster: Arc::clone(&roster),
            running: Arc::clone(&running),
        },
        clock.clone(),
        ManagerConfig::default(),
        event_tx,
    );

    let ctx = TestContext { manager, bus, processes, clock, running, _dir: dir };
    if scan {
        handle_event_chain(
            &ctx,
            Event::RosterScanned { packages, reason: "boot".to_string() },
        )
        .await;
    }
    ctx
}

/// Process an event and all cascading result events, FIFO, until stable.
/// Simulates the daemon event loop.
pub(crate) async fn handle_event_chain(ctx: &TestContext, event: Event) {
    let mut queue = VecDeque::from([event]);
    while let Some(event) = queue.pop_front() {
        let result = match ctx.manager.handle_event(event).await {
            Ok(result) => result,
            Err(e) => panic!("handle_event failed: {e}"),
        };
        queue.extend(result);
    }
}

pub(crate) fn launch_event(id: &str, reply: BusToken) -> Event {
    Event::LaunchApp {
        id: AppId::new(id),
        display: DisplayId::default(),
        params: json!({}),
        preload: String::new(),
        keep_alive: false,
        no_splash: false,
        spinner: false,
        caller_id: "com.example.caller".to_string(),
        caller_pid: "100".to_string(),
        reply,
    }
}

pub(crate) fn close_event(id: &str, reason: &str, reply: BusToken) -> Event {
    Event::CloseApp {
        id: AppId::new(id),
        display: DisplayId::default(),
        caller_id: "com.example.caller".to_string(),
        reason: reason.to_string(),
        reply,
    }
}

pub(crate) fn life_status(ctx: &TestContext, id: &str) -> Option<LifeStatus> {
    ctx.running.lock().get_app(&AppId::new(id)).map(|info| info.life_status)
}

/// Statuses pushed on `getAppLifeStatus` for one app, in order.
pub(crate) fn pushed_statuses(ctx: &TestContext, id: &str) -> Vec<String> {
    ctx.bus
        .posts_on(keys::LIFE_STATUS)
        .into_iter()
        .filter(|payload| payload["appId"] == id)
        .filter_map(|payload| payload["status"].as_str().map(str::to_string))
        .collect()
}

/// Events pushed on `getAppLifeEvents` for one app, in order.
pub(crate) fn pushed_events(ctx: &TestContext, id: &str) -> Vec<String> {
    ctx.bus
        .posts_on(keys::LIFE_EVENTS)
        .into_iter()
        .filter(|payload| payload["appId"] == id)
        .filter_map(|payload| payload["event"].as_str().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn launch_of_unknown_app_is_rejected_synchronously() {
    let ctx = setup(vec![package("com.example.web", AppType::Web)]).await;
    let reply = BusToken(11);

    handle_event_chain(&ctx, launch_event("com.example.ghost", reply)).await;

    let responses = ctx.bus.responses_to(reply);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["returnValue"], false);
    assert_eq!(responses[0]["errorCode"], sam_core::ERR_APP_NOT_FOUND);
    assert!(ctx.bus.calls().is_empty());
}

#[tokio::test]
async fn launch_waits_for_first_roster_scan() {
    let ctx = setup_with_scan(vec![], false).await;
    let reply = BusToken(5);

    handle_event_chain(&ctx, launch_event("com.example.web", reply)).await;
    assert!(ctx.bus.calls().is_empty(), "launch must be held before the roster is ready");
    assert!(ctx.bus.responses_to(reply).is_empty());

    handle_event_chain(
        &ctx,
        Event::RosterScanned {
            packages: vec![package("com.example.web", AppType::Web)],
            reason: "boot".to_string(),
        },
    )
    .await;

    assert_eq!(ctx.bus.calls_to("launchApp").len(), 1, "held launch must flush after the scan");
}

#[tokio::test]
async fn launch_of_locked_app_fails_with_locked_error() {
    let mut pkg = package("com.example.web", AppType::Web);
    pkg.locked = true;
    let ctx = setup(vec![pkg]).await;
    let reply = BusToken(21);

    handle_event_chain(&ctx, launch_event("com.example.web", reply)).await;

    let responses = ctx.bus.responses_to(reply);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["errorCode"], sam_core::ERR_APP_LOCKED);
    assert_eq!(responses[0]["errorText"], "app is locked");
    assert!(ctx.bus.calls_to("launchApp").is_empty());
    assert!(pushed_statuses(&ctx, "com.example.web").is_empty());
}

#[tokio::test]
async fn cancel_pipeline_fails_queued_items() {
    let ctx = setup(vec![package("com.example.web", AppType::Web)]).await;
    let reply = BusToken(31);

    // Park an item on a fake prelaunch call stage by injecting it directly.
    let mut item = crate::item::LaunchAppItem::new(
        AppId::new("com.example.web"),
        DisplayId::default(),
        json!({}),
        reply,
    );
    let uid = item.uid().clone();
    item.stage_queue.push_back(crate::stage::StageItem::call(
        crate::stage::StageKind::MainCall,
        "luna://com.example.peer/check",
        |_| Ok(json!({})),
        |_, _| crate::stage::StageResult::GoNextStage,
        crate::item::LaunchStage::Prelaunch,
    ));
    ctx.manager.launch_items.lock().insert(uid.clone(), item);
    let action = ctx
        .manager
        .with_pipeline(&uid, |prelauncher, item, _seed| {
            prelauncher.add_item(item, &|_| Ok(()))
        })
        .unwrap_or_else(|| panic!("item missing"));
    assert!(matches!(action, crate::prelaunch::PrelaunchAction::Call { .. }));

    handle_event_chain(&ctx, Event::Shutdown).await;

    let responses = ctx.bus.responses_to(reply);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["errorCode"], sam_core::ERR_GENERAL);
    assert_eq!(responses[0]["errorText"], "cancel all request");
}

#[tokio::test]
async fn two_identical_foreground_proposals_fan_out_once() {
    let ctx = setup(vec![package("com.example.web", AppType::Web)]).await;
    let app = AppId::new("com.example.web");

    {
        let mut running = ctx.running.lock();
        let entry = running.get_or_add(&app, &DisplayId::default());
        entry.life_status = LifeStatus::Launching;
    }

    let events = ctx
        .manager
        .set_life_status(&app, &DisplayId::default(), LifeStatus::Foreground)
        .await
        .unwrap_or_else(|e| panic!("set_life_status: {e}"));
    assert!(events.is_empty());
    let events = ctx
        .manager
        .set_life_status(&app, &DisplayId::default(), LifeStatus::Foreground)
        .await
        .unwrap_or_else(|e| panic!("set_life_status: {e}"));
    assert!(events.is_empty());

    assert_eq!(pushed_statuses(&ctx, "com.example.web"), vec!["foreground"]);
    assert_eq!(ctx.bus.posts_on(keys::FOREGROUND).len(), 1);
}

#[tokio::test]
async fn roster_update_fans_out_single_change() {
    let ctx = setup(vec![package("com.example.web", AppType::Web)]).await;

    handle_event_chain(
        &ctx,
        Event::RosterAppScanned {
            id: AppId::new("com.example.new"),
            package: Some(Box::new(package("com.example.new", AppType::Web))),
            reason: "installed".to_string(),
        },
    )
    .await;

    let posts = ctx.bus.posts_on(keys::LIST_APPS);
    let last = posts.last().unwrap_or_else(|| panic!("no listApps post"));
    assert_eq!(last["change"], "added");
    assert_eq!(last["changeReason"], "installed");
    assert_eq!(last["appId"], "com.example.new");
}
