// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sam_core::{AppId, AppVersion, BusToken, DisplayId, Redirection, TypeByDir, WindowGroup};
use std::path::{Path, PathBuf};

fn roster_with(packages: Vec<AppPackage>, dir: &Path) -> Roster {
    let mut roster = Roster::new(dir.join("deleted-apps.json"), vec!["en".to_string()]);
    roster.apply_scan(packages, "boot");
    roster
}

fn package(id: &str, app_type: AppType) -> AppPackage {
    AppPackage {
        app_id: AppId::new(id),
        folder_path: PathBuf::from(format!("/apps/{id}")),
        app_type,
        type_by_dir: TypeByDir::Store,
        main: "index.html".to_string(),
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

fn item(app_id: &str) -> LaunchAppItem {
    LaunchAppItem::new(AppId::new(app_id), DisplayId::default(), Value::Null, BusToken::NONE)
}

fn run_front(item: &mut LaunchAppItem) -> StageResult {
    let stage = item.stage_queue.pop_front().unwrap_or_else(|| panic!("no stage"));
    (stage.handler)(item, StageInput::Direct)
}

#[test]
fn unlocked_app_gets_a_passing_lock_stage() {
    let dir = tempfile::tempdir().unwrap();
    let roster = roster_with(vec![package("com.example.web", AppType::Web)], dir.path());
    let running = RunningInfoTable::new();

    let mut item = item("com.example.web");
    seed_stages(&mut item, &roster, &running).unwrap();

    assert_eq!(item.stage_queue.len(), 1);
    assert_eq!(run_front(&mut item), StageResult::GoNextStage);
    assert!(!item.has_error());
}

#[test]
fn locked_package_fails_the_lock_stage() {
    let dir = tempfile::tempdir().unwrap();
    let mut pkg = package("com.example.web", AppType::Web);
    pkg.locked = true;
    let roster = roster_with(vec![pkg], dir.path());
    let running = RunningInfoTable::new();

    let mut item = item("com.example.web");
    seed_stages(&mut item, &roster, &running).unwrap();

    assert_eq!(run_front(&mut item), StageResult::Error);
    assert_eq!(item.error.as_ref().map(|e| e.code), Some(sam_core::ERR_APP_LOCKED));
}

#[test]
fn execution_locked_instance_also_fails() {
    let dir = tempfile::tempdir().unwrap();
    let roster = roster_with(vec![package("com.example.web", AppType::Web)], dir.path());
    let mut running = RunningInfoTable::new();
    running
        .get_or_add(&AppId::new("com.example.web"), &DisplayId::default())
        .execution_lock = true;

    let mut item = item("com.example.web");
    seed_stages(&mut item, &roster, &running).unwrap();

    assert_eq!(run_front(&mut item), StageResult::Error);
}

#[test]
fn stub_package_gets_a_redirect_stage() {
    let dir = tempfile::tempdir().unwrap();
    let mut stub = package("com.example.stub", AppType::Stub);
    stub.redirection =
        Some(Redirection { id: AppId::new("com.example.real"), params: Value::Null });
    let roster = roster_with(vec![stub], dir.path());
    let running = RunningInfoTable::new();

    let mut item = item("com.example.stub");
    seed_stages(&mut item, &roster, &running).unwrap();

    assert_eq!(item.stage_queue.len(), 2);
    assert_eq!(run_front(&mut item), StageResult::GoNextStage);
    assert_eq!(run_front(&mut item), StageResult::Redirected);
    assert_eq!(item.app_id(), &AppId::new("com.example.real"));
}

#[test]
fn seeding_for_an_unknown_app_fails() {
    let dir = tempfile::tempdir().unwrap();
    let roster = roster_with(vec![], dir.path());
    let running = RunningInfoTable::new();

    let mut item = item("com.example.ghost");
    assert!(seed_stages(&mut item, &roster, &running).is_err());
}
