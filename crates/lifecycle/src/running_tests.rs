// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn id(s: &str) -> AppId {
    AppId::new(s)
}

#[test]
fn one_entry_per_app_and_display() {
    let mut table = RunningInfoTable::new();
    let app = id("com.example.web");

    table.get_or_add(&app, &DisplayId::default());
    table.get_or_add(&app, &DisplayId::default());
    table.get_or_add(&app, &DisplayId::new("display1"));

    assert_eq!(table.len(), 2);
}

#[test]
fn get_by_pid_finds_the_instance() {
    let mut table = RunningInfoTable::new();
    let app = id("com.example.qml");
    let info = table.get_or_add(&app, &DisplayId::default());
    info.pid = "4242".to_string();

    assert_eq!(table.get_by_pid("4242").map(|i| i.app_id.clone()), Some(app));
    assert!(table.get_by_pid("1").is_none());
}

#[test]
fn is_running_tracks_runtime_status() {
    let mut table = RunningInfoTable::new();
    let app = id("com.example.native");

    table.get_or_add(&app, &DisplayId::default());
    assert!(!table.is_running(&app));

    table.get_or_add(&app, &DisplayId::default()).runtime_status = RuntimeStatus::Running;
    assert!(table.is_running(&app));
}

#[test]
fn remove_clears_foreground_facts() {
    let mut table = RunningInfoTable::new();
    let app = id("com.example.web");
    table.get_or_add(&app, &DisplayId::default());
    table.set_foreground(&app);
    assert_eq!(table.foreground().current(), Some(&app));

    table.remove(&app, &DisplayId::default());

    assert_eq!(table.foreground().current(), None);
    assert!(table.foreground().apps().is_empty());
}

#[test]
fn foreground_switch_keeps_app_list_unique() {
    let mut table = RunningInfoTable::new();
    let first = id("com.example.one");
    let second = id("com.example.two");

    table.set_foreground(&first);
    table.set_foreground(&second);
    table.set_foreground(&first);

    assert_eq!(table.foreground().current(), Some(&first));
    assert_eq!(table.foreground().apps().len(), 2);
}

#[test]
fn list_is_sorted_by_app_id() {
    let mut table = RunningInfoTable::new();
    table.get_or_add(&id("com.example.zebra"), &DisplayId::default());
    table.get_or_add(&id("com.example.alpha"), &DisplayId::default());

    let ids: Vec<&str> = table.list().iter().map(|i| i.app_id.as_str()).collect();
    assert_eq!(ids, vec!["com.example.alpha", "com.example.zebra"]);
}
