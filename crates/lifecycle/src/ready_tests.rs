// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fires_once_when_all_items_pass() {
    let mut monitor = PrerequisiteMonitor::new();
    monitor.add_item("settings");
    monitor.add_item("boot");
    assert!(monitor.run().is_none());

    assert_eq!(monitor.set_status("settings", true), None);
    assert_eq!(monitor.set_status("boot", true), Some(PrerequisiteResult::Passed));
    assert!(monitor.has_fired());

    // A late report after firing is ignored.
    assert_eq!(monitor.set_status("boot", false), None);
}

#[test]
fn any_failure_makes_the_aggregate_fail() {
    let mut monitor = PrerequisiteMonitor::new();
    monitor.add_item("settings");
    monitor.add_item("boot");

    monitor.set_status("settings", false);
    assert_eq!(monitor.set_status("boot", true), Some(PrerequisiteResult::Failed));
}

#[test]
fn empty_monitor_fires_immediately_on_run() {
    let mut monitor = PrerequisiteMonitor::new();
    assert_eq!(monitor.run(), Some(PrerequisiteResult::Passed));
    assert!(monitor.has_fired());
    assert!(monitor.run().is_none());
}

#[test]
fn unknown_item_is_ignored() {
    let mut monitor = PrerequisiteMonitor::new();
    monitor.add_item("settings");
    assert_eq!(monitor.set_status("nope", true), None);
    assert!(!monitor.has_fired());
}
