// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn due_timers_fire_once() {
    let mut scheduler = Scheduler::new();
    let start = Instant::now();

    scheduler.set_timer("kill:com.example.app", Duration::from_secs(1), start);
    scheduler.set_timer("reg:com.example.app", Duration::from_secs(3), start);

    assert!(scheduler.take_due(start).is_empty());

    let due = scheduler.take_due(start + Duration::from_secs(2));
    assert_eq!(due, vec!["kill:com.example.app".to_string()]);
    assert!(scheduler.take_due(start + Duration::from_secs(2)).is_empty());

    let due = scheduler.take_due(start + Duration::from_secs(4));
    assert_eq!(due, vec!["reg:com.example.app".to_string()]);
}

#[test]
fn setting_an_existing_timer_rearms_it() {
    let mut scheduler = Scheduler::new();
    let start = Instant::now();

    scheduler.set_timer("kill:app", Duration::from_secs(1), start);
    scheduler.set_timer("kill:app", Duration::from_secs(10), start);

    assert!(scheduler.take_due(start + Duration::from_secs(2)).is_empty());
    assert!(scheduler.has_timer("kill:app"));
}

#[test]
fn prefix_cancel_removes_matching_timers() {
    let mut scheduler = Scheduler::new();
    let start = Instant::now();

    scheduler.set_timer("kill:com.example.one", Duration::from_secs(1), start);
    scheduler.set_timer("kill:com.example.two", Duration::from_secs(1), start);
    scheduler.set_timer("reg:com.example.one", Duration::from_secs(1), start);

    scheduler.cancel_timers_with_prefix("kill:");

    assert!(!scheduler.has_timer("kill:com.example.one"));
    assert!(!scheduler.has_timer("kill:com.example.two"));
    assert!(scheduler.has_timer("reg:com.example.one"));
}

#[test]
fn next_deadline_is_the_minimum() {
    let mut scheduler = Scheduler::new();
    let start = Instant::now();
    assert!(scheduler.next_deadline().is_none());

    scheduler.set_timer("late", Duration::from_secs(30), start);
    scheduler.set_timer("soon", Duration::from_secs(1), start);

    assert_eq!(scheduler.next_deadline(), Some(start + Duration::from_secs(1)));
}
