// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn run_admits_in_arrival_order() {
    let mut checker = MemoryChecker::new();
    let first = LaunchUid::new();
    let second = LaunchUid::new();

    checker.add_item(first.clone());
    checker.add_item(second.clone());

    assert_eq!(checker.run(), vec![first, second]);
    assert!(checker.run().is_empty());
}

#[test]
fn duplicates_are_dropped() {
    let mut checker = MemoryChecker::new();
    let uid = LaunchUid::new();

    checker.add_item(uid.clone());
    checker.add_item(uid.clone());

    assert_eq!(checker.run().len(), 1);
}

#[test]
fn cancel_all_flushes_everything() {
    let mut checker = MemoryChecker::new();
    checker.add_item(LaunchUid::new());
    checker.add_item(LaunchUid::new());

    assert_eq!(checker.cancel_all().len(), 2);
    assert!(checker.run().is_empty());
}
