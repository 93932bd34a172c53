// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn add_is_idempotent_per_key() {
    let registry = SubscriptionRegistry::new();
    registry.add("running", BusToken(1));
    registry.add("running", BusToken(1));
    registry.add("running", BusToken(2));
    assert_eq!(registry.count("running"), 2);
}

#[test]
fn subscribers_keep_registration_order() {
    let registry = SubscriptionRegistry::new();
    registry.add("getAppLifeEvents", BusToken(3));
    registry.add("getAppLifeEvents", BusToken(1));
    registry.add("getAppLifeEvents", BusToken(2));
    assert_eq!(
        registry.subscribers("getAppLifeEvents"),
        vec![BusToken(3), BusToken(1), BusToken(2)]
    );
}

#[test]
fn remove_everywhere_prunes_all_keys() {
    let registry = SubscriptionRegistry::new();
    registry.add("running", BusToken(1));
    registry.add("listApps", BusToken(1));
    registry.add("listApps", BusToken(2));

    registry.remove_everywhere(BusToken(1));

    assert_eq!(registry.count("running"), 0);
    assert_eq!(registry.subscribers("listApps"), vec![BusToken(2)]);
}

#[test]
fn unknown_key_is_empty() {
    let registry = SubscriptionRegistry::new();
    assert_eq!(registry.count("nope"), 0);
    assert!(registry.subscribers("nope").is_empty());
}
