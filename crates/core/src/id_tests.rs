// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

#[test]
fn app_id_borrows_as_str_for_map_lookups() {
    let mut map: HashMap<AppId, u32> = HashMap::new();
    map.insert(AppId::new("com.example.web"), 7);
    assert_eq!(map.get("com.example.web"), Some(&7));
    assert_eq!(map.get("com.example.other"), None);
}

#[test]
fn display_defaults_when_empty() {
    assert_eq!(DisplayId::new("").as_str(), "default");
    assert_eq!(DisplayId::default().as_str(), "default");
    assert_eq!(DisplayId::new("display1").as_str(), "display1");
}

#[test]
fn launch_uids_are_unique() {
    let a = LaunchUid::new();
    let b = LaunchUid::new();
    assert_ne!(a, b);
    assert!(!a.as_str().is_empty());
}

#[test]
fn bus_token_none() {
    assert!(BusToken::NONE.is_none());
    assert!(!BusToken(42).is_none());
    assert_eq!(BusToken::default(), BusToken::NONE);
}

#[test]
fn app_id_serde_is_transparent() {
    let id = AppId::new("com.example.native");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"com.example.native\"");
    let back: AppId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}
