// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn registration_resets_expiry() {
    let mut client = NativeClientInfo::new(AppId::new("com.example.native"), 2);
    client.registration_expired = true;

    client.register(BusToken(7));

    assert!(client.registered);
    assert!(!client.registration_expired);
    assert!(client.can_send());
    assert_eq!(client.channel, Some(BusToken(7)));
}

#[test]
fn unregistered_client_cannot_send() {
    let client = NativeClientInfo::new(AppId::new("com.example.native"), 2);
    assert!(!client.can_send());
}

#[test]
fn v2_acknowledges_with_event_key() {
    let client = NativeClientInfo::new(AppId::new("com.example.native"), 2);
    assert_eq!(client.registered_payload()["event"], "registered");

    let v1 = NativeClientInfo::new(AppId::new("com.example.native"), 1);
    assert_eq!(v1.registered_payload()["message"], "registered");
}

#[test]
fn relaunch_payload_carries_parameters() {
    let client = NativeClientInfo::new(AppId::new("com.example.native"), 2);
    let payload = client.relaunch_payload(&json!({"page": "home"}), "relaunch");
    assert_eq!(payload["event"], "relaunch");
    assert_eq!(payload["parameters"]["page"], "home");
}
