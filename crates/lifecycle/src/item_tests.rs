// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn redirection_rewrites_target_but_not_requested_id() {
    let mut item = LaunchAppItem::new(
        AppId::new("com.example.stub"),
        DisplayId::default(),
        json!({"from": "stub"}),
        BusToken::NONE,
    );

    item.set_redirection(AppId::new("com.example.real"), json!({"redirected": true}));

    assert_eq!(item.app_id(), &AppId::new("com.example.real"));
    assert_eq!(item.requested_app_id(), &AppId::new("com.example.stub"));
    assert!(item.is_redirected());
    assert_eq!(item.params["redirected"], true);
}

#[test]
fn redirection_with_null_params_keeps_originals() {
    let mut item = LaunchAppItem::new(
        AppId::new("com.example.stub"),
        DisplayId::default(),
        json!({"keep": "me"}),
        BusToken::NONE,
    );

    item.set_redirection(AppId::new("com.example.real"), Value::Null);

    assert_eq!(item.params["keep"], "me");
}

#[test]
fn close_reason_defaults_to_normal() {
    let item = CloseAppItem::new(
        AppId::new("com.example.web"),
        DisplayId::default(),
        "com.example.caller".to_string(),
        String::new(),
    );
    assert_eq!(item.reason, "normal");
    assert!(!item.is_memory_reclaim());

    let reclaim = CloseAppItem::new(
        AppId::new("com.example.web"),
        DisplayId::default(),
        String::new(),
        "memoryReclaim".to_string(),
    );
    assert!(reclaim.is_memory_reclaim());
}

#[test]
fn fresh_item_has_no_outstanding_call() {
    let item = LaunchAppItem::new(
        AppId::new("com.example.web"),
        DisplayId::default(),
        Value::Null,
        BusToken::NONE,
    );
    assert!(item.return_token.is_none());
    assert!(!item.has_error());
    assert_eq!(item.stage, LaunchStage::CheckExecute);
}
