// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn events_round_trip_with_type_tags() {
    let event = Event::RuntimeStatusChanged {
        app_id: AppId::new("com.example.web"),
        uid: Some(LaunchUid::from_string("uid-1")),
        status: RuntimeStatus::Launching,
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "life:runtime-status");
    assert_eq!(json["status"], "launching");

    let back: Event = serde_json::from_value(json).unwrap();
    assert_eq!(back, event);
}

#[test]
fn launch_event_defaults_optional_fields() {
    let event: Event = serde_json::from_str(
        r#"{"type": "app:launch", "id": "com.example.web"}"#,
    )
    .unwrap();
    match event {
        Event::LaunchApp { id, display, preload, keep_alive, reply, .. } => {
            assert_eq!(id, "com.example.web");
            assert_eq!(display.as_str(), "default");
            assert!(preload.is_empty());
            assert!(!keep_alive);
            assert!(reply.is_none());
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn unknown_type_tag_becomes_custom() {
    let event: Event = serde_json::from_str(r#"{"type": "no:such-event"}"#).unwrap();
    assert_eq!(event, Event::Custom);
}

#[test]
fn log_summary_names_the_app() {
    let event = Event::RunningAppAdded {
        app_id: AppId::new("com.example.qml"),
        pid: "4242".to_string(),
        web_pid: String::new(),
    };
    let summary = event.log_summary();
    assert!(summary.contains("com.example.qml"));
    assert!(summary.contains("4242"));
}
