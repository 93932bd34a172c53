// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::stage::StageItem;
use sam_core::{AppId, DisplayId};
use serde_json::json;

fn item(app_id: &str) -> LaunchAppItem {
    LaunchAppItem::new(AppId::new(app_id), DisplayId::default(), Value::Null, BusToken::NONE)
}

fn passing_check() -> StageItem {
    StageItem::direct_check(LaunchStage::CheckExecute, |_, _| StageResult::GoNextStage)
}

fn no_stages(_item: &mut LaunchAppItem) -> Result<(), ErrorInfo> {
    Ok(())
}

#[test]
fn empty_queue_finishes_immediately() {
    let mut prelauncher = Prelauncher::new();
    let mut item = item("com.example.web");

    let action = prelauncher.add_item(&mut item, &no_stages);

    assert!(matches!(action, PrelaunchAction::Done));
    assert!(!item.has_error());
    assert_eq!(item.stage, LaunchStage::PrelaunchDone);
    assert!(!prelauncher.contains(item.uid()));
}

#[test]
fn duplicate_uid_is_rejected() {
    let mut prelauncher = Prelauncher::new();
    let mut item = item("com.example.web");

    // Seed with a call stage so the item stays parked in the queue.
    let seed = |item: &mut LaunchAppItem| {
        item.stage_queue.push_back(StageItem::call(
            StageKind::MainCall,
            "luna://com.example.peer/check",
            |_| Ok(json!({})),
            |_, _| StageResult::GoNextStage,
            LaunchStage::Prelaunch,
        ));
        Ok(())
    };

    assert!(matches!(prelauncher.add_item(&mut item, &seed), PrelaunchAction::Call { .. }));
    let action = prelauncher.add_item(&mut item, &seed);
    assert!(matches!(action, PrelaunchAction::Done));
    assert!(item.has_error());
}

#[test]
fn direct_check_error_carries_item_error() {
    let mut prelauncher = Prelauncher::new();
    let mut item = item("com.example.web");

    let seed = |item: &mut LaunchAppItem| {
        item.stage_queue.push_back(StageItem::direct_check(LaunchStage::CheckExecute, |item, _| {
            item.set_error(ErrorInfo::app_locked());
            StageResult::Error
        }));
        Ok(())
    };

    let action = prelauncher.add_item(&mut item, &seed);
    assert!(matches!(action, PrelaunchAction::Done));
    assert_eq!(item.error.as_ref().unwrap().code, sam_core::ERR_APP_LOCKED);
}

#[test]
fn call_stage_suspends_then_reply_resumes() {
    let mut prelauncher = Prelauncher::new();
    let mut item = item("com.example.web");

    let seed = |item: &mut LaunchAppItem| {
        item.stage_queue.push_back(passing_check());
        item.stage_queue.push_back(StageItem::call(
            StageKind::MainCall,
            "luna://com.example.peer/check",
            |item| Ok(json!({"appId": item.app_id().as_str()})),
            |item, input| match input {
                StageInput::Reply(payload) if payload["ok"] == true => StageResult::GoNextStage,
                _ => {
                    item.set_error(ErrorInfo::general("peer refused"));
                    StageResult::Error
                }
            },
            LaunchStage::Prelaunch,
        ));
        Ok(())
    };

    let action = prelauncher.add_item(&mut item, &seed);
    let PrelaunchAction::Call { kind, uri, payload } = action else {
        panic!("expected a call action");
    };
    assert_eq!(kind, StageKind::MainCall);
    assert_eq!(uri, "luna://com.example.peer/check");
    assert_eq!(payload["appId"], "com.example.web");

    let token = BusToken(9);
    item.return_token = token;
    prelauncher.note_call(item.uid().clone(), token);
    assert_eq!(prelauncher.take_pending(token), Some(item.uid().clone()));

    let action = prelauncher.on_reply(&mut item, &json!({"ok": true}), &no_stages);
    assert!(matches!(action, PrelaunchAction::Done));
    assert!(!item.has_error());
    assert!(item.return_token.is_none());
}

#[test]
fn failed_reply_finishes_with_stage_error() {
    let mut prelauncher = Prelauncher::new();
    let mut item = item("com.example.web");

    let seed = |item: &mut LaunchAppItem| {
        item.stage_queue.push_back(StageItem::call(
            StageKind::MainCall,
            "luna://com.example.peer/check",
            |_| Ok(json!({})),
            |item, _| {
                item.set_error(ErrorInfo::general("peer refused"));
                StageResult::Error
            },
            LaunchStage::Prelaunch,
        ));
        Ok(())
    };

    prelauncher.add_item(&mut item, &seed);
    let action = prelauncher.on_reply(&mut item, &json!({"ok": false}), &no_stages);
    assert!(matches!(action, PrelaunchAction::Done));
    assert_eq!(item.error.as_ref().unwrap().text, "peer refused");
}

#[test]
fn go_next_stage_prunes_dependent_stages() {
    let mut prelauncher = Prelauncher::new();
    let mut item = item("com.example.web");

    // A passing check followed by two dependent sub-calls and a final check:
    // the sub-calls must be skipped, the final check must run.
    let seed = |item: &mut LaunchAppItem| {
        item.stage_queue.push_back(passing_check());
        item.stage_queue.push_back(StageItem::call(
            StageKind::SubCall,
            "luna://com.example.peer/fallback",
            |_| Ok(json!({})),
            |_, _| StageResult::GoNextStage,
            LaunchStage::Prelaunch,
        ));
        item.stage_queue.push_back(StageItem::call(
            StageKind::SubBridgeCall,
            "luna://com.example.peer/fallback2",
            |_| Ok(json!({})),
            |_, _| StageResult::GoNextStage,
            LaunchStage::Prelaunch,
        ));
        item.stage_queue.push_back(StageItem::direct_check(
            LaunchStage::Prelaunch,
            |_, _| StageResult::GoNextStage,
        ));
        Ok(())
    };

    let action = prelauncher.add_item(&mut item, &seed);
    assert!(matches!(action, PrelaunchAction::Done));
    assert!(!item.has_error());
}

#[test]
fn go_dependent_stage_keeps_sub_call() {
    let mut prelauncher = Prelauncher::new();
    let mut item = item("com.example.web");

    let seed = |item: &mut LaunchAppItem| {
        item.stage_queue.push_back(StageItem::direct_check(
            LaunchStage::CheckExecute,
            |_, _| StageResult::GoDependentStage,
        ));
        item.stage_queue.push_back(StageItem::call(
            StageKind::SubCall,
            "luna://com.example.peer/fallback",
            |_| Ok(json!({})),
            |_, _| StageResult::GoNextStage,
            LaunchStage::Prelaunch,
        ));
        Ok(())
    };

    let action = prelauncher.add_item(&mut item, &seed);
    assert!(
        matches!(action, PrelaunchAction::Call { kind: StageKind::SubCall, .. }),
        "dependent sub-call must run after GoDependentStage"
    );
}

#[test]
fn bridged_call_waits_for_external_input() {
    let mut prelauncher = Prelauncher::new();
    let mut item = item("com.example.web");

    let seed = |item: &mut LaunchAppItem| {
        item.stage_queue.push_back(StageItem::call(
            StageKind::BridgeCall,
            "luna://com.example.peer/open",
            |_| Ok(json!({})),
            |_, input| match input {
                StageInput::Reply(payload) if payload["bridged"] == true => {
                    StageResult::GoNextStage
                }
                _ => StageResult::Error,
            },
            LaunchStage::Prelaunch,
        ));
        Ok(())
    };

    let action = prelauncher.add_item(&mut item, &seed);
    assert!(matches!(action, PrelaunchAction::Call { kind: StageKind::BridgeCall, .. }));
    let token = BusToken(4);
    item.return_token = token;
    prelauncher.note_call(item.uid().clone(), token);

    // The direct reply to a bridge call does not advance the pipeline.
    prelauncher.take_pending(token);
    let action = prelauncher.on_reply(&mut item, &json!({"returnValue": true}), &no_stages);
    assert!(matches!(action, PrelaunchAction::Wait));

    // The bridged input does.
    let action = prelauncher.input_bridged_return(&mut item, &json!({"bridged": true}), &no_stages);
    assert!(matches!(action, PrelaunchAction::Done));
    assert!(!item.has_error());
}

#[test]
fn redirect_reseeds_for_new_app() {
    let mut prelauncher = Prelauncher::new();
    let mut item = item("com.example.stub");

    // First seeding redirects; the re-seed sees the new app id and finishes
    // with a plain passing check.
    let seed = |item: &mut LaunchAppItem| {
        if item.app_id() == &AppId::new("com.example.stub") {
            item.stage_queue.push_back(StageItem::direct_check(
                LaunchStage::Prelaunch,
                |item, _| {
                    item.set_redirection(AppId::new("com.example.real"), Value::Null);
                    StageResult::Redirected
                },
            ));
        } else {
            item.stage_queue.push_back(passing_check());
        }
        Ok(())
    };

    let action = prelauncher.add_item(&mut item, &seed);
    assert!(matches!(action, PrelaunchAction::Done));
    assert!(!item.has_error());
    assert_eq!(item.app_id(), &AppId::new("com.example.real"));
    assert_eq!(item.requested_app_id(), &AppId::new("com.example.stub"));
}

#[test]
fn cancel_all_drains_the_queue() {
    let mut prelauncher = Prelauncher::new();
    let mut first = item("com.example.one");
    let mut second = item("com.example.two");

    let seed = |item: &mut LaunchAppItem| {
        item.stage_queue.push_back(StageItem::call(
            StageKind::MainCall,
            "luna://com.example.peer/check",
            |_| Ok(json!({})),
            |_, _| StageResult::GoNextStage,
            LaunchStage::Prelaunch,
        ));
        Ok(())
    };

    prelauncher.add_item(&mut first, &seed);
    prelauncher.add_item(&mut second, &seed);

    let cancelled = prelauncher.cancel_all();
    assert_eq!(cancelled.len(), 2);
    assert!(cancelled.contains(first.uid()));
    assert!(cancelled.contains(second.uid()));
    assert!(prelauncher.queued().is_empty());
}
