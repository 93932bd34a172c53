// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! QML booster scenarios.

use super::*;

const QML_APP: &str = "com.example.settings";

async fn connect_booster(ctx: &TestContext) -> BusToken {
    handle_event_chain(
        ctx,
        Event::ServiceStatus { service: "com.webos.booster".to_string(), connected: true },
    )
    .await;
    let calls = ctx.bus.calls_to("processFinished");
    assert_eq!(calls.len(), 1);
    calls[0].token
}

#[tokio::test]
async fn booster_launch_carries_main_and_yields_pid() {
    let ctx = setup(vec![package(QML_APP, AppType::Qml)]).await;
    let reply = BusToken(200);

    handle_event_chain(&ctx, launch_event(QML_APP, reply)).await;

    let calls = ctx.bus.calls_to("booster/launch");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].payload["main"], "main.qml");
    assert_eq!(calls[0].payload["appId"], QML_APP);
    assert_eq!(life_status(&ctx, QML_APP), Some(LifeStatus::Launching));

    handle_event_chain(
        &ctx,
        Event::BusReply {
            token: calls[0].token,
            payload: json!({ "returnValue": true, "appId": QML_APP, "pid": 4242 }),
        },
    )
    .await;

    let responses = ctx.bus.responses_to(reply);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["returnValue"], true);
    assert_eq!(responses[0]["processId"], "4242");
    assert_eq!(life_status(&ctx, QML_APP), Some(LifeStatus::Foreground));
    assert_eq!(
        ctx.running.lock().get_app(&AppId::new(QML_APP)).map(|info| info.pid.clone()),
        Some("4242".to_string())
    );
}

#[tokio::test]
async fn booster_refusal_fails_the_launch() {
    let ctx = setup(vec![package(QML_APP, AppType::Qml)]).await;
    let reply = BusToken(210);

    handle_event_chain(&ctx, launch_event(QML_APP, reply)).await;
    let token = ctx.bus.calls_to("booster/launch")[0].token;
    handle_event_chain(
        &ctx,
        Event::BusReply { token, payload: json!({ "returnValue": false }) },
    )
    .await;

    let responses = ctx.bus.responses_to(reply);
    assert_eq!(responses[0]["returnValue"], false);
    assert_eq!(responses[0]["errorText"], "booster error");
}

#[tokio::test]
async fn missing_pid_in_booster_reply_is_an_error() {
    let ctx = setup(vec![package(QML_APP, AppType::Qml)]).await;
    let reply = BusToken(220);

    handle_event_chain(&ctx, launch_event(QML_APP, reply)).await;
    let token = ctx.bus.calls_to("booster/launch")[0].token;
    handle_event_chain(
        &ctx,
        Event::BusReply { token, payload: json!({ "returnValue": true, "appId": QML_APP }) },
    )
    .await;

    assert_eq!(ctx.bus.responses_to(reply)[0]["errorText"], "booster error");
}

#[tokio::test]
async fn process_finished_signal_stops_the_app_by_pid() {
    let ctx = setup(vec![package(QML_APP, AppType::Qml)]).await;
    let signal = connect_booster(&ctx).await;

    handle_event_chain(&ctx, launch_event(QML_APP, BusToken(230))).await;
    let token = ctx.bus.calls_to("booster/launch")[0].token;
    handle_event_chain(
        &ctx,
        Event::BusReply {
            token,
            payload: json!({ "returnValue": true, "appId": QML_APP, "pid": 4242 }),
        },
    )
    .await;
    assert_eq!(life_status(&ctx, QML_APP), Some(LifeStatus::Foreground));

    handle_event_chain(
        &ctx,
        Event::BusReply { token: signal, payload: json!({ "pid": 4242 }) },
    )
    .await;

    assert_eq!(life_status(&ctx, QML_APP), None);
    assert_eq!(pushed_statuses(&ctx, QML_APP).last().map(String::as_str), Some("stop"));
}

#[tokio::test]
async fn qml_pause_is_not_supported() {
    let ctx = setup(vec![package(QML_APP, AppType::Qml)]).await;
    let reply = BusToken(240);

    handle_event_chain(
        &ctx,
        Event::PauseApp { id: AppId::new(QML_APP), params: json!({}), reply },
    )
    .await;

    let responses = ctx.bus.responses_to(reply);
    assert_eq!(responses[0]["returnValue"], false);
    assert_eq!(responses[0]["errorText"], "no interface defined for qml booster");
}

#[tokio::test]
async fn qml_close_goes_through_the_booster() {
    let ctx = setup(vec![package(QML_APP, AppType::Qml)]).await;
    handle_event_chain(&ctx, launch_event(QML_APP, BusToken(250))).await;
    let token = ctx.bus.calls_to("booster/launch")[0].token;
    handle_event_chain(
        &ctx,
        Event::BusReply {
            token,
            payload: json!({ "returnValue": true, "appId": QML_APP, "pid": 4242 }),
        },
    )
    .await;

    handle_event_chain(&ctx, close_event(QML_APP, "", BusToken(251))).await;

    assert_eq!(ctx.bus.calls_to("booster/close").len(), 1);
    assert_eq!(life_status(&ctx, QML_APP), Some(LifeStatus::Closing));
}
