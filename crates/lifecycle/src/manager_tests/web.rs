// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Web handler scenarios.

use super::*;

const WEB_APP: &str = "com.example.web";

async fn connect_web_runtime(ctx: &TestContext) -> BusToken {
    handle_event_chain(
        ctx,
        Event::ServiceStatus { service: "com.palm.webappmanager".to_string(), connected: true },
    )
    .await;
    let calls = ctx.bus.calls_to("listRunningApps");
    assert_eq!(calls.len(), 1);
    calls[0].token
}

/// Simulate the runtime's running-list subscription reporting `entries`.
async fn push_running_list(ctx: &TestContext, sub: BusToken, entries: Value) {
    handle_event_chain(
        ctx,
        Event::BusReply { token: sub, payload: json!({ "returnValue": true, "running": entries }) },
    )
    .await;
}

async fn launch_web_app(ctx: &TestContext, reply: BusToken) -> BusToken {
    handle_event_chain(ctx, launch_event(WEB_APP, reply)).await;
    let calls = ctx.bus.calls_to("launchApp");
    let call = calls.last().unwrap_or_else(|| panic!("no launchApp call"));
    assert_eq!(call.payload["appDesc"]["id"], WEB_APP);
    call.token
}

#[tokio::test]
async fn web_launch_then_graceful_close() {
    let ctx = setup(vec![package(WEB_APP, AppType::Web)]).await;
    let sub = connect_web_runtime(&ctx).await;
    let reply = BusToken(40);

    // Launch: launchApp call goes out, status becomes launching.
    let launch_token = launch_web_app(&ctx, reply).await;
    assert_eq!(life_status(&ctx, WEB_APP), Some(LifeStatus::Launching));

    // Runtime confirms the launch.
    handle_event_chain(
        &ctx,
        Event::BusReply {
            token: launch_token,
            payload: json!({ "appId": WEB_APP, "procId": "1002" }),
        },
    )
    .await;
    let responses = ctx.bus.responses_to(reply);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["returnValue"], true);
    assert_eq!(responses[0]["appId"], WEB_APP);
    assert_eq!(life_status(&ctx, WEB_APP), Some(LifeStatus::Foreground));

    // Running list shows the app; running subscribers see it appear.
    push_running_list(
        &ctx,
        sub,
        json!([{ "id": WEB_APP, "processid": "1002", "webprocessid": "2904" }]),
    )
    .await;
    let running_posts = ctx.bus.posts_on(keys::RUNNING);
    let appeared = running_posts
        .iter()
        .any(|post| post["running"].as_array().is_some_and(|list| !list.is_empty()));
    assert!(appeared, "running subscribers must see the app appear");

    // Close: killApp goes out, closing is observable.
    handle_event_chain(&ctx, close_event(WEB_APP, "", BusToken(41))).await;
    assert_eq!(ctx.bus.calls_to("killApp").len(), 1);
    assert_eq!(life_status(&ctx, WEB_APP), Some(LifeStatus::Closing));

    // Running list drops the app: stop, and the record goes away.
    push_running_list(&ctx, sub, json!([])).await;
    assert_eq!(life_status(&ctx, WEB_APP), None, "running info removed after stop");

    assert_eq!(
        pushed_statuses(&ctx, WEB_APP),
        vec!["launching", "foreground", "closing", "stop"]
    );
    assert_eq!(
        pushed_events(&ctx, WEB_APP),
        vec!["splash", "launch", "foreground", "close", "stop"]
    );
    let last = ctx.bus.posts_on(keys::RUNNING);
    let emptied = last
        .last()
        .and_then(|post| post["running"].as_array().map(Vec::is_empty))
        .unwrap_or(false);
    assert!(emptied, "running subscribers must see the app disappear");
}

#[tokio::test]
async fn relaunch_of_background_app_converts_to_relaunching() {
    let ctx = setup(vec![package(WEB_APP, AppType::Web)]).await;
    let sub = connect_web_runtime(&ctx).await;

    // Preload the app into Background.
    let mut preload_event = launch_event(WEB_APP, BusToken(50));
    if let Event::LaunchApp { ref mut preload, ref mut keep_alive, .. } = preload_event {
        *preload = "onDemand".to_string();
        *keep_alive = true;
    }
    handle_event_chain(&ctx, preload_event).await;
    let launch_token = ctx.bus.calls_to("launchApp")[0].token;
    assert_eq!(life_status(&ctx, WEB_APP), Some(LifeStatus::Preloading));

    push_running_list(
        &ctx,
        sub,
        json!([{ "id": WEB_APP, "processid": "1002", "webprocessid": "2904" }]),
    )
    .await;
    assert_eq!(
        life_status(&ctx, WEB_APP),
        Some(LifeStatus::Background),
        "preloaded process converts to background"
    );
    handle_event_chain(
        &ctx,
        Event::BusReply { token: launch_token, payload: json!({ "appId": WEB_APP }) },
    )
    .await;
    let pid_before = ctx.running.lock().get_app(&AppId::new(WEB_APP)).map(|i| i.pid.clone());

    // A real launch of the background app is a relaunch.
    handle_event_chain(&ctx, launch_event(WEB_APP, BusToken(51))).await;
    assert_eq!(life_status(&ctx, WEB_APP), Some(LifeStatus::Relaunching));

    let relaunch_token = ctx.bus.calls_to("launchApp")[1].token;
    handle_event_chain(
        &ctx,
        Event::BusReply { token: relaunch_token, payload: json!({ "appId": WEB_APP }) },
    )
    .await;

    assert_eq!(life_status(&ctx, WEB_APP), Some(LifeStatus::Foreground));
    let pid_after = ctx.running.lock().get_app(&AppId::new(WEB_APP)).map(|i| i.pid.clone());
    assert_eq!(pid_before, pid_after, "relaunch keeps the existing process");
    let statuses = pushed_statuses(&ctx, WEB_APP);
    assert!(statuses.contains(&"relaunching".to_string()));
}

#[tokio::test]
async fn close_of_app_that_is_not_running_fails() {
    let ctx = setup(vec![package(WEB_APP, AppType::Web)]).await;
    connect_web_runtime(&ctx).await;
    let reply = BusToken(60);

    handle_event_chain(&ctx, close_event(WEB_APP, "", reply)).await;

    let responses = ctx.bus.responses_to(reply);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["returnValue"], false);
    assert_eq!(responses[0]["errorText"], "app is not running");
    assert!(ctx.bus.calls_to("killApp").is_empty());
}

#[tokio::test]
async fn close_of_loading_app_stops_it_manually() {
    let ctx = setup(vec![package(WEB_APP, AppType::Web)]).await;
    connect_web_runtime(&ctx).await;

    // Launch, but the running list never reports the app.
    launch_web_app(&ctx, BusToken(70)).await;
    assert_eq!(life_status(&ctx, WEB_APP), Some(LifeStatus::Launching));

    handle_event_chain(&ctx, close_event(WEB_APP, "", BusToken(71))).await;

    assert_eq!(ctx.bus.calls_to("killApp").len(), 1);
    // Closing then a synthetic stop, because the runtime never listed it.
    let statuses = pushed_statuses(&ctx, WEB_APP);
    assert_eq!(statuses, vec!["launching", "closing", "stop"]);
    assert_eq!(life_status(&ctx, WEB_APP), None);
}

#[tokio::test]
async fn close_all_closes_every_running_app() {
    let ctx = setup(vec![
        package(WEB_APP, AppType::Web),
        package("com.example.other", AppType::Web),
    ])
    .await;
    let sub = connect_web_runtime(&ctx).await;

    for (app, reply) in [(WEB_APP, BusToken(90)), ("com.example.other", BusToken(91))] {
        handle_event_chain(&ctx, launch_event(app, reply)).await;
    }
    push_running_list(
        &ctx,
        sub,
        json!([
            { "id": WEB_APP, "processid": "1002", "webprocessid": "2904" },
            { "id": "com.example.other", "processid": "1003", "webprocessid": "2905" },
        ]),
    )
    .await;

    handle_event_chain(&ctx, Event::CloseAllApps { reason: "shutdown".to_string() }).await;

    let kills = ctx.bus.calls_to("killApp");
    assert_eq!(kills.len(), 2);
    assert!(kills.iter().all(|call| call.payload["reason"] == "shutdown"));
    assert_eq!(life_status(&ctx, WEB_APP), Some(LifeStatus::Closing));
    assert_eq!(life_status(&ctx, "com.example.other"), Some(LifeStatus::Closing));
}

#[tokio::test]
async fn runtime_refusal_fails_the_launch() {
    let ctx = setup(vec![package(WEB_APP, AppType::Web)]).await;
    connect_web_runtime(&ctx).await;
    let reply = BusToken(80);

    let launch_token = launch_web_app(&ctx, reply).await;
    handle_event_chain(
        &ctx,
        Event::BusReply {
            token: launch_token,
            payload: json!({ "returnValue": false, "errorText": "no memory" }),
        },
    )
    .await;

    let responses = ctx.bus.responses_to(reply);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["returnValue"], false);
    assert_eq!(responses[0]["errorText"], "web runtime launchApp failed");
    assert_eq!(life_status(&ctx, WEB_APP), None, "refused launch ends in stop");
}
