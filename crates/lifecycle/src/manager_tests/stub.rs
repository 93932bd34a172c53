// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stub redirection scenarios.

use super::*;

#[tokio::test]
async fn stub_launch_redirects_to_the_real_app() {
    let ctx = setup(vec![
        stub_package("com.example.stub", "com.example.real"),
        package("com.example.real", AppType::Web),
    ])
    .await;
    let reply = BusToken(300);

    handle_event_chain(&ctx, launch_event("com.example.stub", reply)).await;

    // The pipeline restarted for the real app and dispatched to the web
    // handler.
    let calls = ctx.bus.calls_to("launchApp");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].payload["appDesc"]["id"], "com.example.real");

    handle_event_chain(
        &ctx,
        Event::BusReply { token: calls[0].token, payload: json!({ "appId": "com.example.real" }) },
    )
    .await;

    // The caller's reply names the redirect target, not the stub.
    let responses = ctx.bus.responses_to(reply);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["returnValue"], true);
    assert_eq!(responses[0]["appId"], "com.example.real");
    assert_eq!(life_status(&ctx, "com.example.real"), Some(LifeStatus::Foreground));
    assert_eq!(life_status(&ctx, "com.example.stub"), None);
}

#[tokio::test]
async fn stub_without_redirection_fails() {
    let ctx = setup(vec![package("com.example.stub", AppType::Stub)]).await;
    let reply = BusToken(310);

    handle_event_chain(&ctx, launch_event("com.example.stub", reply)).await;

    let responses = ctx.bus.responses_to(reply);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["returnValue"], false);
    assert_eq!(responses[0]["errorText"], "no redirection target");
}

#[tokio::test]
async fn stub_chain_does_not_bounce_forever() {
    let ctx = setup(vec![
        stub_package("com.example.stub", "com.example.stub2"),
        stub_package("com.example.stub2", "com.example.stub"),
    ])
    .await;
    let reply = BusToken(320);

    handle_event_chain(&ctx, launch_event("com.example.stub", reply)).await;

    let responses = ctx.bus.responses_to(reply);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["returnValue"], false);
    assert_eq!(responses[0]["errorText"], "redirection loop");
}

#[tokio::test]
async fn close_and_pause_on_stub_are_no_ops() {
    let ctx = setup(vec![stub_package("com.example.stub", "com.example.real")]).await;

    handle_event_chain(&ctx, close_event("com.example.stub", "", BusToken(330))).await;
    assert_eq!(ctx.bus.responses_to(BusToken(330))[0]["returnValue"], true);

    handle_event_chain(
        &ctx,
        Event::PauseApp { id: AppId::new("com.example.stub"), params: json!({}), reply: BusToken(331) },
    )
    .await;
    assert_eq!(ctx.bus.responses_to(BusToken(331))[0]["returnValue"], true);
}
