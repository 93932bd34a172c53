// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tokio::io::AsyncReadExt;

async fn served_bus(
    dir: &std::path::Path,
) -> (SocketBus, mpsc::Receiver<InboundRequest>, mpsc::Receiver<Event>) {
    let (event_tx, event_rx) = mpsc::channel(64);
    let (bus, requests_rx) = SocketBus::new(dir, event_tx);
    bus.register_service("com.example.sam", &[]).await.unwrap();
    bus.register_category("/", &["launch".to_string(), "running".to_string()])
        .await
        .unwrap();
    let server = bus.clone();
    tokio::spawn(async move {
        let _ = server.serve().await;
    });
    // Wait for the socket file to appear.
    let path = dir.join("com.example.sam.sock");
    for _ in 0..100 {
        if path.exists() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    (bus, requests_rx, event_rx)
}

#[tokio::test]
async fn inbound_call_reaches_dispatcher_and_reply_returns() {
    let dir = tempfile::tempdir().unwrap();
    let (bus, mut requests_rx, _events) = served_bus(dir.path()).await;

    let mut client = UnixStream::connect(dir.path().join("com.example.sam.sock")).await.unwrap();
    client
        .write_all(b"{\"id\":7,\"method\":\"/launch\",\"payload\":{\"id\":\"com.example.web\"},\"caller\":\"com.example.caller\"}\n")
        .await
        .unwrap();

    let request = requests_rx.recv().await.unwrap();
    assert_eq!(request.method, "/launch");
    assert_eq!(request.caller_id, "com.example.caller");
    assert_eq!(request.payload["id"], "com.example.web");

    bus.respond(request.token, json!({"returnValue": true})).await.unwrap();

    let mut buf = vec![0u8; 256];
    let n = client.read(&mut buf).await.unwrap();
    let reply: serde_json::Value = serde_json::from_slice(&buf[..n]).unwrap();
    assert_eq!(reply["id"], 7);
    assert_eq!(reply["payload"]["returnValue"], true);
}

#[tokio::test]
async fn unknown_method_is_rejected_without_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let (_bus, mut requests_rx, _events) = served_bus(dir.path()).await;

    let mut client = UnixStream::connect(dir.path().join("com.example.sam.sock")).await.unwrap();
    client
        .write_all(b"{\"id\":1,\"method\":\"/noSuchMethod\",\"payload\":{}}\n")
        .await
        .unwrap();

    let mut buf = vec![0u8; 256];
    let n = client.read(&mut buf).await.unwrap();
    let reply: serde_json::Value = serde_json::from_slice(&buf[..n]).unwrap();
    assert_eq!(reply["payload"]["returnValue"], false);

    // Nothing was dispatched.
    assert!(requests_rx.try_recv().is_err());
}

#[tokio::test]
async fn outbound_call_reply_arrives_as_event() {
    let dir = tempfile::tempdir().unwrap();
    let (bus, mut requests_rx, mut events) = served_bus(dir.path()).await;

    // The bus calls itself: its own socket doubles as the peer service.
    let token = bus
        .call_one_reply("luna://com.example.sam/launch", json!({"id": "com.example.web"}))
        .await
        .unwrap();

    // Serve the peer side of the call.
    let request = requests_rx.recv().await.unwrap();
    bus.respond(request.token, json!({"returnValue": true, "pid": 42})).await.unwrap();

    let event = events.recv().await.unwrap();
    match event {
        Event::BusReply { token: reply_token, payload } => {
            assert_eq!(reply_token, token);
            assert_eq!(payload["pid"], 42);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn subscription_reply_drops_dead_subscribers() {
    let dir = tempfile::tempdir().unwrap();
    let (bus, mut requests_rx, _events) = served_bus(dir.path()).await;

    let mut client = UnixStream::connect(dir.path().join("com.example.sam.sock")).await.unwrap();
    client
        .write_all(b"{\"id\":9,\"method\":\"/running\",\"payload\":{\"subscribe\":true}}\n")
        .await
        .unwrap();
    let request = requests_rx.recv().await.unwrap();
    assert!(bus.subscription_add("running", request.token));
    assert_eq!(bus.subscriber_count("running"), 1);

    drop(client);
    // Give the connection-close path a moment to prune.
    tokio::time::sleep(Duration::from_millis(50)).await;

    bus.subscription_reply("running", json!({"running": []}));
    assert_eq!(bus.subscriber_count("running"), 0);
}
