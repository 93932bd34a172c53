// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sam_bus::FakeBus;
use sam_core::{
    AppPackage, AppType, AppVersion, BusToken, FakeClock, TypeByDir, WindowGroup,
    ERR_APP_NOT_FOUND, ERR_DEPRECATED, ERR_INVALID_PAYLOAD, ERR_NO_PERMISSION,
};
use sam_lifecycle::{FakeProcesses, ManagerConfig, ManagerDeps};
use serde_json::json;
use std::path::PathBuf;

struct TestService {
    ctx: ServiceContext<FakeBus, FakeProcesses, FakeClock>,
    bus: FakeBus,
    events: mpsc::Receiver<Event>,
    _dir: tempfile::TempDir,
}

fn package(id: &str, app_type: AppType, dir: TypeByDir) -> AppPackage {
    AppPackage {
        app_id: sam_core::AppId::new(id),
        folder_path: PathBuf::from(format!("/apps/{id}")),
        app_type,
        type_by_dir: dir,
        main: "index.html".to_string(),
        title: id.to_string(),
        version: AppVersion::default(),
        trust_level: "default".to_string(),
        default_window_type: "card".to_string(),
        window_group: WindowGroup::default(),
        removable: true,
        visible: true,
        builtin_based: false,
        splash_on_launch: true,
        spinner_on_launch: false,
        required_memory: 0,
        native_interface_version: 1,
        redirection: None,
        locked: false,
        flagged_for_removal: false,
    }
}

fn setup(packages: Vec<AppPackage>) -> TestService {
    let dir = tempfile::tempdir().unwrap();
    let bus = FakeBus::new();
    let (event_tx, events) = mpsc::channel(32);

    let roster = Arc::new(Mutex::new(Roster::new(
        dir.path().join("deleted-apps.json"),
        vec!["en".to_string()],
    )));
    roster.lock().apply_scan(packages, "boot");
    let running = Arc::new(Mutex::new(RunningInfoTable::new()));

    let manager = Arc::new(Manager::new(
        ManagerDeps {
            bus: bus.clone(),
            processes: FakeProcesses::new(),
            roster: Arc::clone(&roster),
            running: Arc::clone(&running),
        },
        FakeClock::new(),
        ManagerConfig::default(),
        event_tx.clone(),
    ));

    let ctx = ServiceContext { manager, bus: bus.clone(), roster, running, event_tx };
    TestService { ctx, bus, events, _dir: dir }
}

fn request(method: &str, payload: Value, token: BusToken, caller: &str) -> InboundRequest {
    InboundRequest {
        method: method.to_string(),
        payload,
        token,
        caller_id: caller.to_string(),
        caller_pid: "100".to_string(),
    }
}

#[tokio::test]
async fn launch_emits_an_engine_event_with_the_reply_token() {
    let mut service = setup(vec![package("com.example.web", AppType::Web, TypeByDir::Store)]);
    let token = BusToken(7);

    handle_request(
        &service.ctx,
        request(
            "/launch",
            json!({"id": "com.example.web", "params": {"page": "home"}, "keepAlive": true}),
            token,
            "com.example.caller",
        ),
    )
    .await;

    let event = service.events.try_recv().unwrap_or_else(|_| panic!("no event emitted"));
    match event {
        Event::LaunchApp { id, params, keep_alive, caller_id, reply, .. } => {
            assert_eq!(id, "com.example.web");
            assert_eq!(params["page"], "home");
            assert!(keep_alive);
            assert_eq!(caller_id, "com.example.caller");
            assert_eq!(reply, token);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    // No immediate reply: the engine answers when the launch resolves.
    assert!(service.bus.responses_to(token).is_empty());
}

#[tokio::test]
async fn launch_without_id_is_an_invalid_payload() {
    let mut service = setup(vec![]);
    let token = BusToken(8);

    handle_request(&service.ctx, request("/launch", json!({}), token, "caller")).await;

    let responses = service.bus.responses_to(token);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["returnValue"], false);
    assert_eq!(responses[0]["errorCode"], ERR_INVALID_PAYLOAD);
    assert!(service.events.try_recv().is_err());
}

#[tokio::test]
async fn running_replies_snapshot_and_registers_subscription() {
    let service = setup(vec![package("com.example.web", AppType::Web, TypeByDir::Store)]);
    let token = BusToken(9);

    handle_request(&service.ctx, request("/running", json!({"subscribe": true}), token, "caller"))
        .await;

    let responses = service.bus.responses_to(token);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["returnValue"], true);
    assert_eq!(responses[0]["subscribed"], true);
    assert!(responses[0]["running"].as_array().is_some_and(Vec::is_empty));
    assert_eq!(service.bus.subscriber_count(sam_lifecycle::keys::RUNNING), 1);
}

#[tokio::test]
async fn life_event_feeds_require_subscription() {
    let service = setup(vec![]);
    let token = BusToken(10);

    handle_request(&service.ctx, request("/getAppLifeEvents", json!({}), token, "caller")).await;

    let responses = service.bus.responses_to(token);
    assert_eq!(responses[0]["returnValue"], false);
    assert_eq!(responses[0]["errorCode"], ERR_INVALID_PAYLOAD);

    let token = BusToken(11);
    handle_request(
        &service.ctx,
        request("/getAppLifeStatus", json!({"subscribe": true}), token, "caller"),
    )
    .await;
    assert_eq!(service.bus.responses_to(token)[0]["subscribed"], true);
    assert_eq!(service.bus.subscriber_count(sam_lifecycle::keys::LIFE_STATUS), 1);
}

#[tokio::test]
async fn lock_app_flips_the_roster_flag() {
    let service = setup(vec![package("com.example.web", AppType::Web, TypeByDir::Store)]);
    let token = BusToken(12);

    handle_request(
        &service.ctx,
        request("/lockApp", json!({"id": "com.example.web", "lock": true}), token, "caller"),
    )
    .await;

    let responses = service.bus.responses_to(token);
    assert_eq!(responses[0]["returnValue"], true);
    assert_eq!(responses[0]["locked"], true);
    assert!(service.ctx.roster.lock().get("com.example.web").is_some_and(|p| p.locked));

    let token = BusToken(13);
    handle_request(
        &service.ctx,
        request("/lockApp", json!({"id": "com.example.ghost", "lock": true}), token, "caller"),
    )
    .await;
    assert_eq!(service.bus.responses_to(token)[0]["errorCode"], ERR_APP_NOT_FOUND);
}

#[tokio::test]
async fn dev_close_is_restricted_to_dev_apps() {
    let mut service = setup(vec![
        package("com.example.store", AppType::Web, TypeByDir::Store),
        package("com.example.devapp", AppType::Web, TypeByDir::Dev),
    ]);

    let token = BusToken(14);
    handle_request(
        &service.ctx,
        request("/dev/closeByAppId", json!({"id": "com.example.store"}), token, "caller"),
    )
    .await;
    assert_eq!(service.bus.responses_to(token)[0]["errorCode"], ERR_NO_PERMISSION);
    assert!(service.events.try_recv().is_err());

    let token = BusToken(15);
    handle_request(
        &service.ctx,
        request("/dev/closeByAppId", json!({"id": "com.example.devapp"}), token, "caller"),
    )
    .await;
    assert!(matches!(service.events.try_recv(), Ok(Event::CloseApp { .. })));
}

#[tokio::test]
async fn list_apps_projects_requested_properties() {
    let service = setup(vec![package("com.example.web", AppType::Web, TypeByDir::Store)]);
    let token = BusToken(16);

    handle_request(
        &service.ctx,
        request(
            "/listApps",
            json!({"properties": ["title", "noSuchKey"], "subscribe": true}),
            token,
            "caller",
        ),
    )
    .await;

    let responses = service.bus.responses_to(token);
    let apps = responses[0]["apps"].as_array().unwrap_or_else(|| panic!("no apps"));
    assert_eq!(apps.len(), 1);
    assert_eq!(apps[0]["id"], "com.example.web");
    assert_eq!(apps[0]["title"], "com.example.web");
    assert!(apps[0].get("type").is_none(), "unrequested keys are dropped");
    assert_eq!(apps[0]["notSpecified"], json!(["noSuchKey"]));
    assert_eq!(responses[0]["subscribed"], true);
}

#[tokio::test]
async fn get_app_base_path_checks_the_caller() {
    let service = setup(vec![package("com.example.web", AppType::Web, TypeByDir::Store)]);

    let token = BusToken(17);
    handle_request(
        &service.ctx,
        request("/getAppBasePath", json!({"appId": "com.example.web"}), token, "someone.else"),
    )
    .await;
    assert_eq!(service.bus.responses_to(token)[0]["errorCode"], ERR_NO_PERMISSION);

    let token = BusToken(18);
    handle_request(
        &service.ctx,
        request("/getAppBasePath", json!({"appId": "com.example.web"}), token, "com.example.web"),
    )
    .await;
    let responses = service.bus.responses_to(token);
    assert_eq!(responses[0]["returnValue"], true);
    assert_eq!(responses[0]["basePath"], "/apps/com.example.web/index.html");
}

#[tokio::test]
async fn launch_point_methods_answer_deprecated() {
    let service = setup(vec![]);
    let token = BusToken(19);

    handle_request(&service.ctx, request("/addLaunchPoint", json!({}), token, "caller")).await;

    assert_eq!(service.bus.responses_to(token)[0]["errorCode"], ERR_DEPRECATED);
}

#[tokio::test]
async fn register_app_requires_a_native_caller() {
    let mut service = setup(vec![
        package("com.example.web", AppType::Web, TypeByDir::Store),
        {
            let mut pkg = package("com.example.native", AppType::Native, TypeByDir::Store);
            pkg.native_interface_version = 2;
            pkg
        },
    ]);

    let token = BusToken(20);
    handle_request(&service.ctx, request("/registerApp", json!({}), token, "com.example.web"))
        .await;
    assert_eq!(service.bus.responses_to(token)[0]["returnValue"], false);

    let token = BusToken(21);
    handle_request(&service.ctx, request("/registerApp", json!({}), token, "com.example.native"))
        .await;
    match service.events.try_recv() {
        Ok(Event::RegisterNativeApp { id, client }) => {
            assert_eq!(id, "com.example.native");
            assert_eq!(client, token);
        }
        other => panic!("unexpected: {other:?}"),
    }

    let token = BusToken(22);
    handle_request(&service.ctx, request("/registerApp", json!({}), token, "")).await;
    assert_eq!(service.bus.responses_to(token)[0]["errorText"], "cannot find caller id");
}

#[tokio::test]
async fn get_app_status_snapshots_the_life_status() {
    let service = setup(vec![package("com.example.web", AppType::Web, TypeByDir::Store)]);

    let token = BusToken(23);
    handle_request(
        &service.ctx,
        request(
            "/getAppStatus",
            json!({"appId": "com.example.web", "appInfo": true, "subscribe": true}),
            token,
            "caller",
        ),
    )
    .await;

    let responses = service.bus.responses_to(token);
    assert_eq!(responses[0]["status"], "stop");
    assert_eq!(responses[0]["appInfo"]["id"], "com.example.web");
    assert_eq!(responses[0]["subscribed"], true);
    assert_eq!(
        service.bus.subscriber_count(&sam_lifecycle::keys::app_status("com.example.web", true)),
        1
    );

    let token = BusToken(24);
    handle_request(
        &service.ctx,
        request("/getAppStatus", json!({"appId": "com.example.ghost"}), token, "caller"),
    )
    .await;
    assert_eq!(service.bus.responses_to(token)[0]["errorCode"], ERR_APP_NOT_FOUND);
}
