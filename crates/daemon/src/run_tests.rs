// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sam_bus::FakeBus;
use sam_core::{AppType, AppVersion, BusToken, DisplayId, FakeClock, TypeByDir, WindowGroup};
use sam_lifecycle::FakeProcesses;
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;

fn web_package(id: &str) -> AppPackage {
    AppPackage {
        app_id: AppId::new(id),
        folder_path: PathBuf::from(format!("/apps/{id}")),
        app_type: AppType::Web,
        type_by_dir: TypeByDir::Store,
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

#[tokio::test]
async fn event_loop_drives_a_launch_and_exits_on_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let bus = FakeBus::new();
    let (event_tx, event_rx) = mpsc::channel(64);

    let roster = Arc::new(Mutex::new(Roster::new(
        dir.path().join("deleted-apps.json"),
        vec!["en".to_string()],
    )));
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

    let loop_manager = Arc::clone(&manager);
    let handle = tokio::spawn(async move {
        run_event_loop(&loop_manager, event_rx).await;
    });

    event_tx
        .send(Event::RosterScanned {
            packages: vec![web_package("com.example.web")],
            reason: "boot".to_string(),
        })
        .await
        .unwrap();
    event_tx
        .send(Event::LaunchApp {
            id: AppId::new("com.example.web"),
            display: DisplayId::default(),
            params: json!({}),
            preload: String::new(),
            keep_alive: false,
            no_splash: false,
            spinner: false,
            caller_id: "test".to_string(),
            caller_pid: "1".to_string(),
            reply: BusToken(1),
        })
        .await
        .unwrap();

    // The loop runs asynchronously; wait for the handler dispatch to land.
    let mut launched = false;
    for _ in 0..100 {
        if !bus.calls_to("launchApp").is_empty() {
            launched = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(launched, "the loop must drive the launch to the web runtime");

    event_tx.send(Event::Shutdown).await.unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap_or_else(|_| panic!("loop did not exit on shutdown"))
        .unwrap();
}

#[test]
fn apps_index_parses_appinfo_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("apps.json");
    std::fs::write(
        &path,
        r#"[
            {
                "id": "com.example.web",
                "folderPath": "/apps/com.example.web",
                "type": "web",
                "typeByDir": "store",
                "main": "index.html",
                "title": "Example"
            }
        ]"#,
    )
    .unwrap();

    let packages = load_apps_index(&path).unwrap();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].app_id, "com.example.web");
    assert_eq!(packages[0].app_type, AppType::Web);
    // Unspecified manifest fields take their defaults.
    assert!(packages[0].removable);
    assert_eq!(packages[0].version, AppVersion::default());
}

#[test]
fn missing_apps_index_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_apps_index(&dir.path().join("nope.json")),
        Err(DaemonError::Io(_))
    ));
}
