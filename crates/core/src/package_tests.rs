// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::PathBuf;
use yare::parameterized;

pub(crate) fn package(id: &str, version: &str, dir: TypeByDir) -> AppPackage {
    AppPackage {
        app_id: AppId::new(id),
        folder_path: PathBuf::from(format!("/apps/{id}")),
        app_type: AppType::Web,
        type_by_dir: dir,
        main: "index.html".to_string(),
        title: id.to_string(),
        version: AppVersion::parse(version),
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

#[parameterized(
    higher_version_wins = { "2.0.0", TypeByDir::Store, "1.9.9", TypeByDir::Store, true },
    lower_version_loses = { "1.0.0", TypeByDir::Store, "1.0.1", TypeByDir::Store, false },
    tie_broken_by_dir = { "1.0.0", TypeByDir::Store, "1.0.0", TypeByDir::SystemBuiltIn, true },
    tie_same_dir_keeps_incumbent = { "1.0.0", TypeByDir::Store, "1.0.0", TypeByDir::Store, false },
    dev_never_beats_store = { "9.0.0", TypeByDir::Dev, "1.0.0", TypeByDir::Store, false },
    dev_beats_dev = { "2.0.0", TypeByDir::Dev, "1.0.0", TypeByDir::Dev, true },
)]
fn outranks(
    cand_ver: &str,
    cand_dir: TypeByDir,
    inc_ver: &str,
    inc_dir: TypeByDir,
    expected: bool,
) {
    let candidate = package("com.example.app", cand_ver, cand_dir);
    let incumbent = package("com.example.app", inc_ver, inc_dir);
    assert_eq!(candidate.outranks(&incumbent), expected);
}

#[test]
fn removal_flagged_incumbent_always_loses() {
    let mut incumbent = package("com.example.app", "9.9.9", TypeByDir::Store);
    incumbent.flagged_for_removal = true;
    let candidate = package("com.example.app", "0.0.1", TypeByDir::Dev);
    assert!(candidate.outranks(&incumbent));
}

#[parameterized(
    web = { AppType::Web, HandlerKind::Web },
    qml = { AppType::Qml, HandlerKind::Qml },
    native_qml = { AppType::NativeQml, HandlerKind::Qml },
    native = { AppType::Native, HandlerKind::Native },
    builtin = { AppType::NativeBuiltin, HandlerKind::Native },
    mvpd = { AppType::NativeMvpd, HandlerKind::Native },
    appshell = { AppType::NativeAppShell, HandlerKind::Native },
    stub = { AppType::Stub, HandlerKind::None },
)]
fn handler_kinds(app_type: AppType, kind: HandlerKind) {
    assert_eq!(HandlerKind::of(app_type), kind);
}

#[test]
fn appinfo_json_uses_bus_field_names() {
    let pkg = package("com.example.app", "1.2.3", TypeByDir::Store);
    let json = pkg.to_json();
    assert_eq!(json["id"], "com.example.app");
    assert_eq!(json["type"], "web");
    assert_eq!(json["typeByDir"], "store");
    assert_eq!(json["version"]["major"], 1);
}

#[test]
fn projection_always_includes_id_and_reports_missing() {
    let pkg = package("com.example.app", "1.0.0", TypeByDir::Store);
    let projected = project_props(
        &pkg.to_json(),
        &["title".to_string(), "noSuchKey".to_string()],
    );
    assert_eq!(projected["id"], "com.example.app");
    assert_eq!(projected["title"], "com.example.app");
    assert_eq!(projected["notSpecified"], serde_json::json!(["noSuchKey"]));
}

#[test]
fn projection_with_no_props_is_id_only() {
    let pkg = package("com.example.app", "1.0.0", TypeByDir::Store);
    let projected = project_props(&pkg.to_json(), &[]);
    let obj = projected.as_object().unwrap();
    assert_eq!(obj.len(), 1);
    assert!(obj.contains_key("id"));
}

#[test]
fn system_dirs_are_flagged() {
    assert!(TypeByDir::SystemBuiltIn.is_system());
    assert!(TypeByDir::SystemUpdatable.is_system());
    assert!(!TypeByDir::Store.is_system());
    assert!(!TypeByDir::Dev.is_system());
}
