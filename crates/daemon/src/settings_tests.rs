// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load(&dir.path().join("nope.toml")).unwrap();
    assert_eq!(settings.socket_dir, PathBuf::from("/run/sam"));
    assert!(!settings.dev_mode);
    assert_eq!(settings.locale_fallbacks, vec!["en".to_string()]);
}

#[test]
fn file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sam.toml");
    std::fs::write(
        &path,
        r#"
socket-dir = "/tmp/sam-sockets"
dev-mode = true
locale-fallbacks = ["ko-KR", "ko", "en"]
keep-alive-apps = ["com.example.keeper"]
web-runtime-service = "com.example.wam"
apps-index = "/tmp/apps.json"
"#,
    )
    .unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.socket_dir, PathBuf::from("/tmp/sam-sockets"));
    assert!(settings.dev_mode);
    assert_eq!(settings.locale_fallbacks.len(), 3);
    assert_eq!(settings.keep_alive_apps, vec!["com.example.keeper".to_string()]);
    assert_eq!(settings.web_runtime_service, "com.example.wam");
    assert_eq!(settings.apps_index, Some(PathBuf::from("/tmp/apps.json")));
    // Unspecified keys keep their defaults.
    assert_eq!(settings.booster_service, "com.webos.booster");
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sam.toml");
    std::fs::write(&path, "socket-dir = [not toml").unwrap();
    assert!(matches!(Settings::load(&path), Err(SettingsError::Parse(_))));
}

#[test]
fn deleted_list_lives_under_state_dir() {
    let settings = Settings::default();
    assert_eq!(
        settings.deleted_list_path(),
        PathBuf::from("/var/lib/sam/deleted-system-apps.json")
    );
}
