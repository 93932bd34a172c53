// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn locales() -> Vec<String> {
    vec!["ko-KR".to_string(), "ko".to_string(), "en".to_string()]
}

#[test]
fn dollar_ref_prefers_most_specific_locale() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path();
    std::fs::create_dir_all(folder.join("resources/ko/assets")).unwrap();
    std::fs::create_dir_all(folder.join("resources/en/assets")).unwrap();
    std::fs::write(folder.join("resources/ko/assets/icon.png"), b"ko").unwrap();
    std::fs::write(folder.join("resources/en/assets/icon.png"), b"en").unwrap();

    let resolved = localize_asset(folder, "$assets/icon.png", &locales());
    assert_eq!(resolved, folder.join("resources/ko/assets/icon.png"));
}

#[test]
fn dollar_ref_falls_back_to_package_folder() {
    let dir = tempfile::tempdir().unwrap();
    let resolved = localize_asset(dir.path(), "$assets/icon.png", &locales());
    assert_eq!(resolved, dir.path().join("assets/icon.png"));
}

#[test]
fn plain_relative_ref_joins_folder() {
    let folder = Path::new("/apps/com.example.web");
    let resolved = localize_asset(folder, "index.html", &locales());
    assert_eq!(resolved, PathBuf::from("/apps/com.example.web/index.html"));
}

#[test]
fn absolute_ref_is_untouched() {
    let folder = Path::new("/apps/com.example.web");
    let resolved = localize_asset(folder, "/usr/bin/app", &locales());
    assert_eq!(resolved, PathBuf::from("/usr/bin/app"));
}
