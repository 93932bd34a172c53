// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    full = { "2.3.4", AppVersion::new(2, 3, 4) },
    missing_micro = { "2.3", AppVersion::new(2, 3, 0) },
    major_only = { "7", AppVersion::new(7, 0, 0) },
    garbage = { "not-a-version", AppVersion::new(1, 0, 0) },
    empty = { "", AppVersion::new(1, 0, 0) },
    trailing_garbage = { "3.x.9", AppVersion::new(3, 0, 9) },
    padded = { " 1.2.3 ", AppVersion::new(1, 2, 3) },
)]
fn parse(input: &str, expected: AppVersion) {
    assert_eq!(AppVersion::parse(input), expected);
}

#[test]
fn ordering_is_lexicographic() {
    assert!(AppVersion::new(2, 0, 0) > AppVersion::new(1, 9, 9));
    assert!(AppVersion::new(1, 2, 0) > AppVersion::new(1, 1, 9));
    assert!(AppVersion::new(1, 1, 2) > AppVersion::new(1, 1, 1));
    assert_eq!(AppVersion::new(1, 1, 1), AppVersion::parse("1.1.1"));
}

#[test]
fn display_round_trips() {
    let v = AppVersion::new(4, 5, 6);
    assert_eq!(AppVersion::parse(&v.to_string()), v);
}
