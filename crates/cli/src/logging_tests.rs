// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    absolute = { "/var/log/jo/run.log", "/var/log/jo", "run.log" },
    relative = { "logs/jo.log", "logs", "jo.log" },
    bare_name = { "jo.log", ".", "jo.log" },
)]
fn log_path_is_split(path: &str, directory: &str, file_name: &str) {
    let (dir, name) = split_log_path(Path::new(path)).unwrap();
    assert_eq!(dir, PathBuf::from(directory));
    assert_eq!(name, OsString::from(file_name));
}

#[test]
fn log_path_without_file_name_is_rejected() {
    assert!(split_log_path(Path::new("/")).is_err());
}
