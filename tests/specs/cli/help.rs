// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Help and version specs

use crate::prelude::*;

#[test]
fn help_describes_usage() {
    Workspace::empty()
        .jo()
        .arg("--help")
        .passes()
        .stdout_has("Usage")
        .stdout_has("--dry-run");
}

#[test]
fn version_prints_name() {
    Workspace::empty().jo().arg("--version").passes().stdout_has("jo ");
}

#[test]
fn completions_for_bash() {
    Workspace::empty()
        .jo()
        .args(["--completions", "bash"])
        .passes()
        .stdout_has("_jo");
}
