// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error reporting specs
//!
//! Every failure exits with status 1 and a message on stderr.

use crate::prelude::*;

#[test]
fn missing_directory_argument() {
    Workspace::empty().jo().fails().stderr_has("Usage");
}

#[test]
fn unknown_flag() {
    Workspace::empty()
        .jo()
        .args(["--frobnicate", "kahadb"])
        .fails()
        .stderr_has("--frobnicate");
}

#[test]
fn nonexistent_directory() {
    Workspace::empty()
        .jo()
        .arg("does-not-exist")
        .fails()
        .stderr_has("error:");
}

#[test]
fn file_instead_of_directory() {
    let temp = Workspace::empty();
    temp.file("kahadb", "not a journal");

    temp.jo().arg("kahadb").fails().stderr_has("error:");
}

#[test]
fn invalid_config_file() {
    let temp = Workspace::empty();
    temp.journal("kahadb", &mostly_consumed(3, 1));
    temp.file("jo.toml", "temp_suffix = \"\"\n");

    temp.jo()
        .args(["--config", "jo.toml", "kahadb"])
        .fails()
        .stderr_has("jo.toml");
    assert!(temp.backups_of("kahadb").is_empty());
}

#[test]
fn corrupt_segment_leaves_journal_untouched() {
    let temp = Workspace::empty();
    let journal = temp.journal("kahadb", &mostly_consumed(3, 1));
    let segment = journal.join(&segment_files(&journal)[0]);
    let mut bytes = std::fs::read(&segment).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    std::fs::write(&segment, &bytes).unwrap();

    temp.jo().arg("kahadb").fails().stderr_has("error:");

    assert_eq!(std::fs::read(&segment).unwrap(), bytes);
    assert!(temp.backups_of("kahadb").is_empty());
    assert!(!temp.path().join("kahadb_temp").exists());
}
