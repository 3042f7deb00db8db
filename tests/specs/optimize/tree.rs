// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Nested journal specs
//!
//! Brokers keep one journal per store under a common root.

use crate::prelude::*;

#[test]
fn nested_journals_are_compacted() {
    let temp = Workspace::empty();
    temp.journal("kahadb", &mostly_consumed(6, 1));
    let nested = temp.journal("kahadb/store-a", &mostly_consumed(12, 3));
    let nested_before = journal_bytes(&nested);

    temp.jo()
        .arg("kahadb")
        .passes()
        .stdout_has("11 records")
        .stdout_has("21 records");

    let nested_after = journal_bytes(&temp.path().join("kahadb/store-a"));
    assert!(nested_after < nested_before);
}

#[test]
fn non_segment_files_stay_in_backup() {
    let temp = Workspace::empty();
    temp.journal("kahadb", &mostly_consumed(4, 1));
    temp.file("kahadb/db.data", "index");
    temp.file("kahadb/lock", "");

    temp.jo().arg("kahadb").passes();

    assert!(!temp.path().join("kahadb/db.data").exists());
    let backups = temp.backups_of("kahadb");
    assert!(backups[0].join("db.data").is_file());
    assert!(backups[0].join("lock").is_file());
}

#[test]
fn non_recursive_copies_subdirectories_verbatim() {
    let temp = Workspace::empty();
    temp.journal("kahadb", &mostly_consumed(4, 1));
    let nested = temp.journal("kahadb/store-a", &mostly_consumed(8, 1));
    let nested_files = segment_files(&nested);
    let nested_bytes = journal_bytes(&nested);
    temp.file("jo.toml", "recursive = false\n");

    temp.jo()
        .args(["--config", "jo.toml", "kahadb"])
        .passes()
        .stdout_has("7 records");

    let copied = temp.path().join("kahadb/store-a");
    assert_eq!(segment_files(&copied), nested_files);
    assert_eq!(journal_bytes(&copied), nested_bytes);
}

#[test]
fn dry_run_reports_every_directory() {
    let temp = Workspace::empty();
    temp.journal("kahadb", &drained_topic());
    temp.journal("kahadb/store-a", &mostly_consumed(2, 0));
    temp.journal("kahadb/store-b", &mostly_consumed(3, 3));

    let out = temp.jo().args(["--dry-run", "kahadb"]).passes().stdout();
    assert_eq!(out.lines().count(), 4, "{}", out);
    assert!(out.contains("store-a"));
    assert!(out.contains("store-b"));
}
