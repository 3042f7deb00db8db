// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-journal compaction specs

use crate::prelude::*;

#[test]
fn consumed_messages_are_dropped() {
    let temp = Workspace::empty();
    let journal = temp.journal("kahadb", &mostly_consumed(20, 2));
    let before = journal_bytes(&journal);

    temp.jo()
        .arg("kahadb")
        .passes()
        .stdout_has("38 records")
        .stdout_has("2 live")
        .stdout_has("original journal kept at");

    let after = journal_bytes(&journal);
    assert!(after > 0);
    assert!(after < before, "{} should shrink below {}", after, before);
}

#[test]
fn original_is_kept_as_backup() {
    let temp = Workspace::empty();
    let journal = temp.journal("kahadb", &mostly_consumed(10, 1));
    let original = segment_files(&journal)
        .iter()
        .map(|name| std::fs::read(journal.join(name)).unwrap())
        .collect::<Vec<_>>();

    temp.jo().arg("kahadb").passes();

    let backups = temp.backups_of("kahadb");
    assert_eq!(backups.len(), 1);
    let kept = segment_files(&backups[0])
        .iter()
        .map(|name| std::fs::read(backups[0].join(name)).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(kept, original);
    assert!(!temp.path().join("kahadb_temp").exists());
}

#[test]
fn dry_run_writes_nothing() {
    let temp = Workspace::empty();
    let journal = temp.journal("kahadb", &mostly_consumed(10, 1));
    let before = segment_files(&journal);

    temp.jo()
        .args(["--dry-run", "kahadb"])
        .passes()
        .stdout_has("19 records")
        .stdout_has("dry run: nothing written");

    assert_eq!(segment_files(&journal), before);
    assert!(temp.backups_of("kahadb").is_empty());
    assert!(!temp.path().join("kahadb_temp").exists());
}

#[test]
fn fully_consumed_queue_leaves_nothing_to_keep() {
    let temp = Workspace::empty();
    temp.journal("kahadb", &mostly_consumed(5, 0));

    temp.jo()
        .arg("kahadb")
        .passes()
        .stdout_has("nothing to keep");
    assert_eq!(temp.backups_of("kahadb").len(), 1);
    assert!(segment_files(&temp.path().join("kahadb")).is_empty());
}

#[test]
fn json_report() {
    let temp = Workspace::empty();
    temp.journal("kahadb", &mostly_consumed(4, 1));

    let out = temp.jo().args(["--output", "json", "kahadb"]).passes().stdout();
    assert!(out.contains("\"directories\""), "{}", out);
    assert!(out.contains("\"records\": 7"), "{}", out);
    assert!(out.contains("\"live_messages\": 1"), "{}", out);
    assert!(out.contains("\"backup\""), "{}", out);
}

#[test]
fn config_suffix_names_the_work_directory() {
    let temp = Workspace::empty();
    temp.journal("kahadb", &mostly_consumed(4, 1));
    temp.file("jo.toml", "temp_suffix = \".compacting\"\nforce_sync = false\n");
    temp.file("kahadb.compacting/db-1.log", "stale");

    temp.jo().args(["-c", "jo.toml", "kahadb"]).passes();

    assert!(!temp.path().join("kahadb.compacting").exists());
    assert_eq!(temp.backups_of("kahadb").len(), 1);
}

#[test]
fn log_file_receives_progress() {
    let temp = Workspace::empty();
    temp.journal("kahadb", &mostly_consumed(4, 1));
    temp.file("jo.toml", "log_file = \"logs/jo.log\"\n");

    temp.jo().args(["--config", "jo.toml", "kahadb"]).passes();

    let log = std::fs::read_to_string(temp.path().join("logs/jo.log")).unwrap();
    assert!(!log.is_empty());
}
