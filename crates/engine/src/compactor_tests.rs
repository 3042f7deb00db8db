// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{open_journal, replay, write_journal, SMALL_SEGMENT};
use jo_core::{AddMessage, DestinationId, JournalCommand, RemoveMessage, Subscription};
use tempfile::TempDir;

fn queue() -> DestinationId {
    DestinationId::queue("orders")
}

fn topic() -> DestinationId {
    DestinationId::topic("prices")
}

fn compact_into(source_dir: &std::path::Path, target_dir: &std::path::Path) -> CompactionStats {
    let source = open_journal(source_dir);
    let pool = replay(source_dir);
    let mut target = Journal::open(target_dir, SMALL_SEGMENT).unwrap();
    target.start().unwrap();
    let stats = compact(&source, &mut target, &pool.live_locations(), false).unwrap();
    target.close().unwrap();
    stats
}

fn payloads(dir: &std::path::Path) -> Vec<Vec<u8>> {
    open_journal(dir)
        .records()
        .unwrap()
        .map(|r| r.unwrap().1)
        .collect()
}

#[test]
fn copies_only_live_records_in_order() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source");
    let target = dir.path().join("target");

    let commands: Vec<JournalCommand> = vec![
        AddMessage::new(queue(), "m1").into(),
        Subscription::subscribe(topic(), "s1", false).into(),
        AddMessage::new(queue(), "m2").into(),
        RemoveMessage::new(queue(), "m1").into(),
        JournalCommand::trace("checkpoint"),
        AddMessage::new(topic(), "t1").with_body("tick").into(),
    ];
    write_journal(&source, SMALL_SEGMENT, &commands);

    let stats = compact_into(&source, &target);
    assert_eq!(stats.subscriptions, 1);
    assert_eq!(stats.messages, 2);

    let expected: Vec<Vec<u8>> = [1, 2, 5]
        .iter()
        .map(|&i| jo_core::encode(&commands[i]).unwrap())
        .collect();
    assert_eq!(payloads(&target), expected);
    assert_eq!(
        stats.bytes,
        expected.iter().map(|p| p.len() as u64).sum::<u64>()
    );
}

#[test]
fn empty_live_set_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source");
    let target = dir.path().join("target");
    write_journal(
        &source,
        SMALL_SEGMENT,
        &[
            AddMessage::new(queue(), "m1").into(),
            RemoveMessage::new(queue(), "m1").into(),
        ],
    );

    let stats = compact_into(&source, &target);
    assert_eq!(stats, CompactionStats::default());
    assert!(open_journal(&target).list_segment_files().is_empty());
}

#[test]
fn compacted_journal_replays_to_same_state() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source");
    let target = dir.path().join("target");

    let mut commands: Vec<JournalCommand> = vec![
        Subscription::subscribe(topic(), "s1", false).into(),
        Subscription::subscribe(topic(), "s2", false).into(),
    ];
    for i in 0..20 {
        commands.push(AddMessage::new(topic(), format!("m{i}")).into());
        commands.push(RemoveMessage::new(topic(), format!("m{i}")).acked_by("s1").into());
        if i % 2 == 0 {
            commands.push(RemoveMessage::new(topic(), format!("m{i}")).acked_by("s2").into());
        }
    }
    write_journal(&source, SMALL_SEGMENT, &commands);

    compact_into(&source, &target);
    assert_eq!(replay(&target).snapshot(), replay(&source).snapshot());
    assert_eq!(replay(&target).snapshot().message_count(), 10);
    assert!(open_journal(&target).total_disk_size().unwrap()
        < open_journal(&source).total_disk_size().unwrap());
}

#[test]
fn missing_source_record_aborts() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source");
    let target = dir.path().join("target");
    write_journal(&source, SMALL_SEGMENT, &[AddMessage::new(queue(), "m1").into()]);

    let journal = open_journal(&source);
    let mut out = Journal::open(&target, SMALL_SEGMENT).unwrap();
    out.start().unwrap();
    let live = LiveLocations {
        subscriptions: Vec::new(),
        messages: vec![jo_storage::Location::new(9, 12, 4)],
    };

    let err = compact(&journal, &mut out, &live, false).unwrap_err();
    assert!(matches!(err, JournalError::MissingSegment(9)));
}
