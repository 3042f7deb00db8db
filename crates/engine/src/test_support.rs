// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal builders shared by the engine's unit tests

use crate::pool::DestinationPool;
use jo_core::JournalCommand;
use jo_storage::{Journal, Location};
use std::path::Path;

/// Small segments so multi-segment journals show up in short tests
pub const SMALL_SEGMENT: u32 = 256;

/// Write `commands` to a new journal in `dir`, returning their locations
pub fn write_journal(dir: &Path, segment_size: u32, commands: &[JournalCommand]) -> Vec<Location> {
    let mut journal = Journal::open(dir, segment_size).unwrap();
    journal.start().unwrap();
    let locations = commands
        .iter()
        .map(|command| journal.write(&jo_core::encode(command).unwrap(), false).unwrap())
        .collect();
    journal.close().unwrap();
    locations
}

/// Open an existing journal for reading
pub fn open_journal(dir: &Path) -> Journal {
    let size = Journal::detect_segment_size(dir)
        .unwrap()
        .unwrap_or(SMALL_SEGMENT);
    let mut journal = Journal::open(dir, size).unwrap();
    journal.start().unwrap();
    journal
}

/// Replay every record in `dir` and collect unresolved transactions
pub fn replay(dir: &Path) -> DestinationPool {
    let journal = open_journal(dir);
    let mut pool = DestinationPool::new();
    for record in journal.records().unwrap() {
        let (location, payload) = record.unwrap();
        pool.apply_record(&payload, location).unwrap();
    }
    pool.gc();
    pool
}
