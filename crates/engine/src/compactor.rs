// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Copy live records into a fresh journal

use crate::pool::LiveLocations;
use jo_storage::{Journal, JournalError};
use serde::Serialize;

/// What a compaction pass copied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompactionStats {
    pub subscriptions: usize,
    pub messages: usize,
    /// Payload bytes copied, excluding frame headers
    pub bytes: u64,
}

/// Append every live record of `source` to `target`, in ascending location order
///
/// Payloads are copied byte for byte. The first read or write error aborts
/// the pass; `source` is only ever read.
pub fn compact(
    source: &Journal,
    target: &mut Journal,
    live: &LiveLocations,
    force_sync: bool,
) -> Result<CompactionStats, JournalError> {
    let mut stats = CompactionStats::default();

    for location in live.merged() {
        let payload = source.read(location)?;
        target.write(&payload, force_sync)?;

        if live.subscriptions.binary_search(&location).is_ok() {
            stats.subscriptions += 1;
        } else {
            stats.messages += 1;
        }
        stats.bytes += payload.len() as u64;
    }

    tracing::debug!(
        source = %source.directory().display(),
        target = %target.directory().display(),
        subscriptions = stats.subscriptions,
        messages = stats.messages,
        bytes = stats.bytes,
        "live records copied"
    );
    Ok(stats)
}

#[cfg(test)]
#[path = "compactor_tests.rs"]
mod tests;
