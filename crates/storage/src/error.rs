// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for journal storage

use crate::Location;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing a journal
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupted record at {location}: {reason}")]
    Corrupted { location: Location, reason: String },
    #[error("checksum mismatch at {location}")]
    ChecksumMismatch { location: Location },
    #[error("bad segment header in {}: {reason}", path.display())]
    BadHeader { path: PathBuf, reason: String },
    #[error("segment {0} not found")]
    MissingSegment(u32),
    #[error("journal not started")]
    NotStarted,
    #[error("segment size {0} cannot hold a record")]
    SegmentSizeTooSmall(u32),
    #[error("record of {0} bytes does not fit in a segment")]
    RecordTooLarge(usize),
}
