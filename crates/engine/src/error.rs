// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for replay and optimization

use jo_core::DecodeError;
use jo_storage::{JournalError, Location};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a replay pass
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("undecodable record at {location}: {source}")]
    Decode {
        location: Location,
        source: DecodeError,
    },
    #[error("record at {location} does not follow {previous}")]
    OutOfOrder {
        location: Location,
        previous: Location,
    },
}

/// Errors that abort optimizing a journal tree
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("journal error in {}: {source}", directory.display())]
    Journal {
        directory: PathBuf,
        source: JournalError,
    },
    #[error("analysis of {} failed: {source}", directory.display())]
    Apply {
        directory: PathBuf,
        source: ApplyError,
    },
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("compacted journal in {} does not replay to the source state", directory.display())]
    VerificationFailed { directory: PathBuf },
    #[error(
        "swap failed: {reason}; original journal at {}, compacted journal at {}",
        original.display(),
        compacted.display()
    )]
    Swap {
        reason: String,
        original: PathBuf,
        compacted: PathBuf,
    },
}

impl OptimizeError {
    pub(crate) fn journal(directory: &std::path::Path) -> impl FnOnce(JournalError) -> Self + '_ {
        move |source| OptimizeError::Journal {
            directory: directory.to_path_buf(),
            source,
        }
    }

    pub(crate) fn io(path: &std::path::Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| OptimizeError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
