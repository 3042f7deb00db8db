// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Segment files and record framing
//!
//! A segment is `db-<id>.log`: a 12-byte header followed by frames.
//! Each frame is `payload_len: u32 LE`, `crc32(payload): u32 LE`, payload.

use crate::{JournalError, Location};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

pub const SEGMENT_MAGIC: [u8; 4] = *b"JOJL";
pub const FORMAT_VERSION: u32 = 1;
pub const SEGMENT_HEADER_LEN: u32 = 12;
pub const FRAME_HEADER_LEN: u32 = 8;

/// Segment length used when a journal carries no segment to measure (32 MiB)
pub const DEFAULT_SEGMENT_SIZE: u32 = 32 * 1024 * 1024;

pub fn segment_file_name(id: u32) -> String {
    format!("db-{}.log", id)
}

/// Segment id encoded in a file name, if it names a segment
pub fn parse_segment_id(name: &str) -> Option<u32> {
    name.strip_prefix("db-")?
        .strip_suffix(".log")?
        .parse()
        .ok()
}

/// Fixed header at the start of every segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentHeader {
    pub version: u32,
    /// Maximum segment length the writer was configured with
    pub max_length: u32,
}

impl SegmentHeader {
    pub fn new(max_length: u32) -> Self {
        Self {
            version: FORMAT_VERSION,
            max_length,
        }
    }

    pub fn encode(&self) -> [u8; SEGMENT_HEADER_LEN as usize] {
        let mut out = [0u8; SEGMENT_HEADER_LEN as usize];
        out[..4].copy_from_slice(&SEGMENT_MAGIC);
        out[4..8].copy_from_slice(&self.version.to_le_bytes());
        out[8..].copy_from_slice(&self.max_length.to_le_bytes());
        out
    }

    /// Read and validate the header of an open segment
    pub fn read_from(reader: &mut impl Read, path: &Path) -> Result<Self, JournalError> {
        let mut buf = [0u8; SEGMENT_HEADER_LEN as usize];
        reader.read_exact(&mut buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => JournalError::BadHeader {
                path: path.to_path_buf(),
                reason: "file shorter than segment header".to_string(),
            },
            _ => JournalError::Io(e),
        })?;

        if buf[..4] != SEGMENT_MAGIC {
            return Err(JournalError::BadHeader {
                path: path.to_path_buf(),
                reason: "bad magic".to_string(),
            });
        }

        let version = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
        if version != FORMAT_VERSION {
            return Err(JournalError::BadHeader {
                path: path.to_path_buf(),
                reason: format!("unsupported version {}", version),
            });
        }

        let max_length = u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);
        Ok(Self {
            version,
            max_length,
        })
    }

    pub fn read(path: &Path) -> Result<Self, JournalError> {
        let mut file = File::open(path)?;
        Self::read_from(&mut file, path)
    }
}

/// Segment files in a directory, ordered by id
pub(crate) fn list_segments(directory: &Path) -> Result<Vec<(u32, PathBuf)>, JournalError> {
    let entries = match std::fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut segments = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if let Some(id) = name.to_str().and_then(parse_segment_id) {
            segments.push((id, entry.path()));
        }
    }
    segments.sort_by_key(|(id, _)| *id);
    Ok(segments)
}

/// Read the frame at `offset`, given the segment's total length
///
/// The reader must be positioned at `offset`.
pub(crate) fn read_frame(
    reader: &mut impl Read,
    segment: u32,
    offset: u32,
    segment_len: u64,
) -> Result<(Location, Vec<u8>), JournalError> {
    let remaining = segment_len.saturating_sub(u64::from(offset));
    if remaining < u64::from(FRAME_HEADER_LEN) {
        return Err(JournalError::Corrupted {
            location: Location::new(segment, offset, 0),
            reason: format!("truncated frame header ({} bytes)", remaining),
        });
    }

    let mut header = [0u8; FRAME_HEADER_LEN as usize];
    reader.read_exact(&mut header)?;
    let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let checksum = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    let location = Location::new(segment, offset, length);

    if remaining - u64::from(FRAME_HEADER_LEN) < u64::from(length) {
        return Err(JournalError::Corrupted {
            location,
            reason: format!(
                "truncated payload: {} bytes declared, {} available",
                length,
                remaining - u64::from(FRAME_HEADER_LEN)
            ),
        });
    }

    let mut payload = vec![0u8; length as usize];
    reader.read_exact(&mut payload)?;

    if crc32fast::hash(&payload) != checksum {
        return Err(JournalError::ChecksumMismatch { location });
    }

    Ok((location, payload))
}

/// Encode a frame for `payload`
pub(crate) fn frame(payload: &[u8]) -> Result<Vec<u8>, JournalError> {
    let length =
        u32::try_from(payload.len()).map_err(|_| JournalError::RecordTooLarge(payload.len()))?;
    let mut out = Vec::with_capacity(FRAME_HEADER_LEN as usize + payload.len());
    out.extend_from_slice(&length.to_le_bytes());
    out.extend_from_slice(&crc32fast::hash(payload).to_le_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}

#[cfg(test)]
#[path = "segment_tests.rs"]
mod tests;
