// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal: an ordered set of segment files in one directory
//!
//! Writes append to the newest segment and roll to a fresh one when the
//! next frame would overflow the configured segment size. Reads address
//! records by [`Location`], or walk the whole journal forward with
//! [`JournalIter`]. Any truncated or checksum-failing frame is an error:
//! the journal never skips over damage.

use crate::segment::{self, list_segments, read_frame, segment_file_name, SegmentHeader};
use crate::{JournalError, Location, FRAME_HEADER_LEN, SEGMENT_HEADER_LEN};
use std::collections::{BTreeMap, VecDeque};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Seek, SeekFrom, Write};
use std::ops::Bound;
use std::path::{Path, PathBuf};

/// Segment currently receiving appends
struct ActiveSegment {
    id: u32,
    file: File,
    length: u64,
}

/// Segmented append-only journal
pub struct Journal {
    directory: PathBuf,
    segment_size: u32,
    segments: BTreeMap<u32, PathBuf>,
    started: bool,
    writer: Option<ActiveSegment>,
}

impl Journal {
    /// Prepare a journal over `directory`; nothing is touched until [`Journal::start`]
    pub fn open(directory: &Path, segment_size: u32) -> Result<Self, JournalError> {
        if segment_size < SEGMENT_HEADER_LEN + FRAME_HEADER_LEN {
            return Err(JournalError::SegmentSizeTooSmall(segment_size));
        }

        Ok(Self {
            directory: directory.to_path_buf(),
            segment_size,
            segments: BTreeMap::new(),
            started: false,
            writer: None,
        })
    }

    /// Create the directory if needed and index its segments
    pub fn start(&mut self) -> Result<(), JournalError> {
        std::fs::create_dir_all(&self.directory)?;

        self.segments.clear();
        for (id, path) in list_segments(&self.directory)? {
            SegmentHeader::read(&path)?;
            self.segments.insert(id, path);
        }
        self.started = true;

        tracing::debug!(
            directory = %self.directory.display(),
            segments = self.segments.len(),
            "journal started"
        );
        Ok(())
    }

    /// Flush and release the active segment
    pub fn close(&mut self) -> Result<(), JournalError> {
        if let Some(active) = self.writer.take() {
            active.file.sync_all()?;
        }
        self.started = false;
        Ok(())
    }

    /// Maximum segment length recorded by the first segment in `directory`
    ///
    /// Returns `None` when the directory holds no segments.
    pub fn detect_segment_size(directory: &Path) -> Result<Option<u32>, JournalError> {
        match list_segments(directory)?.first() {
            Some((_, path)) => Ok(Some(SegmentHeader::read(path)?.max_length)),
            None => Ok(None),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn segment_size(&self) -> u32 {
        self.segment_size
    }

    pub fn list_segment_files(&self) -> Vec<PathBuf> {
        self.segments.values().cloned().collect()
    }

    pub fn total_disk_size(&self) -> Result<u64, JournalError> {
        let mut total = 0;
        for path in self.segments.values() {
            total += std::fs::metadata(path)?.len();
        }
        Ok(total)
    }

    /// Location of the record following `prev`, or of the first record
    ///
    /// Returns `None` past the last record.
    pub fn next_location(&self, prev: Option<Location>) -> Result<Option<Location>, JournalError> {
        self.ensure_started()?;

        let (mut segment, mut offset) = match prev {
            Some(loc) => {
                let next =
                    u64::from(loc.offset) + u64::from(FRAME_HEADER_LEN) + u64::from(loc.length);
                let next = u32::try_from(next).map_err(|_| JournalError::Corrupted {
                    location: loc,
                    reason: "offset overflow".to_string(),
                })?;
                (loc.segment, next)
            }
            None => match self.segments.keys().next() {
                Some(&first) => (first, SEGMENT_HEADER_LEN),
                None => return Ok(None),
            },
        };

        loop {
            let path = self
                .segments
                .get(&segment)
                .ok_or(JournalError::MissingSegment(segment))?;
            let mut file = File::open(path)?;
            let len = file.metadata()?.len();

            if u64::from(offset) < len {
                file.seek(SeekFrom::Start(u64::from(offset)))?;
                let (location, _) = read_frame(&mut BufReader::new(file), segment, offset, len)?;
                return Ok(Some(location));
            }

            match self
                .segments
                .range((Bound::Excluded(segment), Bound::Unbounded))
                .next()
            {
                Some((&next, _)) => {
                    segment = next;
                    offset = SEGMENT_HEADER_LEN;
                }
                None => return Ok(None),
            }
        }
    }

    /// Read the payload stored at `location`
    pub fn read(&self, location: Location) -> Result<Vec<u8>, JournalError> {
        self.ensure_started()?;

        let path = self
            .segments
            .get(&location.segment)
            .ok_or(JournalError::MissingSegment(location.segment))?;
        let mut file = File::open(path)?;
        let len = file.metadata()?.len();
        file.seek(SeekFrom::Start(u64::from(location.offset)))?;

        let (found, payload) =
            read_frame(&mut BufReader::new(file), location.segment, location.offset, len)?;
        if found.length != location.length {
            return Err(JournalError::Corrupted {
                location,
                reason: format!(
                    "expected {} payload bytes, frame holds {}",
                    location.length, found.length
                ),
            });
        }
        Ok(payload)
    }

    /// Append a record, rolling to a new segment when the current one is full
    pub fn write(&mut self, payload: &[u8], force_sync: bool) -> Result<Location, JournalError> {
        self.ensure_started()?;

        let frame = segment::frame(payload)?;
        let frame_len = frame.len() as u64;

        if self.writer.is_none() {
            let tail = self.open_tail()?;
            self.writer = Some(tail);
        }

        // A lone oversize record still gets a segment of its own
        let roll_to = self
            .writer
            .as_ref()
            .filter(|active| {
                active.length > u64::from(SEGMENT_HEADER_LEN)
                    && active.length + frame_len > u64::from(self.segment_size)
            })
            .map(|active| active.id + 1);
        if let Some(id) = roll_to {
            if let Some(full) = self.writer.take() {
                full.file.sync_all()?;
            }
            let next = self.create_segment(id)?;
            self.writer = Some(next);
        }

        let active = self.writer.as_mut().ok_or(JournalError::NotStarted)?;
        let offset =
            u32::try_from(active.length).map_err(|_| JournalError::RecordTooLarge(payload.len()))?;
        active.file.write_all(&frame)?;
        if force_sync {
            active.file.sync_data()?;
        }
        active.length += frame_len;

        Ok(Location::new(active.id, offset, payload.len() as u32))
    }

    /// Forward iterator over every record, in location order
    pub fn records(&self) -> Result<JournalIter, JournalError> {
        self.ensure_started()?;
        Ok(JournalIter::new(
            self.segments
                .iter()
                .map(|(id, path)| (*id, path.clone()))
                .collect(),
        ))
    }

    fn ensure_started(&self) -> Result<(), JournalError> {
        if self.started {
            Ok(())
        } else {
            Err(JournalError::NotStarted)
        }
    }

    fn open_tail(&mut self) -> Result<ActiveSegment, JournalError> {
        let tail = self
            .segments
            .iter()
            .next_back()
            .map(|(id, path)| (*id, path.clone()));
        match tail {
            Some((id, path)) => {
                let file = OpenOptions::new().append(true).open(&path)?;
                let length = file.metadata()?.len();
                Ok(ActiveSegment { id, file, length })
            }
            None => self.create_segment(1),
        }
    }

    fn create_segment(&mut self, id: u32) -> Result<ActiveSegment, JournalError> {
        let path = self.directory.join(segment_file_name(id));
        let mut file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&path)?;
        file.write_all(&SegmentHeader::new(self.segment_size).encode())?;

        tracing::debug!(segment = id, path = %path.display(), "created segment");
        self.segments.insert(id, path);

        Ok(ActiveSegment {
            id,
            file,
            length: u64::from(SEGMENT_HEADER_LEN),
        })
    }
}

/// Segment being read by [`JournalIter`]
struct OpenSegment {
    id: u32,
    reader: BufReader<File>,
    offset: u32,
    len: u64,
}

impl OpenSegment {
    fn open(id: u32, path: &Path) -> Result<Self, JournalError> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        SegmentHeader::read_from(&mut reader, path)?;

        Ok(Self {
            id,
            reader,
            offset: SEGMENT_HEADER_LEN,
            len,
        })
    }
}

/// Iterator over `(Location, payload)` pairs
///
/// Yields the first error it meets and then stops.
pub struct JournalIter {
    pending: VecDeque<(u32, PathBuf)>,
    current: Option<OpenSegment>,
    done: bool,
}

impl JournalIter {
    fn new(pending: VecDeque<(u32, PathBuf)>) -> Self {
        Self {
            pending,
            current: None,
            done: false,
        }
    }

    fn advance(&mut self) -> Result<Option<(Location, Vec<u8>)>, JournalError> {
        loop {
            if self.current.is_none() {
                match self.pending.pop_front() {
                    Some((id, path)) => self.current = Some(OpenSegment::open(id, &path)?),
                    None => return Ok(None),
                }
            }
            let Some(segment) = self.current.as_mut() else {
                return Ok(None);
            };

            if u64::from(segment.offset) >= segment.len {
                self.current = None;
                continue;
            }

            let (location, payload) =
                read_frame(&mut segment.reader, segment.id, segment.offset, segment.len)?;
            let next = u64::from(segment.offset)
                + u64::from(FRAME_HEADER_LEN)
                + u64::from(location.length);
            segment.offset = u32::try_from(next).map_err(|_| JournalError::Corrupted {
                location,
                reason: "offset overflow".to_string(),
            })?;

            return Ok(Some((location, payload)));
        }
    }
}

impl Iterator for JournalIter {
    type Item = Result<(Location, Vec<u8>), JournalError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
