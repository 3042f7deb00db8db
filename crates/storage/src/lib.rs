// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Segmented append-only journal storage

mod error;
mod journal;
mod location;
mod segment;

pub use error::JournalError;
pub use journal::{Journal, JournalIter};
pub use location::Location;
pub use segment::{
    parse_segment_id, segment_file_name, SegmentHeader, DEFAULT_SEGMENT_SIZE, FRAME_HEADER_LEN,
    SEGMENT_HEADER_LEN,
};
