// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal record addresses

use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of one record: segment id, frame offset and payload length
///
/// Locations order by segment, then offset. Two records never share a
/// segment and offset, so `length` only breaks ties that cannot occur.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Location {
    pub segment: u32,
    pub offset: u32,
    pub length: u32,
}

impl Location {
    pub fn new(segment: u32, offset: u32, length: u32) -> Self {
        Self {
            segment,
            offset,
            length,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.segment, self.offset)
    }
}
