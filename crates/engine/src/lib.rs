// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Journal replay and compaction engine

mod compactor;
mod config;
mod error;
pub mod ledger;
mod optimizer;
mod pool;
pub mod tracker;

#[cfg(test)]
mod test_support;

pub use compactor::{compact, CompactionStats};
pub use config::{ConfigError, OptimizerConfig};
pub use error::{ApplyError, OptimizeError};
pub use ledger::{DestinationLedger, MessageRecord, SubscriptionRecord};
pub use optimizer::{analyze, OptimizeReport, Optimizer, Phase, TreeReport};
pub use pool::{DestinationPool, DestinationSnapshot, LiveLocations, PoolSnapshot, ReplayStats};
pub use tracker::TransactionTracker;
