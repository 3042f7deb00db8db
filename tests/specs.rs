// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Behavioral specifications for the jo CLI.
//!
//! These tests are black-box: they build journals on disk, invoke the CLI
//! binary, and verify stdout, stderr, exit codes, and the resulting tree.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

// cli/
#[path = "specs/cli/errors.rs"]
mod cli_errors;
#[path = "specs/cli/help.rs"]
mod cli_help;

// optimize/
#[path = "specs/optimize/compaction.rs"]
mod optimize_compaction;
#[path = "specs/optimize/tree.rs"]
mod optimize_tree;
