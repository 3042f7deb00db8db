// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the CLI specs

use assert_cmd::Command;
use jo_core::{AddMessage, DestinationId, JournalCommand, RemoveMessage, Subscription};
use jo_storage::Journal;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub use predicates::prelude::*;

/// Segment size for fixture journals; small enough to span several segments
pub const SEGMENT_SIZE: u32 = 512;

/// A scratch directory holding one or more journals
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `commands` as a journal at `relative`
    pub fn journal(&self, relative: &str, commands: &[JournalCommand]) -> PathBuf {
        let directory = self.path().join(relative);
        std::fs::create_dir_all(&directory).unwrap();
        let mut journal = Journal::open(&directory, SEGMENT_SIZE).unwrap();
        journal.start().unwrap();
        for command in commands {
            journal.write(&jo_core::encode(command).unwrap(), false).unwrap();
        }
        journal.close().unwrap();
        directory
    }

    /// Write a plain file at `relative`
    pub fn file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Sibling directories whose names start with `prefix`, excluding `prefix` itself
    pub fn backups_of(&self, prefix: &str) -> Vec<PathBuf> {
        let mut found: Vec<_> = std::fs::read_dir(self.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| {
                let name = path.file_name().unwrap().to_string_lossy().into_owned();
                name.starts_with(&format!("{}_", prefix))
            })
            .collect();
        found.sort();
        found
    }

    pub fn jo(&self) -> Run {
        let mut command = Command::cargo_bin("jo").unwrap();
        command.current_dir(self.path()).env_remove("JO_LOG");
        Run { command }
    }
}

/// Command builder with readable assertions
pub struct Run {
    command: Command,
}

impl Run {
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.command.args(args);
        self
    }

    pub fn arg(mut self, arg: impl AsRef<std::ffi::OsStr>) -> Self {
        self.command.arg(arg);
        self
    }

    pub fn passes(mut self) -> Outcome {
        Outcome {
            assert: self.command.assert().success(),
        }
    }

    pub fn fails(mut self) -> Outcome {
        Outcome {
            assert: self.command.assert().failure().code(1),
        }
    }
}

pub struct Outcome {
    assert: assert_cmd::assert::Assert,
}

impl Outcome {
    pub fn stdout_has(self, needle: &str) -> Self {
        Self {
            assert: self.assert.stdout(predicate::str::contains(needle)),
        }
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        Self {
            assert: self.assert.stderr(predicate::str::contains(needle)),
        }
    }

    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.assert.get_output().stdout).into_owned()
    }
}

/// Names of the segment files in `directory`, sorted
pub fn segment_files(directory: &Path) -> Vec<String> {
    let mut names: Vec<_> = std::fs::read_dir(directory)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("db-") && name.ends_with(".log"))
        .collect();
    names.sort();
    names
}

/// Total bytes of the segment files in `directory`
pub fn journal_bytes(directory: &Path) -> u64 {
    segment_files(directory)
        .iter()
        .map(|name| std::fs::metadata(directory.join(name)).unwrap().len())
        .sum()
}

pub fn queue() -> DestinationId {
    DestinationId::queue("orders")
}

pub fn topic() -> DestinationId {
    DestinationId::topic("prices")
}

/// Many queue messages, all but `keep` of them consumed
pub fn mostly_consumed(count: usize, keep: usize) -> Vec<JournalCommand> {
    let mut commands = Vec::new();
    for i in 0..count {
        commands.push(AddMessage::new(queue(), format!("m{}", i)).with_body(vec![b'x'; 48]).into());
    }
    for i in keep..count {
        commands.push(RemoveMessage::new(queue(), format!("m{}", i)).into());
    }
    commands
}

/// A topic with one durable subscriber that has acked everything
pub fn drained_topic() -> Vec<JournalCommand> {
    vec![
        Subscription::subscribe(topic(), "sub-1", false).into(),
        AddMessage::new(topic(), "t1").into(),
        RemoveMessage::new(topic(), "t1").acked_by("sub-1").into(),
    ]
}
