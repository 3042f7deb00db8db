// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Optimizer orchestration
//!
//! A run walks a journal tree through linear phases:
//! Initialize, Analyze, Compact, Verify and Swap. Every directory in the
//! tree is analyzed and compacted into a mirrored working tree next to the
//! source; only when all of them succeed is the working tree swapped into
//! place, once, at the root. The source is never written to.

use crate::compactor::{compact, CompactionStats};
use crate::config::OptimizerConfig;
use crate::error::OptimizeError;
use crate::pool::DestinationPool;
use jo_storage::{parse_segment_id, Journal};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Steps of an optimizer run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Initialize,
    Analyze,
    Compact,
    Verify,
    Swap,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Initialize => "initialize",
            Phase::Analyze => "analyze",
            Phase::Compact => "compact",
            Phase::Verify => "verify",
            Phase::Swap => "swap",
        };
        f.write_str(name)
    }
}

/// Outcome for one journal directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptimizeReport {
    pub directory: PathBuf,
    pub records: u64,
    pub kinds: BTreeMap<&'static str, u64>,
    pub violations: u64,
    pub topics: usize,
    pub queues: usize,
    pub prepared: usize,
    pub committed: usize,
    pub live_subscriptions: usize,
    pub live_messages: usize,
    pub source_bytes: u64,
    /// Size of the compacted journal; absent on a dry run
    pub target_bytes: Option<u64>,
    pub compaction: Option<CompactionStats>,
    /// Nothing live remained, so no records were copied
    pub skipped: bool,
}

impl OptimizeReport {
    fn new(directory: &Path, pool: &DestinationPool, source_bytes: u64) -> Self {
        let live = pool.live_locations();
        let stats = pool.stats();
        Self {
            directory: directory.to_path_buf(),
            records: stats.records,
            kinds: stats.by_kind.clone(),
            violations: stats.violations,
            topics: pool.topic_count(),
            queues: pool.queue_count(),
            prepared: pool.prepared_count(),
            committed: pool.committed_count(),
            live_subscriptions: live.subscriptions.len(),
            live_messages: live.messages.len(),
            source_bytes,
            target_bytes: None,
            compaction: None,
            skipped: false,
        }
    }

    pub fn bytes_reclaimed(&self) -> u64 {
        self.target_bytes
            .map_or(0, |target| self.source_bytes.saturating_sub(target))
    }
}

impl fmt::Display for OptimizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} records, {} topics, {} queues, {} live",
            self.directory.display(),
            self.records,
            self.topics,
            self.queues,
            self.live_subscriptions + self.live_messages,
        )?;
        match self.target_bytes {
            _ if self.skipped => write!(f, ", nothing to keep"),
            Some(target) => write!(f, ", {} -> {} bytes", self.source_bytes, target),
            None => write!(f, ", {} bytes", self.source_bytes),
        }
    }
}

/// Outcome for a whole tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeReport {
    pub directories: Vec<OptimizeReport>,
    /// Where the original tree was moved; absent on a dry run
    pub backup: Option<PathBuf>,
}

impl TreeReport {
    pub fn records(&self) -> u64 {
        self.directories.iter().map(|d| d.records).sum()
    }

    pub fn bytes_reclaimed(&self) -> u64 {
        self.directories.iter().map(|d| d.bytes_reclaimed()).sum()
    }
}

impl fmt::Display for TreeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for directory in &self.directories {
            writeln!(f, "{}", directory)?;
        }
        match &self.backup {
            Some(backup) => write!(f, "original journal kept at {}", backup.display()),
            None => write!(f, "dry run: nothing written"),
        }
    }
}

/// Replay every record of `journal` and drop unresolved transactions
pub fn analyze(journal: &Journal) -> Result<DestinationPool, OptimizeError> {
    let directory = journal.directory();
    let mut pool = DestinationPool::new();

    for record in journal.records().map_err(OptimizeError::journal(directory))? {
        let (location, payload) = record.map_err(OptimizeError::journal(directory))?;
        pool.apply_record(&payload, location)
            .map_err(|source| OptimizeError::Apply {
                directory: directory.to_path_buf(),
                source,
            })?;
    }
    pool.gc();
    Ok(pool)
}

pub struct Optimizer {
    config: OptimizerConfig,
    dry_run: bool,
}

impl Optimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self {
            config,
            dry_run: false,
        }
    }

    /// Analyze only; create and swap nothing
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Working directory a run on `source` compacts into
    pub fn target_dir(&self, source: &Path) -> Result<PathBuf, OptimizeError> {
        sibling(source, &self.config.temp_suffix)
    }

    /// Optimize the journal tree rooted at `source`
    pub fn optimize(&self, source: &Path) -> Result<TreeReport, OptimizeError> {
        if !source.is_dir() {
            return Err(OptimizeError::NotADirectory(source.to_path_buf()));
        }
        let source = std::fs::canonicalize(source).map_err(OptimizeError::io(source))?;

        if self.dry_run {
            let mut directories = Vec::new();
            self.optimize_dir(&source, None, &mut directories)?;
            return Ok(TreeReport {
                directories,
                backup: None,
            });
        }

        let target = self.target_dir(&source)?;
        self.initialize(&target)?;

        let mut directories = Vec::new();
        if let Err(e) = self.optimize_dir(&source, Some(&target), &mut directories) {
            discard(&target);
            return Err(e);
        }

        let backup = swap(&source, &target)?;
        tracing::info!(
            phase = %Phase::Swap,
            directory = %source.display(),
            backup = %backup.display(),
            "journal tree replaced"
        );

        let report = TreeReport {
            directories,
            backup: Some(backup),
        };
        tracing::info!(
            directory = %source.display(),
            records = report.records(),
            bytes_reclaimed = report.bytes_reclaimed(),
            "optimization complete"
        );
        Ok(report)
    }

    fn initialize(&self, target: &Path) -> Result<(), OptimizeError> {
        if target.exists() {
            tracing::info!(target = %target.display(), "removing stale working directory");
            std::fs::remove_dir_all(target).map_err(OptimizeError::io(target))?;
        }
        std::fs::create_dir_all(target).map_err(OptimizeError::io(target))?;
        tracing::debug!(phase = %Phase::Initialize, target = %target.display(), "working directory ready");
        Ok(())
    }

    /// Analyze `source` and, unless dry, compact it into `target`; then recurse
    fn optimize_dir(
        &self,
        source: &Path,
        target: Option<&Path>,
        reports: &mut Vec<OptimizeReport>,
    ) -> Result<(), OptimizeError> {
        let segment_size = Journal::detect_segment_size(source)
            .map_err(OptimizeError::journal(source))?
            .unwrap_or(self.config.default_segment_size);
        let mut journal =
            Journal::open(source, segment_size).map_err(OptimizeError::journal(source))?;
        journal.start().map_err(OptimizeError::journal(source))?;

        let pool = analyze(&journal)?;
        let source_bytes = journal
            .total_disk_size()
            .map_err(OptimizeError::journal(source))?;
        let mut report = OptimizeReport::new(source, &pool, source_bytes);
        tracing::info!(
            phase = %Phase::Analyze,
            directory = %source.display(),
            records = report.records,
            topics = report.topics,
            queues = report.queues,
            live_messages = report.live_messages,
            violations = report.violations,
            "analysis complete"
        );

        if let Some(target) = target {
            self.compact_dir(&journal, &pool, target, &mut report)?;
        }
        journal.close().map_err(OptimizeError::journal(source))?;
        reports.push(report);

        let (subdirectories, others) = list_entries(source)?;
        for other in &others {
            tracing::debug!(path = %other.display(), "not a journal segment, left behind");
        }
        for name in subdirectories {
            let nested_source = source.join(&name);
            let nested_target = target.map(|target| target.join(&name));

            if !self.config.recursive {
                // Carried over untouched so the swap does not drop it
                if let Some(nested_target) = &nested_target {
                    copy_tree(&nested_source, nested_target)?;
                }
                continue;
            }
            if let Some(nested_target) = &nested_target {
                std::fs::create_dir_all(nested_target).map_err(OptimizeError::io(nested_target))?;
            }
            self.optimize_dir(&nested_source, nested_target.as_deref(), reports)?;
        }
        Ok(())
    }

    fn compact_dir(
        &self,
        journal: &Journal,
        pool: &DestinationPool,
        target: &Path,
        report: &mut OptimizeReport,
    ) -> Result<(), OptimizeError> {
        if pool.is_empty() {
            tracing::info!(
                phase = %Phase::Compact,
                directory = %journal.directory().display(),
                "nothing live, compaction skipped"
            );
            report.skipped = true;
            report.target_bytes = Some(0);
            return Ok(());
        }

        let mut compacted =
            Journal::open(target, journal.segment_size()).map_err(OptimizeError::journal(target))?;
        compacted.start().map_err(OptimizeError::journal(target))?;
        let stats = compact(
            journal,
            &mut compacted,
            &pool.live_locations(),
            self.config.force_sync,
        )
        .map_err(OptimizeError::journal(target))?;
        compacted.close().map_err(OptimizeError::journal(target))?;
        compacted.start().map_err(OptimizeError::journal(target))?;

        report.compaction = Some(stats);
        report.target_bytes = Some(
            compacted
                .total_disk_size()
                .map_err(OptimizeError::journal(target))?,
        );
        tracing::info!(
            phase = %Phase::Compact,
            directory = %journal.directory().display(),
            bytes_reclaimed = report.bytes_reclaimed(),
            "compaction complete"
        );

        if self.config.verify {
            let replayed = analyze(&compacted)?;
            if replayed.snapshot() != pool.snapshot() {
                tracing::error!(
                    phase = %Phase::Verify,
                    directory = %journal.directory().display(),
                    "compacted journal diverges from source"
                );
                return Err(OptimizeError::VerificationFailed {
                    directory: journal.directory().to_path_buf(),
                });
            }
            tracing::debug!(phase = %Phase::Verify, directory = %target.display(), "verified");
        }
        Ok(())
    }
}

/// `<dir><suffix>` in the same parent directory
fn sibling(dir: &Path, suffix: &str) -> Result<PathBuf, OptimizeError> {
    let name = dir
        .file_name()
        .ok_or_else(|| OptimizeError::NotADirectory(dir.to_path_buf()))?;
    let mut sibling = name.to_os_string();
    sibling.push(suffix);
    Ok(dir.with_file_name(sibling))
}

/// Subdirectory names, sorted, and files that are not segments
fn list_entries(dir: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>), OptimizeError> {
    let mut subdirectories = Vec::new();
    let mut others = Vec::new();

    for entry in std::fs::read_dir(dir).map_err(OptimizeError::io(dir))? {
        let entry = entry.map_err(OptimizeError::io(dir))?;
        let file_type = entry.file_type().map_err(OptimizeError::io(&entry.path()))?;
        let name = entry.file_name();
        if file_type.is_dir() {
            subdirectories.push(PathBuf::from(name));
        } else if name.to_str().and_then(parse_segment_id).is_none() {
            others.push(entry.path());
        }
    }
    subdirectories.sort();
    others.sort();
    Ok((subdirectories, others))
}

/// Recursive verbatim copy of `from` into a new directory `to`
fn copy_tree(from: &Path, to: &Path) -> Result<(), OptimizeError> {
    std::fs::create_dir_all(to).map_err(OptimizeError::io(to))?;
    for entry in std::fs::read_dir(from).map_err(OptimizeError::io(from))? {
        let entry = entry.map_err(OptimizeError::io(from))?;
        let path = entry.path();
        let dest = to.join(entry.file_name());
        if entry.file_type().map_err(OptimizeError::io(&path))?.is_dir() {
            copy_tree(&path, &dest)?;
        } else {
            std::fs::copy(&path, &dest).map_err(OptimizeError::io(&path))?;
        }
    }
    tracing::debug!(from = %from.display(), to = %to.display(), "copied without optimizing");
    Ok(())
}

/// Move `source` aside and `target` into its place; returns the backup path
fn swap(source: &Path, target: &Path) -> Result<PathBuf, OptimizeError> {
    let stamp = chrono::Utc::now().timestamp_millis();
    let backup = sibling(source, &format!("_{}", stamp))?;

    std::fs::rename(source, &backup).map_err(|e| OptimizeError::Swap {
        reason: format!("moving source aside: {}", e),
        original: source.to_path_buf(),
        compacted: target.to_path_buf(),
    })?;
    std::fs::rename(target, source).map_err(|e| OptimizeError::Swap {
        reason: format!("moving compacted journal into place: {}", e),
        original: backup.clone(),
        compacted: target.to_path_buf(),
    })?;
    Ok(backup)
}

/// Best-effort removal of a failed run's working directory
fn discard(target: &Path) {
    if let Err(e) = std::fs::remove_dir_all(target) {
        tracing::warn!(target = %target.display(), error = %e, "could not remove working directory");
    }
}

#[cfg(test)]
#[path = "optimizer_tests.rs"]
mod tests;
