// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jo - Journal Optimizer CLI

mod completions;
mod logging;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use clap_complete::Shell;
use jo_engine::{Optimizer, OptimizerConfig};
use output::OutputFormat;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "jo",
    version,
    about = "Journal Optimizer - compact a message broker journal in place"
)]
struct Cli {
    /// Journal directory to optimize
    #[arg(value_name = "JOURNAL_DIR", required_unless_present = "completions")]
    journal_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Analyze and report without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Report format
    #[arg(long, short = 'o', value_enum, default_value = "text")]
    output: OutputFormat,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL", value_enum, exclusive = true)]
    completions: Option<Shell>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(shell) = cli.completions {
        completions::generate_completions::<Cli>(shell);
        return Ok(());
    }

    let config = load_config(&cli)?;
    let _log_guard = logging::setup_logging(config.log_file.as_deref())?;

    let journal_dir = cli
        .journal_dir
        .context("no journal directory given")?;
    tracing::debug!(?config, dry_run = cli.dry_run, "starting");

    let report = Optimizer::new(config)
        .dry_run(cli.dry_run)
        .optimize(&journal_dir)
        .with_context(|| format!("optimizing {}", journal_dir.display()))?;

    output::print(&report, cli.output);
    Ok(())
}

fn load_config(cli: &Cli) -> Result<OptimizerConfig> {
    match &cli.config {
        Some(path) => OptimizerConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(OptimizerConfig::default()),
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
