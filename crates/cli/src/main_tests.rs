// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use clap::CommandFactory;
use yare::parameterized;

#[test]
fn command_definition_is_valid() {
    Cli::command().debug_assert();
}

#[test]
fn journal_dir_alone() {
    let cli = Cli::try_parse_from(["jo", "/data/kahadb"]).unwrap();
    assert_eq!(cli.journal_dir, Some(PathBuf::from("/data/kahadb")));
    assert!(!cli.dry_run);
    assert!(cli.config.is_none());
    assert_eq!(cli.output, OutputFormat::Text);
}

#[test]
fn all_flags() {
    let cli = Cli::try_parse_from([
        "jo",
        "--config",
        "jo.toml",
        "--dry-run",
        "--output",
        "json",
        "/data/kahadb",
    ])
    .unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("jo.toml")));
    assert!(cli.dry_run);
    assert_eq!(cli.output, OutputFormat::Json);
}

#[test]
fn completions_need_no_directory() {
    let cli = Cli::try_parse_from(["jo", "--completions", "bash"]).unwrap();
    assert_eq!(cli.completions, Some(Shell::Bash));
    assert!(cli.journal_dir.is_none());
}

#[parameterized(
    missing_directory = { &["jo"] },
    unknown_flag = { &["jo", "--frobnicate", "/data"] },
    bad_output = { &["jo", "--output", "yaml", "/data"] },
    completions_with_directory = { &["jo", "--completions", "bash", "/data"] },
)]
fn rejected(args: &[&str]) {
    let err = Cli::try_parse_from(args).unwrap_err();
    assert!(err.use_stderr());
}

#[test]
fn missing_config_file_is_an_error() {
    let cli = Cli::try_parse_from(["jo", "--config", "/nonexistent/jo.toml", "/data"]).unwrap();
    let err = load_config(&cli).unwrap_err();
    assert!(format!("{:#}", err).contains("/nonexistent/jo.toml"));
}
