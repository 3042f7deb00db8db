// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Optimizer configuration
//!
//! Loaded from an optional TOML file. Every field has a default, so an
//! empty file is a valid configuration.

use jo_storage::{DEFAULT_SEGMENT_SIZE, FRAME_HEADER_LEN, SEGMENT_HEADER_LEN};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Segment length for compacted journals whose source has no segments
    pub default_segment_size: u32,
    /// Appended to the source path to name the working directory
    pub temp_suffix: String,
    /// Sync each compacted record to disk as it is written
    pub force_sync: bool,
    /// Replay the compacted journal and compare before swapping
    pub verify: bool,
    /// Optimize subdirectories too
    pub recursive: bool,
    /// Write logs here instead of stderr
    pub log_file: Option<PathBuf>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            default_segment_size: DEFAULT_SEGMENT_SIZE,
            temp_suffix: "_temp".to_string(),
            force_sync: true,
            verify: true,
            recursive: true,
            log_file: None,
        }
    }
}

impl OptimizerConfig {
    /// Read and validate a TOML configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: OptimizerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let minimum = SEGMENT_HEADER_LEN + FRAME_HEADER_LEN;
        if self.default_segment_size <= minimum {
            return Err(ConfigError::Invalid(format!(
                "default_segment_size must exceed {} bytes, got {}",
                minimum, self.default_segment_size
            )));
        }
        if self.temp_suffix.is_empty() {
            return Err(ConfigError::Invalid(
                "temp_suffix must not be empty".to_string(),
            ));
        }
        if self.temp_suffix.contains(std::path::is_separator) {
            return Err(ConfigError::Invalid(format!(
                "temp_suffix must not contain a path separator: {:?}",
                self.temp_suffix
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
