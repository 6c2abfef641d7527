//! Configuration for prunedir.
//!
//! Every setting can come from an optional TOML file, with command-line flags
//! layered on top. Environment variables can be interpolated with
//! `${VAR_NAME}` syntax. The merged result is validated and resolved into a
//! [`PruneRequest`](crate::retention::PruneRequest) before the target
//! directory is touched.
//!
//! # Example
//!
//! ```toml
//! [scan]
//! directories = false
//! include_dotfiles = false
//!
//! [retention]
//! keep = 3
//! max_age_days = 30
//!
//! [safety]
//! confirm = true
//!
//! [action]
//! move_to = "${HOME}/archive"
//!
//! [observability.logging]
//! level = "info"
//! format = "compact"
//! ```

mod observability;
mod resolve;
mod retention;
mod scan;

use std::path::{Path, PathBuf};

pub use observability::*;
pub use resolve::*;
pub use retention::*;
pub use scan::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Root configuration.
///
/// All sections are optional; an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PrunedirConfig {
    /// Which directory children are considered.
    #[serde(default)]
    pub scan: ScanConfig,

    /// Keep count and keep policies.
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Confirmation behaviour for destructive actions.
    #[serde(default)]
    pub safety: SafetyConfig,

    /// Delete (default) or move.
    #[serde(default)]
    pub action: ActionConfig,

    /// Logging configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl PrunedirConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables in the format `${VAR_NAME}` are expanded.
    /// Missing variables cause an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;
        let config: PrunedirConfig = toml::from_str(&expanded).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that only depend on the file itself. Values that flags can
    /// override are checked in [`resolve()`].
    fn validate(&self) -> Result<(), ConfigError> {
        if self
            .action
            .move_to
            .as_ref()
            .is_some_and(|dest| dest.as_os_str().is_empty())
        {
            return Err(ConfigError::Validation(
                "action.move_to must not be empty; omit it to delete instead".into(),
            ));
        }

        if self
            .observability
            .logging
            .filter
            .as_ref()
            .is_some_and(|filter| filter.trim().is_empty())
        {
            return Err(ConfigError::Validation(
                "observability.logging.filter must not be empty".into(),
            ));
        }

        Ok(())
    }
}

/// Configuration errors. All of them are raised before the target directory
/// is scanned.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Keep count must be 0 or greater, got {0}")]
    NegativeKeep(i64),

    #[error("Keep count {0} is too large for this platform")]
    KeepOutOfRange(i64),

    #[error("Expected exactly one directory argument, got {0}")]
    ArgumentCount(usize),

    #[error("Move destination does not exist: {}", .0.display())]
    DestinationMissing(PathBuf),

    #[error("Move destination is not a directory: {}", .0.display())]
    DestinationNotDirectory(PathBuf),

    #[error("Could not check move destination {}: {source}", path.display())]
    DestinationUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unix time {0} is out of range")]
    TimestampOutOfRange(i64),

    #[error("Maximum age of {0} days is out of range")]
    AgeOutOfRange(u32),
}

/// Expand `${VAR_NAME}` references, ignoring any that appear after a `#`
/// comment marker on the same line.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| ConfigError::Validation(e.to_string()))?;
    let mut result = String::with_capacity(input.len());

    for line in input.lines() {
        let comment_pos = line.find('#');
        let mut last_end = 0;

        for cap in re.captures_iter(line) {
            let Some(whole) = cap.get(0) else {
                continue;
            };

            if let Some(pos) = comment_pos
                && whole.start() >= pos
            {
                continue;
            }

            result.push_str(&line[last_end..whole.start()]);

            let var_name = &cap[1];
            let value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
            result.push_str(&value);

            last_end = whole.end();
        }

        result.push_str(&line[last_end..]);
        result.push('\n');
    }

    // Remove trailing newline if input didn't have one
    if !input.ends_with('\n') && result.ends_with('\n') {
        result.pop();
    }

    Ok(result)
}
