//! Merging command-line flags over the file configuration.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};

use super::{ConfigError, PrunedirConfig};
use crate::retention::{Action, PruneRequest};

/// Values supplied on the command line.
///
/// Boolean flags can only switch a behaviour on; `None` leaves the file value
/// in place.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Positional directory arguments. Exactly one is required.
    pub targets: Vec<PathBuf>,
    pub keep: Option<i64>,
    pub since_unix_time: Option<i64>,
    pub max_age_days: Option<u32>,
    pub directories: bool,
    pub include_dotfiles: bool,
    pub no_confirm: bool,
    pub move_to: Option<PathBuf>,
    pub print_only: bool,
    pub classify: bool,
}

impl PrunedirConfig {
    /// Layer command-line values over this configuration.
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(keep) = overrides.keep {
            self.retention.keep = keep;
        }
        if let Some(secs) = overrides.since_unix_time {
            self.retention.since_unix_time = Some(secs);
        }
        if let Some(days) = overrides.max_age_days {
            self.retention.max_age_days = Some(days);
        }
        if let Some(dest) = &overrides.move_to {
            self.action.move_to = Some(dest.clone());
        }
        self.scan.directories |= overrides.directories;
        self.scan.include_dotfiles |= overrides.include_dotfiles;
        if overrides.no_confirm {
            self.safety.confirm = false;
        }
    }
}

/// Validate the merged configuration and build a [`PruneRequest`].
///
/// Checks run in a fixed order: keep count, move destination, argument
/// count, then policy thresholds. `now` anchors `max_age_days`.
pub fn resolve(
    mut config: PrunedirConfig,
    overrides: Overrides,
    now: DateTime<Utc>,
) -> Result<PruneRequest, ConfigError> {
    config.apply(&overrides);

    let keep = config.retention.keep_count()?;

    if let Some(dest) = &config.action.move_to {
        check_destination(dest)?;
    }

    let mut targets = overrides.targets;
    if targets.len() != 1 {
        return Err(ConfigError::ArgumentCount(targets.len()));
    }
    let target = targets.remove(0);

    let policies = config.retention.policies(now)?;
    let action = Action::select(
        overrides.classify,
        overrides.print_only,
        config.action.move_to.clone(),
    );

    Ok(PruneRequest {
        target,
        scan: config.scan.options(),
        keep,
        policies,
        confirm: config.safety.mode(),
        action,
    })
}

fn check_destination(dest: &Path) -> Result<(), ConfigError> {
    match fs::metadata(dest) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(ConfigError::DestinationNotDirectory(dest.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(ConfigError::DestinationMissing(dest.to_path_buf()))
        }
        Err(source) => Err(ConfigError::DestinationUnreadable {
            path: dest.to_path_buf(),
            source,
        }),
    }
}
