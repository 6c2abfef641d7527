//! Retention, safety and action configuration.
//!
//! # Example
//!
//! ```toml
//! [retention]
//! keep = 3
//! since_unix_time = 1700000000
//! max_age_days = 30
//!
//! [safety]
//! confirm = true
//!
//! [action]
//! move_to = "${HOME}/archive"
//! ```

use std::path::PathBuf;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::retention::{ConfirmMode, KeepAtOrAfter, PolicySet};

/// Which entries survive a run.
///
/// The keep policies are OR-combined: an entry matching either the absolute
/// threshold or the maximum age is protected, together with everything newer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RetentionConfig {
    /// Minimum number of newest entries always kept.
    /// Signed so a negative value is reported instead of failing to parse.
    /// Default: 1
    #[serde(default = "default_keep")]
    pub keep: i64,

    /// Keep entries modified at or after this Unix time (seconds).
    #[serde(default)]
    pub since_unix_time: Option<i64>,

    /// Keep entries modified within this many days of the run.
    #[serde(default)]
    pub max_age_days: Option<u32>,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            keep: default_keep(),
            since_unix_time: None,
            max_age_days: None,
        }
    }
}

fn default_keep() -> i64 {
    1
}

impl RetentionConfig {
    /// The keep count as an index bound, rejecting negative values.
    pub fn keep_count(&self) -> Result<usize, ConfigError> {
        match usize::try_from(self.keep) {
            Ok(keep) => Ok(keep),
            Err(_) if self.keep < 0 => Err(ConfigError::NegativeKeep(self.keep)),
            // Only reachable where usize is narrower than i64.
            Err(_) => Err(ConfigError::KeepOutOfRange(self.keep)),
        }
    }

    /// Build the keep policies, resolving `max_age_days` relative to `now`.
    pub fn policies(&self, now: DateTime<Utc>) -> Result<PolicySet, ConfigError> {
        let mut policies = PolicySet::new();

        if let Some(secs) = self.since_unix_time {
            let threshold = DateTime::from_timestamp(secs, 0)
                .ok_or(ConfigError::TimestampOutOfRange(secs))?;
            policies.push(KeepAtOrAfter::new(threshold));
        }

        if let Some(days) = self.max_age_days {
            let threshold = TimeDelta::try_days(i64::from(days))
                .and_then(|age| now.checked_sub_signed(age))
                .ok_or(ConfigError::AgeOutOfRange(days))?;
            policies.push(KeepAtOrAfter::new(threshold));
        }

        Ok(policies)
    }
}

/// Safety settings for destructive actions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SafetyConfig {
    /// Ask before deleting or moving.
    /// Default: true
    #[serde(default = "default_true")]
    pub confirm: bool,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self { confirm: true }
    }
}

fn default_true() -> bool {
    true
}

impl SafetyConfig {
    pub fn mode(&self) -> ConfirmMode {
        ConfirmMode::from_no_confirm_flag(!self.confirm)
    }
}

/// What happens to the entries selected for removal.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ActionConfig {
    /// Move removed entries into this existing directory instead of deleting them.
    #[serde(default)]
    pub move_to: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = RetentionConfig::default();
        assert_eq!(config.keep, 1);
        assert_eq!(config.since_unix_time, None);
        assert_eq!(config.max_age_days, None);
        assert!(SafetyConfig::default().confirm);
        assert_eq!(ActionConfig::default().move_to, None);
    }

    #[test]
    fn test_parse_full_config() {
        let config: RetentionConfig = toml::from_str(
            r#"
            keep = 5
            since_unix_time = 1700000000
            max_age_days = 14
        "#,
        )
        .unwrap();
        assert_eq!(config.keep, 5);
        assert_eq!(config.since_unix_time, Some(1_700_000_000));
        assert_eq!(config.max_age_days, Some(14));
    }

    #[test]
    fn test_negative_keep_parses_but_is_rejected() {
        let config: RetentionConfig = toml::from_str("keep = -2").unwrap();
        assert!(matches!(config.keep_count(), Err(ConfigError::NegativeKeep(-2))));
    }

    #[test]
    fn test_huge_keep_is_never_reported_as_negative() {
        let config = RetentionConfig {
            keep: i64::MAX,
            ..Default::default()
        };
        match config.keep_count() {
            Ok(keep) => assert_eq!(keep as u64, i64::MAX as u64),
            Err(ConfigError::KeepOutOfRange(keep)) => assert_eq!(keep, i64::MAX),
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_keep_zero_is_allowed() {
        let config = RetentionConfig {
            keep: 0,
            ..Default::default()
        };
        assert_eq!(config.keep_count().unwrap(), 0);
    }

    #[test]
    fn test_no_policies_by_default() {
        let policies = RetentionConfig::default().policies(Utc::now()).unwrap();
        assert!(policies.is_empty());
    }

    #[test]
    fn test_both_policies_configured() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let config = RetentionConfig {
            keep: 1,
            since_unix_time: Some(1_700_000_000),
            max_age_days: Some(7),
        };
        let policies = config.policies(now).unwrap();
        assert_eq!(policies.len(), 2);

        let descriptions = policies.descriptions();
        assert!(descriptions[0].contains("2023-11-14T22:13:20"), "{descriptions:?}");
        assert!(descriptions[1].contains("2024-03-03T12:00:00"), "{descriptions:?}");
    }

    #[test]
    fn test_timestamp_out_of_range() {
        let config = RetentionConfig {
            since_unix_time: Some(i64::MAX),
            ..Default::default()
        };
        assert!(matches!(
            config.policies(Utc::now()),
            Err(ConfigError::TimestampOutOfRange(i64::MAX))
        ));
    }

    #[test]
    fn test_age_out_of_range() {
        let config = RetentionConfig {
            max_age_days: Some(u32::MAX),
            ..Default::default()
        };
        assert!(matches!(
            config.policies(Utc::now()),
            Err(ConfigError::AgeOutOfRange(u32::MAX))
        ));
    }

    #[test]
    fn test_safety_mode() {
        assert_eq!(SafetyConfig::default().mode(), ConfirmMode::Confirm);
        assert_eq!(
            SafetyConfig { confirm: false }.mode(),
            ConfirmMode::NoConfirm
        );
    }

    #[test]
    fn test_reject_unknown_field() {
        let result: Result<SafetyConfig, _> = toml::from_str("dry_run = true");
        assert!(result.is_err());
    }
}
