use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Default upper bound on the number of incidents kept after push merges.
pub const DEFAULT_LIVE_CAP: usize = 100;
/// Default reporting window, in days, behind the reference date.
pub const DEFAULT_WINDOW_DAYS: i64 = 90;
/// Default window, in days, for the "recent incidents" counter.
pub const DEFAULT_RECENT_WINDOW_DAYS: i64 = 30;
/// Default acceptance year of the reporting window.
pub const DEFAULT_ACCEPTANCE_YEAR: i32 = 2025;

/// What an empty remote snapshot means for the local collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EmptySnapshotPolicy {
    /// Treat it as "remote not populated yet" and keep the current contents.
    #[default]
    Ignore,
    /// Treat it as authoritative and clear the collection.
    Clear,
}

/// Settings for the data reconciler and the aggregates it maintains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconcilerConfig {
    /// Only incidents dated in this year are accepted.
    pub acceptance_year: i32,
    /// Incidents older than this many days before the reference date are excluded.
    pub window_days: i64,
    /// Window for the recent-incident counter.
    pub recent_window_days: i64,
    /// Maximum number of incidents retained after a push merge.
    pub live_cap: usize,
    /// The date the countdown runs to (election day).
    pub target_date: NaiveDate,
    /// Interpretation of empty remote snapshots.
    pub empty_snapshot_policy: EmptySnapshotPolicy,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            acceptance_year: DEFAULT_ACCEPTANCE_YEAR,
            window_days: DEFAULT_WINDOW_DAYS,
            recent_window_days: DEFAULT_RECENT_WINDOW_DAYS,
            live_cap: DEFAULT_LIVE_CAP,
            target_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap_or_default(),
            empty_snapshot_policy: EmptySnapshotPolicy::default(),
        }
    }
}

impl ReconcilerConfig {
    /// Rejects zero-sized windows and a zero cap.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_days <= 0 {
            return Err(ConfigError::Zero("window days"));
        }
        if self.recent_window_days <= 0 {
            return Err(ConfigError::Zero("recent window days"));
        }
        if self.live_cap == 0 {
            return Err(ConfigError::Zero("live cap"));
        }
        Ok(())
    }

    /// Parses a `YYYY-MM-DD` target date coming from a flag or the environment.
    pub fn parse_target_date(value: &str) -> Result<NaiveDate, ConfigError> {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ConfigError::InvalidDate {
            field: "target date",
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReconcilerConfig::default();
        assert_eq!(config.live_cap, 100);
        assert_eq!(config.window_days, 90);
        assert_eq!(config.acceptance_year, 2025);
        assert_eq!(config.target_date.to_string(), "2026-01-15");
        assert_eq!(config.empty_snapshot_policy, EmptySnapshotPolicy::Ignore);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_cap_is_rejected() {
        let config = ReconcilerConfig {
            live_cap: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Zero("live cap")));
    }

    #[test]
    fn test_json_overrides() {
        let config: ReconcilerConfig = serde_json::from_str(
            r#"{"acceptanceYear":2026,"targetDate":"2026-01-15","emptySnapshotPolicy":"clear"}"#,
        )
        .unwrap();
        assert_eq!(config.acceptance_year, 2026);
        assert_eq!(config.empty_snapshot_policy, EmptySnapshotPolicy::Clear);
        assert_eq!(config.live_cap, DEFAULT_LIVE_CAP);
    }

    #[test]
    fn test_parse_target_date() {
        assert!(ReconcilerConfig::parse_target_date("2026-01-15").is_ok());
        assert!(ReconcilerConfig::parse_target_date("15/01/2026").is_err());
    }
}
