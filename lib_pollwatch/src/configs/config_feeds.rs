use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Endpoints of the remote snapshot store and the enrichment service.
///
/// Both are optional: without a snapshot base URL the dashboard runs on the
/// seed set plus the live stream, without an enrichment URL `sync` requests
/// are refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedConfig {
    /// Base URL serving `incidents`, `candidates` and `parliamentary`.
    pub snapshot_base_url: Option<String>,
    /// Seconds between two snapshot polls.
    pub snapshot_poll_secs: u64,
    /// Enrichment endpoint (`POST`).
    pub enrichment_url: Option<String>,
    /// Seconds between timer-driven enrichment calls. `None` means only on demand.
    pub enrichment_interval_secs: Option<u64>,
    /// Bearer token sent to both services.
    pub api_token: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            snapshot_base_url: None,
            snapshot_poll_secs: 15,
            enrichment_url: None,
            enrichment_interval_secs: None,
            api_token: None,
        }
    }
}

impl FeedConfig {
    /// Snapshot polling interval, never shorter than one second.
    pub fn snapshot_poll_interval(&self) -> Duration {
        Duration::from_secs(self.snapshot_poll_secs.max(1))
    }

    /// Timer period for background enrichment, if enabled.
    pub fn enrichment_interval(&self) -> Option<Duration> {
        self.enrichment_interval_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
    }
}
