use anyhow::{Context, Result, bail};
use clap::Parser;
use lib_pollwatch::configs::{
    EmptySnapshotPolicy, FeedConfig, ReconcilerConfig, ReconnectPolicy, StreamConfig,
    config_stream::{DEFAULT_RECONNECT_DELAY_MS, DEFAULT_STREAM_URL},
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const DEFAULT_CONFIG_FILE: &str = "server_pollwatch.conf";
const DEFAULT_LOG_KEEP: usize = 5;

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[command(about = "PollWatch election monitoring backend", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[arg(long, env = "POLLWATCH_PORT", help = "Port the JSON API listens on.")]
    pub port: Option<u16>,

    #[arg(long, env = "POLLWATCH_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[arg(long, env = "POLLWATCH_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[arg(long, env = "POLLWATCH_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[arg(long, env = "POLLWATCH_LOG_KEEP", help = "Number of log files kept in the log directory, the current one included.")]
    pub log_keep: Option<usize>,

    #[arg(long, env = "POLLWATCH_STREAM_URL", help = "WebSocket URL of the live incident feed.")]
    pub stream_url: Option<String>,

    #[arg(long, env = "POLLWATCH_RECONNECT_DELAY_MS", help = "Delay in milliseconds before reconnecting the live feed.")]
    pub reconnect_delay_ms: Option<u64>,

    #[arg(long, env = "POLLWATCH_RECONNECT_MAX_DELAY_MS", help = "Enables exponential reconnect backoff capped at this many milliseconds.")]
    pub reconnect_max_delay_ms: Option<u64>,

    #[arg(long, env = "POLLWATCH_IDLE_TIMEOUT_SECONDS", help = "Seconds of silence after which the live feed is considered dead.")]
    pub idle_timeout_seconds: Option<u64>,

    #[arg(long, env = "POLLWATCH_ACCEPTANCE_YEAR", help = "Only incidents from this year are shown.")]
    pub acceptance_year: Option<i32>,

    #[arg(long, env = "POLLWATCH_WINDOW_DAYS", help = "Incidents older than this many days are excluded.")]
    pub window_days: Option<i64>,

    #[arg(long, env = "POLLWATCH_RECENT_WINDOW_DAYS", help = "Window for the recent-incident counter.")]
    pub recent_window_days: Option<i64>,

    #[arg(long, env = "POLLWATCH_LIVE_CAP", help = "Maximum incidents retained after live merges.")]
    pub live_cap: Option<usize>,

    #[arg(long, env = "POLLWATCH_TARGET_DATE", help = "Election day (YYYY-MM-DD) for the countdown.")]
    pub target_date: Option<String>,

    #[arg(long, env = "POLLWATCH_REFERENCE_DATE", help = "Pins 'today' (YYYY-MM-DD); defaults to the local date.")]
    pub reference_date: Option<String>,

    #[arg(long, env = "POLLWATCH_EMPTY_SNAPSHOT_POLICY", help = "What an empty remote snapshot means: ignore or clear.")]
    pub empty_snapshot_policy: Option<String>,

    #[arg(long, env = "POLLWATCH_SNAPSHOT_BASE_URL", help = "Base URL of the remote snapshot store.")]
    pub snapshot_base_url: Option<String>,

    #[arg(long, env = "POLLWATCH_SNAPSHOT_POLL_SECONDS", help = "Seconds between remote snapshot polls.")]
    pub snapshot_poll_seconds: Option<u64>,

    #[arg(long, env = "POLLWATCH_ENRICHMENT_URL", help = "Endpoint of the enrichment service.")]
    pub enrichment_url: Option<String>,

    #[arg(long, env = "POLLWATCH_ENRICHMENT_INTERVAL_SECONDS", help = "Seconds between background enrichment runs.")]
    pub enrichment_interval_seconds: Option<u64>,

    #[arg(long, env = "POLLWATCH_API_TOKEN", help = "Bearer token for the snapshot store and enrichment service.")]
    pub api_token: Option<String>,

    #[arg(long, env = "POLLWATCH_SEED_PATH", help = "Seed file replacing the bundled seed set.")]
    pub seed_path: Option<PathBuf>,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            port: other.port.or(self.port),
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            log_keep: other.log_keep.or(self.log_keep),
            stream_url: other.stream_url.or(self.stream_url),
            reconnect_delay_ms: other.reconnect_delay_ms.or(self.reconnect_delay_ms),
            reconnect_max_delay_ms: other.reconnect_max_delay_ms.or(self.reconnect_max_delay_ms),
            idle_timeout_seconds: other.idle_timeout_seconds.or(self.idle_timeout_seconds),
            acceptance_year: other.acceptance_year.or(self.acceptance_year),
            window_days: other.window_days.or(self.window_days),
            recent_window_days: other.recent_window_days.or(self.recent_window_days),
            live_cap: other.live_cap.or(self.live_cap),
            target_date: other.target_date.or(self.target_date),
            reference_date: other.reference_date.or(self.reference_date),
            empty_snapshot_policy: other.empty_snapshot_policy.or(self.empty_snapshot_policy),
            snapshot_base_url: other.snapshot_base_url.or(self.snapshot_base_url),
            snapshot_poll_seconds: other.snapshot_poll_seconds.or(self.snapshot_poll_seconds),
            enrichment_url: other.enrichment_url.or(self.enrichment_url),
            enrichment_interval_seconds: other
                .enrichment_interval_seconds
                .or(self.enrichment_interval_seconds),
            api_token: other.api_token.or(self.api_token),
            seed_path: other.seed_path.or(self.seed_path),
        }
    }

    fn defaults() -> Config {
        let reconciler = ReconcilerConfig::default();
        Config {
            port: Some(9010),
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            log_keep: Some(DEFAULT_LOG_KEEP),
            stream_url: Some(DEFAULT_STREAM_URL.to_string()),
            reconnect_delay_ms: Some(DEFAULT_RECONNECT_DELAY_MS),
            acceptance_year: Some(reconciler.acceptance_year),
            window_days: Some(reconciler.window_days),
            recent_window_days: Some(reconciler.recent_window_days),
            live_cap: Some(reconciler.live_cap),
            target_date: Some(reconciler.target_date.format("%Y-%m-%d").to_string()),
            empty_snapshot_policy: Some("ignore".to_string()),
            snapshot_poll_seconds: Some(FeedConfig::default().snapshot_poll_secs),
            ..Default::default()
        }
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(9010)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| PathBuf::from("./logs"))
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn log_keep(&self) -> usize {
        self.log_keep.unwrap_or(DEFAULT_LOG_KEEP).max(1)
    }

    pub fn stream_config(&self) -> Result<StreamConfig> {
        let delay_ms = self.reconnect_delay_ms.unwrap_or(DEFAULT_RECONNECT_DELAY_MS);
        let reconnect = match self.reconnect_max_delay_ms {
            Some(max_ms) => ReconnectPolicy::Exponential {
                base_ms: delay_ms,
                max_ms,
            },
            None => ReconnectPolicy::Fixed { delay_ms },
        };
        let config = StreamConfig {
            url: self
                .stream_url
                .clone()
                .unwrap_or_else(|| DEFAULT_STREAM_URL.to_string()),
            reconnect,
            idle_timeout_secs: self.idle_timeout_seconds,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn reconciler_config(&self) -> Result<ReconcilerConfig> {
        let defaults = ReconcilerConfig::default();
        let target_date = match &self.target_date {
            Some(raw) => ReconcilerConfig::parse_target_date(raw)?,
            None => defaults.target_date,
        };
        let empty_snapshot_policy = match self.empty_snapshot_policy.as_deref() {
            None => EmptySnapshotPolicy::default(),
            Some(raw) => match raw.to_lowercase().as_str() {
                "ignore" => EmptySnapshotPolicy::Ignore,
                "clear" => EmptySnapshotPolicy::Clear,
                other => bail!("unknown empty snapshot policy '{}' (expected ignore or clear)", other),
            },
        };
        let config = ReconcilerConfig {
            acceptance_year: self.acceptance_year.unwrap_or(defaults.acceptance_year),
            window_days: self.window_days.unwrap_or(defaults.window_days),
            recent_window_days: self.recent_window_days.unwrap_or(defaults.recent_window_days),
            live_cap: self.live_cap.unwrap_or(defaults.live_cap),
            target_date,
            empty_snapshot_policy,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn reference_date(&self) -> Result<Option<chrono::NaiveDate>> {
        self.reference_date
            .as_deref()
            .map(|raw| {
                chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .with_context(|| format!("invalid reference date '{}'", raw))
            })
            .transpose()
    }

    pub fn feed_config(&self) -> FeedConfig {
        let defaults = FeedConfig::default();
        FeedConfig {
            snapshot_base_url: self.snapshot_base_url.clone(),
            snapshot_poll_secs: self.snapshot_poll_seconds.unwrap_or(defaults.snapshot_poll_secs),
            enrichment_url: self.enrichment_url.clone(),
            enrichment_interval_secs: self.enrichment_interval_seconds,
            api_token: self.api_token.clone(),
        }
    }
}

/// Layers defaults, the config file and `cli` (flags plus environment).
pub fn load_config_with(cli: Config) -> Config {
    // 1. Load defaults
    let mut current_config = Config::defaults();

    // 2. Load from config file if present. The CLI may point at another file.
    let config_file_path = cli
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    if config_file_path.exists() {
        match fs::read_to_string(&config_file_path) {
            Ok(config_str) => match serde_json::from_str::<Config>(&config_str) {
                Ok(file_config) => current_config = current_config.merge(file_config),
                Err(e) => log::warn!(
                    "Failed to parse config file {}: {}. Falling back to other sources.",
                    config_file_path.display(),
                    e
                ),
            },
            Err(e) => log::warn!(
                "Failed to read config file {}: {}. Falling back to other sources.",
                config_file_path.display(),
                e
            ),
        }
    } else {
        log::info!(
            "Config file not found at {}. Using defaults and environment/CLI variables.",
            config_file_path.display()
        );
    }

    // 3. Environment variables and CLI arguments win.
    current_config.merge(cli)
}

pub fn load_config() -> Config {
    load_config_with(Config::parse())
}
