use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Default endpoint of the live incident feed.
pub const DEFAULT_STREAM_URL: &str = "ws://localhost:8080/incidents";

/// Default delay between a dropped connection and the next attempt.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5000;

/// How long the manager waits before dialing again after a drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ReconnectPolicy {
    /// The same delay after every failure.
    #[serde(rename_all = "camelCase")]
    Fixed {
        /// Delay in milliseconds.
        delay_ms: u64,
    },
    /// Doubling delay starting at `base_ms`, capped at `max_ms`. Resets after
    /// a successful handshake.
    #[serde(rename_all = "camelCase")]
    Exponential {
        /// First delay in milliseconds.
        base_ms: u64,
        /// Upper bound in milliseconds.
        max_ms: u64,
    },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::Fixed {
            delay_ms: DEFAULT_RECONNECT_DELAY_MS,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect number `failures` (0 for the first retry after a
    /// successful connection).
    pub fn delay(&self, failures: u32) -> Duration {
        match *self {
            Self::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            Self::Exponential { base_ms, max_ms } => {
                let factor = 1u64.checked_shl(failures.min(32)).unwrap_or(u64::MAX);
                Duration::from_millis(base_ms.saturating_mul(factor).min(max_ms))
            }
        }
    }
}

/// Settings for the live incident stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamConfig {
    /// WebSocket endpoint of the incident feed.
    pub url: String,
    /// Delay policy between connection attempts.
    pub reconnect: ReconnectPolicy,
    /// Treat the socket as dropped after this many seconds without any frame.
    /// `None` disables the watchdog.
    pub idle_timeout_secs: Option<u64>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_STREAM_URL.to_string(),
            reconnect: ReconnectPolicy::default(),
            idle_timeout_secs: None,
        }
    }
}

impl StreamConfig {
    /// Idle watchdog as a `Duration`, if enabled.
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }

    /// Checks the endpoint scheme and the reconnect delays.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(ConfigError::InvalidStreamUrl(self.url.clone()));
        }
        match self.reconnect {
            ReconnectPolicy::Fixed { delay_ms: 0 } => Err(ConfigError::Zero("reconnect delay")),
            ReconnectPolicy::Exponential { base_ms: 0, .. } => {
                Err(ConfigError::Zero("reconnect base delay"))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_policy_never_grows() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_millis(5000));
        assert_eq!(policy.delay(7), Duration::from_millis(5000));
    }

    #[test]
    fn test_exponential_policy_doubles_and_caps() {
        let policy = ReconnectPolicy::Exponential {
            base_ms: 1000,
            max_ms: 60_000,
        };
        assert_eq!(policy.delay(0), Duration::from_millis(1000));
        assert_eq!(policy.delay(3), Duration::from_millis(8000));
        assert_eq!(policy.delay(40), Duration::from_millis(60_000));
    }

    #[test]
    fn test_validate_rejects_http_scheme() {
        let config = StreamConfig {
            url: "http://example.com".into(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidStreamUrl(_))
        ));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: StreamConfig = serde_json::from_str(
            r#"{"url":"wss://feed.example/ws","reconnect":{"kind":"fixed","delayMs":250}}"#,
        )
        .unwrap();
        assert_eq!(config.reconnect.delay(0), Duration::from_millis(250));
        assert_eq!(config.idle_timeout(), None);
    }
}
