//! # Configuration Modules
//!
//! Plain, serializable settings consumed by the engine. Nothing in here reads
//! files or the environment; the binaries layer their own sources on top and
//! hand the finished structs down.

/// Live-stream transport and reconnect settings.
pub mod config_stream;
/// Reporting window, live cap, target date and snapshot policy.
pub mod config_reconciler;
/// Remote snapshot polling and enrichment endpoints.
pub mod config_feeds;

pub use config_feeds::FeedConfig;
pub use config_reconciler::{EmptySnapshotPolicy, ReconcilerConfig};
pub use config_stream::{ReconnectPolicy, StreamConfig};

use thiserror::Error;

/// Errors raised while validating a configuration before it is used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A numeric setting that must be positive was zero.
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    /// A date setting did not match `YYYY-MM-DD`.
    #[error("invalid date for {field}: {value}")]
    InvalidDate {
        /// The offending setting.
        field: &'static str,
        /// The raw value.
        value: String,
    },

    /// The stream endpoint is not a `ws://` or `wss://` URL.
    #[error("live stream url must start with ws:// or wss://, got {0}")]
    InvalidStreamUrl(String),
}
