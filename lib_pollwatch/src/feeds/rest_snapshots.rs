//! # REST Snapshot Poller
//!
//! [`SnapshotSource`] backed by plain HTTP: every interval it fetches
//! `GET {base}/{collection}` and emits an event only when the body differs
//! from the previous successful fetch (SHA-256 of the raw body).
//!
//! The body must be a JSON array of items. An empty array becomes
//! [`SnapshotEvent::Empty`]; a non-empty array whose items all fail
//! validation is reported as an error rather than as an empty collection.

use std::time::Duration;

use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::configs::FeedConfig;
use crate::feeds::remote::{SnapshotEvent, SnapshotSource, SubscriptionHandle};
use crate::models::{Collection, CollectionKind};
use crate::retrieve::{ApiClient, FetchError};

/// Polling snapshot source.
#[derive(Debug, Clone)]
pub struct RestSnapshotSource {
    client: ApiClient,
    interval: Duration,
}

impl RestSnapshotSource {
    /// Polls through `client` every `interval`.
    pub fn new(client: ApiClient, interval: Duration) -> Self {
        Self { client, interval }
    }

    /// Source for `config.snapshot_base_url`, or `None` when no remote store is
    /// configured.
    ///
    /// # Errors
    /// The base URL is invalid.
    pub fn from_config(config: &FeedConfig) -> Result<Option<Self>, FetchError> {
        let Some(base) = config.snapshot_base_url.as_deref() else {
            return Ok(None);
        };
        let client = ApiClient::new(base, config.api_token.clone())?;
        Ok(Some(Self::new(client, config.snapshot_poll_interval())))
    }
}

fn digest(body: &str) -> String {
    hex::encode(Sha256::digest(body.as_bytes()))
}

/// Turns a fetched body into the event to emit.
pub fn snapshot_from_body(kind: CollectionKind, body: &str) -> SnapshotEvent {
    let items = match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            return SnapshotEvent::Error {
                kind,
                message: "snapshot body is not a JSON array".into(),
            }
        }
        Err(e) => {
            return SnapshotEvent::Error {
                kind,
                message: format!("snapshot body is not JSON: {e}"),
            }
        }
    };
    if items.is_empty() {
        return SnapshotEvent::Empty(kind);
    }

    let received = items.len();
    let decoded = Collection::decode(kind, items);
    for (index, reason) in &decoded.rejected {
        log::warn!("Remote {} item #{} rejected: {}", kind, index, reason);
    }
    if decoded.items.is_empty() {
        return SnapshotEvent::Error {
            kind,
            message: format!("all {received} item(s) in the snapshot were invalid"),
        };
    }
    SnapshotEvent::Data(decoded.items)
}

async fn poll_collection(
    client: ApiClient,
    kind: CollectionKind,
    interval: Duration,
    events: mpsc::Sender<SnapshotEvent>,
    cancel: CancellationToken,
) {
    let path = kind.remote_path();
    let mut last_digest: Option<String> = None;

    loop {
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            fetched = client.get_text(path) => fetched,
        };

        let event = match fetched {
            Ok(body) => {
                let current = digest(&body);
                if last_digest.as_deref() == Some(current.as_str()) {
                    log::trace!("Remote {} unchanged", kind);
                    None
                } else {
                    last_digest = Some(current);
                    Some(snapshot_from_body(kind, &body))
                }
            }
            Err(e) => Some(SnapshotEvent::Error {
                kind,
                message: e.to_string(),
            }),
        };

        if let Some(event) = event {
            if events.send(event).await.is_err() {
                log::debug!("Snapshot receiver for {} closed; poller exiting", kind);
                return;
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

impl SnapshotSource for RestSnapshotSource {
    fn subscribe(
        &self,
        kind: CollectionKind,
        events: mpsc::Sender<SnapshotEvent>,
    ) -> SubscriptionHandle {
        let token = CancellationToken::new();
        log::info!(
            "Polling remote {} snapshots from {} every {}s",
            kind,
            self.client.base_url(),
            self.interval.as_secs()
        );
        tokio::spawn(poll_collection(
            self.client.clone(),
            kind,
            self.interval,
            events,
            token.clone(),
        ));
        SubscriptionHandle::new(kind, token)
    }
}
