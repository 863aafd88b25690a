//! The remote subscription seam: "tell me whenever collection X changes".

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub use crate::core::reconciler::SnapshotEvent;
use crate::models::CollectionKind;

/// A source of full-collection snapshots.
pub trait SnapshotSource: Send + Sync {
    /// Starts delivering events for `kind` into `events` until the returned
    /// handle is dropped or unsubscribed, or the receiver goes away.
    ///
    /// # Panics
    /// Implementations may spawn onto the current Tokio runtime.
    fn subscribe(
        &self,
        kind: CollectionKind,
        events: mpsc::Sender<SnapshotEvent>,
    ) -> SubscriptionHandle;
}

/// Keeps a subscription alive. Dropping it unsubscribes.
#[derive(Debug)]
pub struct SubscriptionHandle {
    kind: CollectionKind,
    token: CancellationToken,
}

impl SubscriptionHandle {
    /// Wraps the token a source's worker watches.
    pub fn new(kind: CollectionKind, token: CancellationToken) -> Self {
        Self { kind, token }
    }

    /// Collection this handle belongs to.
    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// `false` once unsubscribed.
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Stops the subscription.
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if !self.token.is_cancelled() {
            log::debug!("Unsubscribing from remote {} snapshots", self.kind);
            self.token.cancel();
        }
    }
}
