//! # Stream Subscription Manager
//!
//! Owns zero or one live connection to the incident feed and multiplexes it to
//! every registered listener.
//!
//! ## Lifecycle
//!
//! ```text
//!            first subscribe                 handshake ok
//!   Idle ──────────────────────▶ Connecting ─────────────▶ Open
//!    ▲                              ▲   │ error               │ close / error
//!    │ last unsubscribe             │   ▼                     ▼
//!    └──────────── (any) ◀──── ReconnectPending ◀─────────────┘
//!                                   delay elapsed ─▶ Connecting
//! ```
//!
//! All connection work happens on one spawned task per "generation". A
//! generation starts when the first listener arrives and ends when the last
//! one leaves; bumping the generation and cancelling its token is the only
//! teardown path, so a stale task can never deliver, reconnect, or flip the
//! state after it has been superseded. This also guarantees at most one
//! connection attempt and at most one armed reconnect timer at any time.
//!
//! Transport failures never reach listeners. Malformed frames are logged,
//! counted and dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::configs::ReconnectPolicy;
use crate::core::frames::decode_frame;
use crate::core::registry::{deliver, Listener, Registry};
use crate::core::transport::Connector;

/// Connection lifecycle as seen by the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket, no timer.
    Idle,
    /// Handshake in flight.
    Connecting,
    /// Socket open, frames flowing.
    Open,
    /// Socket gone, reconnect timer armed.
    ReconnectPending,
}

/// Counters for diagnostics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamStats {
    /// Handshakes started since construction.
    pub connection_attempts: u64,
    /// Valid frames fanned out to listeners.
    pub delivered: u64,
    /// Malformed frames dropped.
    pub dropped: u64,
}

struct Inner {
    registry: Registry,
    generation: u64,
    cancel: Option<CancellationToken>,
}

struct Shared {
    inner: Mutex<Inner>,
    state_tx: watch::Sender<ConnectionState>,
    attempts: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            log::debug!("Live stream state: {:?} -> {:?}", previous, state);
        }
    }

    /// Moves to `state` only if `generation` is still the live one.
    fn transition(&self, generation: u64, state: ConnectionState) -> bool {
        let inner = self.lock();
        if inner.generation != generation {
            return false;
        }
        self.set_state(state);
        true
    }

    /// After a close or failure: arm the reconnect if anyone is still listening.
    fn arm_reconnect(&self, generation: u64) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation {
            return false;
        }
        if inner.registry.is_empty() {
            if let Some(token) = inner.cancel.take() {
                token.cancel();
            }
            inner.generation += 1;
            self.set_state(ConnectionState::Idle);
            return false;
        }
        self.set_state(ConnectionState::ReconnectPending);
        true
    }

    fn dispatch(&self, generation: u64, text: &str) {
        let incident = match decode_frame(text) {
            Ok(incident) => incident,
            Err(e) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                log::warn!("Dropping malformed live frame: {}", e);
                return;
            }
        };

        let listeners = {
            let inner = self.lock();
            if inner.generation != generation {
                return;
            }
            inner.registry.snapshot()
        };

        deliver(&listeners, &incident);
        self.delivered.fetch_add(1, Ordering::Relaxed);
        log::trace!(
            "Delivered incident '{}' to {} listener(s)",
            incident.id,
            listeners.len()
        );
    }
}

/// Reference-counted multiplexer over one live connection.
///
/// Construct one per process at the composition root and share it behind an
/// `Arc`. `subscribe` and `unsubscribe` are the only mutators.
pub struct StreamSubscriptionManager {
    shared: Arc<Shared>,
    connector: Arc<dyn Connector>,
    policy: ReconnectPolicy,
}

impl StreamSubscriptionManager {
    /// Creates an idle manager. Nothing is dialed until the first subscription.
    pub fn new(connector: Arc<dyn Connector>, policy: ReconnectPolicy) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Idle);
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    registry: Registry::new(),
                    generation: 0,
                    cancel: None,
                }),
                state_tx,
                attempts: AtomicU64::new(0),
                delivered: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
            }),
            connector,
            policy,
        }
    }

    /// Registers `listener`. Registering the same listener again changes
    /// nothing. Starts the connection when the manager is idle.
    ///
    /// Returns `true` when the listener was newly added.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime; the connection task is
    /// spawned on it.
    pub fn subscribe(&self, listener: Listener) -> bool {
        let mut inner = self.shared.lock();
        let added = inner.registry.insert(listener);
        if added {
            log::debug!("Live stream listener added ({} total)", inner.registry.len());
        }
        if inner.cancel.is_none() {
            self.start(&mut inner);
        }
        added
    }

    /// Removes `listener`. When it was the last one the connection is closed
    /// and any pending reconnect is cancelled before this returns.
    ///
    /// Returns `true` when the listener was registered.
    pub fn unsubscribe(&self, listener: &Listener) -> bool {
        let mut inner = self.shared.lock();
        let removed = inner.registry.remove(listener);
        if inner.registry.is_empty() {
            Self::stop(&self.shared, &mut inner);
        }
        removed
    }

    /// Drops every listener and goes idle.
    pub fn shutdown(&self) {
        let mut inner = self.shared.lock();
        inner.registry = Registry::new();
        Self::stop(&self.shared, &mut inner);
    }

    fn start(&self, inner: &mut Inner) {
        inner.generation += 1;
        let token = CancellationToken::new();
        inner.cancel = Some(token.clone());
        self.shared.set_state(ConnectionState::Connecting);

        tokio::spawn(run_connection(
            Arc::clone(&self.shared),
            Arc::clone(&self.connector),
            self.policy,
            inner.generation,
            token,
        ));
    }

    fn stop(shared: &Shared, inner: &mut Inner) {
        if let Some(token) = inner.cancel.take() {
            token.cancel();
            inner.generation += 1;
            shared.set_state(ConnectionState::Idle);
            log::info!("No listeners left; live stream closed.");
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.shared.state_tx.borrow()
    }

    /// Receiver that observes every state change.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state_tx.subscribe()
    }

    /// Number of distinct registered listeners.
    pub fn listener_count(&self) -> usize {
        self.shared.lock().registry.len()
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> StreamStats {
        StreamStats {
            connection_attempts: self.shared.attempts.load(Ordering::Relaxed),
            delivered: self.shared.delivered.load(Ordering::Relaxed),
            dropped: self.shared.dropped.load(Ordering::Relaxed),
        }
    }
}

impl Drop for StreamSubscriptionManager {
    fn drop(&mut self) {
        let mut inner = self.shared.lock();
        Self::stop(&self.shared, &mut inner);
    }
}

/// Connection loop for one generation.
async fn run_connection(
    shared: Arc<Shared>,
    connector: Arc<dyn Connector>,
    policy: ReconnectPolicy,
    generation: u64,
    cancel: CancellationToken,
) {
    let endpoint = connector.endpoint();
    let mut failures: u32 = 0;

    loop {
        if !shared.transition(generation, ConnectionState::Connecting) {
            return;
        }
        shared.attempts.fetch_add(1, Ordering::Relaxed);
        log::info!("Connecting to live stream: {}", endpoint);

        let connected = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            result = connector.connect() => result,
        };

        match connected {
            Ok(mut connection) => {
                failures = 0;
                if !shared.transition(generation, ConnectionState::Open) {
                    connection.close().await;
                    return;
                }
                log::info!("Live stream open: {}", endpoint);

                loop {
                    let next = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            connection.close().await;
                            return;
                        }
                        next = connection.next_frame() => next,
                    };
                    match next {
                        Some(Ok(text)) => shared.dispatch(generation, &text),
                        Some(Err(e)) => {
                            log::warn!("Live stream error: {}", e);
                            break;
                        }
                        None => {
                            log::warn!("Live stream closed by remote host.");
                            break;
                        }
                    }
                }
            }
            Err(e) => log::error!("Failed to connect to live stream {}: {}", endpoint, e),
        }

        if !shared.arm_reconnect(generation) {
            return;
        }
        let delay = policy.delay(failures);
        failures = failures.saturating_add(1);
        log::info!("Reconnecting to live stream in {}ms", delay.as_millis());

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
