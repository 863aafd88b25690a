//! # Core Engine Module
//!
//! The two stateful components of the dashboard engine and the pure logic
//! they lean on.
//!
//! ## Core Components:
//!
//! - **`stream_manager`**: multiplexes one live incident connection to any
//!   number of listeners. The connection exists exactly while somebody is
//!   listening; drops are retried on a fixed (or opt-in exponential) delay.
//!
//! - **`reconciler`**: owns the canonical incident and candidate collections
//!   and folds seed data, remote snapshots, push events and enrichment into
//!   them.
//!
//! - **`registry`**, **`transport`**, **`frames`**: the listener set, the
//!   connector seam and inbound frame decoding used by the stream manager.
//!
//! - **`temporal`**, **`aggregates`**: the reporting window and the dashboard
//!   statistics, both pure functions.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Listener set with identity-based de-duplication.
pub mod registry;
/// Connector and connection traits implemented by transports.
pub mod transport;
/// Live frame decoding.
pub mod frames;
/// The reference-counted live-stream multiplexer.
pub mod stream_manager;
/// Acceptance-year and recency gates.
pub mod temporal;
/// Violence index, sentiment, countdown and constituency projections.
pub mod aggregates;
/// Canonical collections and merge policies.
pub mod reconciler;

// --- Public API Re-exports ---
pub use aggregates::{compute_aggregates, constituency_projections};
pub use frames::{decode_frame, FrameError};
pub use reconciler::{
    match_update, parse_kind, DataReconciler, EnrichmentOutcome, MergeOutcome, ReconcileError,
    SnapshotEvent, SnapshotOutcome, SourceState,
};
pub use registry::{listener, Listener, Registry};
pub use stream_manager::{ConnectionState, StreamStats, StreamSubscriptionManager};
pub use temporal::{apply_temporal_filter, TemporalWindow};
pub use transport::{Connection, Connector, TransportError};
