//! # Feeds Module
//!
//! Everything that brings collection data in from outside, apart from the
//! live stream:
//!
//! - **`remote`**: the snapshot-source seam and its subscription handle.
//! - **`rest_snapshots`**: an HTTP poller implementing that seam with
//!   change detection.
//! - **`enrichment`**: the one-shot enrichment call and payload validation.
//! - **`seed`**: the bundled startup data.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Remote snapshot seam.
pub mod remote;
/// Polling REST implementation of the snapshot seam.
pub mod rest_snapshots;
/// Enrichment client.
pub mod enrichment;
/// Bundled seed data.
pub mod seed;

pub use enrichment::{parse_batch, Enricher, EnrichmentClient, EnrichmentError, EnrichmentRequest};
pub use remote::{SnapshotEvent, SnapshotSource, SubscriptionHandle};
pub use rest_snapshots::RestSnapshotSource;
pub use seed::{load_seed, SeedError, SeedSet};
