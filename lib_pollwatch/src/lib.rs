//! # lib_pollwatch
//!
//! The engine behind the PollWatch election-monitoring dashboard. Every top-level
//! folder is a feature-gated module so binaries only pull in what they use.
//!
//! - **`configs`**: serializable settings for the stream, reconciler and feeds.
//! - **`models`**: incidents, candidates, wire records and boundary validation.
//! - **`core`**: the live-stream subscription manager, the data reconciler and
//!   the dashboard aggregates.
//! - **`ingestors`**: the WebSocket transport behind the live incident feed.
//! - **`retrieve`**: a retrying HTTP client.
//! - **`feeds`**: the remote snapshot source, the enrichment client and the
//!   bundled seed set.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

#[cfg(feature = "configs")]
pub mod configs;
#[cfg(feature = "core")]
pub mod core;
#[cfg(feature = "feeds")]
pub mod feeds;
#[cfg(feature = "ingestors")]
pub mod ingestors;
#[cfg(feature = "models")]
pub mod models;
#[cfg(feature = "retrieve")]
pub mod retrieve;
