//! # Data Ingestors Module
//!
//! Transports that feed the live incident stream. Each submodule implements
//! the `core::transport` seam for one protocol, so the stream manager stays
//! protocol-agnostic.
//!
//! ## Contained Modules:
//! - **`live_wss`**: a receive-only WebSocket client with an optional
//!   inactivity watchdog.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// The WebSocket transport for the live incident feed.
pub mod live_wss;

// --- Public API Re-exports ---
pub use live_wss::{WsConnection, WsConnector};
