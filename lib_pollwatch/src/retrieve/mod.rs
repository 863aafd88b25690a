//! # Data Retrieval Module
//!
//! HTTP plumbing shared by the remote snapshot poller and the enrichment
//! client. Request building, bearer auth, JSON bodies and transient retries
//! live here so the feeds only deal with payloads.
//!
//! ## Contained Modules:
//!
//! - **`http_client`**: `ApiClient`, a `reqwest` client behind
//!   `reqwest-middleware` with a configurable exponential-backoff retry budget.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Generic HTTP API client with retry middleware.
pub mod http_client;

#[cfg(test)]
pub(crate) mod mock_http;

pub use http_client::{ApiClient, FetchError, DEFAULT_MAX_RETRIES};
