//! # Domain Models
//!
//! Entities shared by every part of the engine. Wire payloads are decoded
//! straight into these types with `serde`; whatever survives decoding still has
//! to pass `validate()` before it may enter a canonical collection.

/// Incidents, categories and forensic annotations.
pub mod incident;
/// Presidential and parliamentary candidates and partial updates.
pub mod candidate;
/// Collection kinds and typed collections.
pub mod collection;
/// Aggregates and projections derived from the collections.
pub mod stats;
/// Validated enrichment payloads.
pub mod enrichment;

pub use candidate::{Candidate, CandidateUpdate, MpCategory, ParliamentaryCandidate};
pub use collection::{decode_items, Collection, CollectionKind, Decoded};
pub use enrichment::EnrichmentBatch;
pub use incident::{parse_incident_date, ForensicAnalysis, Incident, IncidentType, TimelineEvent};
pub use stats::{ConstituencyProjection, DashboardStats, SentimentLabel};

use thiserror::Error;

/// Why a record was refused at the boundary.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvalidRecord {
    /// A required field was absent or blank.
    #[error("missing or empty field: {0}")]
    MissingField(&'static str),

    /// The date is not a strict `YYYY-MM-DD` calendar date.
    #[error("invalid date: {0:?}")]
    InvalidDate(String),

    /// A bounded score fell outside 0..=100.
    #[error("{field} out of range: {value}")]
    OutOfRange {
        /// Field name on the wire.
        field: &'static str,
        /// The offending value.
        value: f64,
    },

    /// The payload did not decode into the expected shape.
    #[error("malformed record: {0}")]
    Malformed(String),
}

pub(crate) fn check_score(field: &'static str, value: f64) -> Result<(), InvalidRecord> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(InvalidRecord::OutOfRange { field, value })
    }
}
