//! # Enrichment Client
//!
//! One request/response call to an external service that returns newly found
//! incidents and sentiment updates for the presidential field. The answer is
//! free-form JSON, so it is validated item by item into an
//! [`EnrichmentBatch`] before anything touches the reconciler.
//!
//! The client never retries. A failed call is reported to the caller, who
//! decides whether to try again.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::configs::FeedConfig;
use crate::core::reconciler::DataReconciler;
use crate::models::{EnrichmentBatch, InvalidRecord};
use crate::retrieve::{ApiClient, FetchError};

/// Enrichment failures surfaced to the caller.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    /// The endpoint URL is unusable.
    #[error("invalid enrichment endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    /// Transport or HTTP status failure.
    #[error("enrichment request failed: {0}")]
    Fetch(#[from] FetchError),

    /// The payload was not an object with the expected lists.
    #[error("enrichment payload rejected: {0}")]
    Payload(#[from] InvalidRecord),
}

/// Context sent with each enrichment call so the service can skip what the
/// dashboard already has.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentRequest {
    /// `YYYY-MM-DD` of the reporting day.
    pub reference_date: String,
    /// Ids of incidents already shown.
    pub known_incident_ids: Vec<String>,
    /// Names of the tracked presidential candidates.
    pub candidates: Vec<String>,
}

impl EnrichmentRequest {
    /// Builds the request from the reconciler's current view.
    pub fn from_reconciler(reconciler: &DataReconciler) -> Self {
        Self {
            reference_date: reconciler.reference_date().format("%Y-%m-%d").to_string(),
            known_incident_ids: reconciler.incidents().into_iter().map(|i| i.id).collect(),
            candidates: reconciler
                .presidential()
                .iter()
                .map(|c| c.name.clone())
                .collect(),
        }
    }
}

/// Anything that can produce an enrichment batch.
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Performs one enrichment round.
    async fn fetch(&self, request: &EnrichmentRequest) -> Result<EnrichmentBatch, EnrichmentError>;
}

/// Validates a raw payload, logging and dropping non-conforming items.
pub fn parse_batch(payload: Value) -> Result<EnrichmentBatch, EnrichmentError> {
    let decoded = EnrichmentBatch::decode(payload)?;
    for (index, reason) in &decoded.rejected {
        log::warn!("Enrichment item #{} dropped: {}", index, reason);
    }
    Ok(decoded.items)
}

/// HTTP enricher: `POST`s an [`EnrichmentRequest`] to a fixed endpoint.
#[derive(Debug, Clone)]
pub struct EnrichmentClient {
    client: ApiClient,
    path: String,
}

impl EnrichmentClient {
    /// Client for the absolute endpoint `url`.
    ///
    /// # Errors
    /// `url` is not absolute.
    pub fn new(url: &str, auth_token: Option<String>) -> Result<Self, EnrichmentError> {
        let endpoint = Url::parse(url)?;
        let root = endpoint.join("/")?;
        let mut path = endpoint.path().trim_start_matches('/').to_string();
        if let Some(query) = endpoint.query() {
            path.push('?');
            path.push_str(query);
        }
        let client = ApiClient::with_max_retries(root.as_str(), auth_token, 0)?;
        Ok(Self { client, path })
    }

    /// Client for `config.enrichment_url`, or `None` when enrichment is off.
    ///
    /// # Errors
    /// The configured URL is invalid.
    pub fn from_config(config: &FeedConfig) -> Result<Option<Self>, EnrichmentError> {
        config
            .enrichment_url
            .as_deref()
            .map(|url| Self::new(url, config.api_token.clone()))
            .transpose()
    }
}

#[async_trait]
impl Enricher for EnrichmentClient {
    async fn fetch(&self, request: &EnrichmentRequest) -> Result<EnrichmentBatch, EnrichmentError> {
        let payload: Value = self.client.post_json(&self.path, request).await?;
        let batch = parse_batch(payload)?;
        log::info!(
            "Enrichment returned {} incident(s) and {} candidate update(s)",
            batch.new_incidents.len(),
            batch.candidate_updates.len()
        );
        Ok(batch)
    }
}
